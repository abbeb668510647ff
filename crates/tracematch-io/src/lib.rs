//! Measurement loading and result persistence for the tracematch pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, LoadedMeasurement};
pub use error::IoError;
pub use reader::MeasurementReader;
pub use writer::{
    ChannelSummary, ComparisonSummary, ResultWriter, read_batch, read_comparison,
};
