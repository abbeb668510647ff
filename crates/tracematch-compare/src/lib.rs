//! Synchronization, execution, and aggregation of channel comparisons.
//!
//! A [`Comparison`] pairs a reference and an evaluation [`Measurement`],
//! assigns channels between them, selects a metric, and holds the
//! [`SyncBlock`](tracematch_signal::SyncBlock)s that align the two time axes.
//! [`SyncProcessor`] derives those blocks from alignment markers, and
//! [`ComparisonExecutor`] scores every assigned pair, sequentially or on a
//! private worker pool, into a [`ComparisonResult`].

pub mod comparison;
pub mod error;
pub mod executor;
pub mod measurement;
pub mod result;
pub mod sync;

pub use comparison::{Comparison, ExecutionPlan};
pub use error::{CompareError, ConfigurationError, ResultError, SourceError};
pub use executor::{
    ComparisonExecutor, ExecutionMode, MIN_RELIABLE_SAMPLES, chunk_size, compare_individual,
    compare_pair, default_threads,
};
pub use measurement::{Channel, ChannelId, ChannelSource, InMemorySource, Measurement};
pub use result::{ChannelResult, ComparisonResult, ScoreSummary};
pub use sync::{Marker, SyncProcessor};
