//! Signal samples, sync blocks, and segment processing.
//!
//! Pure data crate with zero I/O. Provides the immutable [`SignalData`]
//! sample container, the [`SyncBlock`] window descriptor, the
//! [`MetricResult`] output record, and the segment operations used to cut,
//! stitch, and shift aligned channel data.

mod error;
mod metric_result;
mod processor;
mod signal;
mod sync_block;

pub use error::SignalError;
pub use metric_result::MetricResult;
pub use processor::{
    apply_sync_block, concat_metric_result, concat_signal_data, shift_metric_result, shift_signal,
};
pub use signal::SignalData;
pub use sync_block::{samples_in, SyncBlock};
