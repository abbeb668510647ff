//! Error types for comparison configuration, data loading, and execution.

use tracematch_metric::MetricError;
use tracematch_signal::SignalError;

/// A comparison is not runnable as configured.
///
/// Raised by the precondition phase, [`Comparison::validate`](crate::Comparison::validate),
/// and by marker-based synchronization. Any of these aborts the comparison
/// before channel data is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// Returned when no metric has been selected.
    #[error("no metric selected")]
    MetricNotSet,

    /// Returned when no reference channel is assigned to an evaluation channel.
    #[error("no assigned channel pairs to compare")]
    NoChannelPairs,

    /// Returned when the two measurements are sampled at different rates.
    #[error("sample rates differ: reference {reference} Hz, evaluation {evaluation} Hz")]
    SampleRateMismatch {
        /// Reference sample rate in Hz.
        reference: f64,
        /// Evaluation sample rate in Hz.
        evaluation: f64,
    },

    /// Returned when the comparison has no sync blocks.
    #[error("no sync blocks defined")]
    NoSyncBlocks,

    /// Returned when a sync block starts before its predecessor ends.
    #[error("sync block {index} starts at {ref_start} before the previous block ends at {previous_end}")]
    SyncBlockOverlap {
        /// Position of the offending block.
        index: usize,
        /// Reference start of the offending block.
        ref_start: f64,
        /// Reference end of the previous block.
        previous_end: f64,
    },

    /// Returned when a sync block's two windows discretize to different lengths.
    #[error("sync block {index} spans {reference} reference samples but {evaluation} evaluation samples")]
    SyncBlockLengthMismatch {
        /// Position of the offending block.
        index: usize,
        /// Reference sample count.
        reference: usize,
        /// Evaluation sample count.
        evaluation: usize,
    },

    /// Returned when reference and evaluation marker channels have different marker counts.
    #[error("sync marker counts differ: reference {reference}, evaluation {evaluation}")]
    MarkerCountMismatch {
        /// Number of reference markers.
        reference: usize,
        /// Number of evaluation markers.
        evaluation: usize,
    },

    /// Returned when corresponding sync markers carry different values.
    #[error("sync marker {index} differs: reference {reference}, evaluation {evaluation}")]
    MarkerValueMismatch {
        /// Marker position.
        index: usize,
        /// Reference marker value.
        reference: f64,
        /// Evaluation marker value.
        evaluation: f64,
    },

    /// Returned when a channel name is not part of the measurement.
    #[error("measurement \"{measurement}\" has no channel named \"{name}\"")]
    UnknownChannel {
        /// Measurement searched.
        measurement: String,
        /// Channel name requested.
        name: String,
    },
}

/// Errors from a [`ChannelSource`](crate::ChannelSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Returned when the source has no data for a channel.
    #[error("no data for channel {id}")]
    Missing {
        /// Requested channel identifier.
        id: String,
    },
}

/// Errors from finalizing a [`ComparisonResult`](crate::ComparisonResult).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResultError {
    /// Returned when channel results do not share one sample grid.
    #[error("channel \"{channel}\" has {found} result samples, expected {expected}")]
    GridMismatch {
        /// Reference channel name of the offending result.
        channel: String,
        /// Length of the first channel's result.
        expected: usize,
        /// Length of the offending result.
        found: usize,
    },
}

/// Errors from executing a comparison.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// Wraps a failed precondition.
    #[error("invalid comparison: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Wraps a channel loading failure.
    #[error("channel data error: {0}")]
    Source(#[from] SourceError),

    /// Wraps a segment processing failure.
    #[error("segment error: {0}")]
    Signal(#[from] SignalError),

    /// Wraps a metric failure.
    #[error("metric error: {0}")]
    Metric(#[from] MetricError),

    /// Wraps an aggregation failure.
    #[error("aggregation error: {0}")]
    Aggregation(#[from] ResultError),

    /// Wraps a worker pool construction failure.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
