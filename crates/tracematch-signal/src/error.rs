//! Error types for signal construction and segment processing.

/// Errors from building [`SignalData`](crate::SignalData) and applying segment operations.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Returned when the timestamp and value arrays differ in length.
    #[error("timestamps ({timestamps}) and values ({values}) must have the same length")]
    LengthMismatch {
        /// Number of timestamps provided.
        timestamps: usize,
        /// Number of values provided.
        values: usize,
    },

    /// Returned when a timestamp or value is NaN or infinite.
    #[error("signal contains non-finite sample at index {index}")]
    NonFiniteSample {
        /// Position of the first non-finite sample.
        index: usize,
    },

    /// Returned when timestamps are not strictly increasing.
    #[error("timestamps must be strictly increasing, violated at index {index}")]
    NonIncreasingTimestamp {
        /// Position of the first timestamp that does not exceed its predecessor.
        index: usize,
    },

    /// Returned when a signal has too few samples to derive a sample interval.
    #[error("signal needs at least 2 samples to derive a sample interval, got {len}")]
    TooShort {
        /// Number of samples in the signal.
        len: usize,
    },

    /// Returned when a sync block's reference and evaluation windows discretize
    /// to different sample counts.
    #[error("sync block lengths do not match: reference spans {reference} samples, evaluation spans {evaluation}")]
    SyncBlockLengthMismatch {
        /// Sample count of the reference window.
        reference: usize,
        /// Sample count of the evaluation window.
        evaluation: usize,
    },

    /// Returned when two metric results being concatenated carry different metadata keys.
    #[error("metadata key \"{key}\" is not present in both metric results")]
    MetadataKeyMismatch {
        /// The key missing from one of the operands.
        key: String,
    },
}
