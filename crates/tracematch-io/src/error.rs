//! I/O error types for tracematch-io.

use std::path::PathBuf;

/// Errors from measurement loading and result persistence.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the header has no channel column after `time`.
    #[error("no channel columns in {path}")]
    NoChannels {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when fewer than two data rows are present, so no sample rate can be derived.
    #[error("{path} has {rows} data rows, at least 2 are required")]
    TooFewRows {
        /// Path to the CSV file.
        path: PathBuf,
        /// Number of data rows found.
        rows: usize,
    },

    /// Returned when two columns carry the same channel name.
    #[error("duplicate channel \"{name}\" in {path}")]
    DuplicateChannel {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated channel name.
        name: String,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Header of the offending column.
        column: String,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when the time column is not uniformly increasing.
    #[error("non-uniform sampling in {path}: row {row_index} steps {got} s, expected {expected} s")]
    NonUniformSampling {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Interval between the first two rows.
        expected: f64,
        /// Interval ending at this row.
        got: f64,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result cannot be encoded or decoded as JSON.
    #[error("invalid JSON in {path}")]
    Json {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}
