//! Domain types for tracematch-io.

use std::fmt;

use tracematch_compare::{InMemorySource, Measurement};

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A measurement read from disk together with the samples of its channels.
///
/// Produced by [`MeasurementReader`](crate::MeasurementReader). Channel
/// identifiers in `source` are `"{measurement}::{channel}"`, so sources of
/// several measurements can be merged without collisions.
#[derive(Debug, Clone)]
pub struct LoadedMeasurement {
    /// Channel layout and sampling.
    pub measurement: Measurement,
    /// Samples of every channel, keyed by channel identifier.
    pub source: InMemorySource,
}
