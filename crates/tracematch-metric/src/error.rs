//! Error types for metric configuration and computation.

/// Errors from building metric configurations and scoring signal pairs.
///
/// Degenerate denominators (zero amplitude, zero norm, zero variance) are
/// never reported here; every metric resolves them with a defined fallback.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    /// Returned when either input segment has no samples.
    #[error("metric inputs must be non-empty")]
    EmptyInput,

    /// Returned when the two input segments differ in length.
    #[error("reference ({reference}) and evaluated ({evaluated}) segments must have the same length")]
    LengthMismatch {
        /// Number of reference samples.
        reference: usize,
        /// Number of evaluated samples.
        evaluated: usize,
    },

    /// Returned when a configuration parameter is outside its valid domain.
    #[error("invalid metric parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Constraint that was violated.
        reason: &'static str,
    },
}

/// Reject non-finite or negative values for a named parameter.
pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64, MetricError> {
    if !value.is_finite() || value < 0.0 {
        return Err(MetricError::InvalidParameter {
            name,
            value,
            reason: "must be finite and non-negative",
        });
    }
    Ok(value)
}

/// Reject non-finite, zero, or negative values for a named parameter.
pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, MetricError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MetricError::InvalidParameter {
            name,
            value,
            reason: "must be finite and positive",
        });
    }
    Ok(value)
}
