//! The closed set of metrics and their uniform scoring entry point.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use tracematch_signal::{MetricResult, SignalData};

use crate::area::{AreaValidationConfig, area_validation};
use crate::correlation::pearson;
use crate::corridor::{CorridorConfig, IsoCorridorConfig, corridor, iso_corridor};
use crate::error::MetricError;
use crate::euclidean::euclidean;
use crate::iso::{IsoConfig, IsoSmallConfig, iso, iso_small};
use crate::magnitude::{MagnitudeConfig, iso_magnitude};
use crate::ospa::{OspaConfig, ospa};
use crate::phase::{PhaseConfig, cross_correlation, iso_phase};
use crate::slope::{SlopeConfig, iso_slope};

/// A similarity metric together with its configuration.
///
/// Metrics are pure: scoring the same pair twice yields identical results,
/// and a `Metric` is `Copy` so it can be handed to every worker by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config")]
pub enum Metric {
    /// Time-tolerant corridor around the reference.
    Corridor(CorridorConfig),
    /// Sample-wise ISO 18571 corridor.
    IsoCorridor(IsoCorridorConfig),
    /// ISO 18571 phase score.
    IsoPhase(PhaseConfig),
    /// Peak shifted cross-correlation.
    CrossCorrelation(PhaseConfig),
    /// ISO 18571 magnitude score after phase alignment and warping.
    IsoMagnitude(MagnitudeConfig),
    /// ISO 18571 slope score after phase alignment.
    IsoSlope(SlopeConfig),
    /// Weighted ISO 18571 composite.
    Iso(IsoConfig),
    /// Corridor and phase only.
    IsoSmall(IsoSmallConfig),
    /// Global Pearson correlation.
    PearsonCorrelation,
    /// Normalized Euclidean distance.
    EuclideanDistance,
    /// Optimal sub-pattern assignment distance.
    Ospa(OspaConfig),
    /// Box-averaged relative difference.
    AreaValidation(AreaValidationConfig),
}

impl Metric {
    /// Score `evaluated` against `reference`.
    ///
    /// The result curve lies on the reference time grid.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::EmptyInput`] | Either segment has no samples |
    /// | [`MetricError::LengthMismatch`] | The segments differ in length |
    #[instrument(level = "debug", skip(reference, evaluated), fields(metric = %self, len = reference.len()))]
    pub fn compute(&self, reference: &SignalData, evaluated: &SignalData) -> Result<MetricResult, MetricError> {
        if reference.is_empty() || evaluated.is_empty() {
            return Err(MetricError::EmptyInput);
        }
        if reference.len() != evaluated.len() {
            return Err(MetricError::LengthMismatch {
                reference: reference.len(),
                evaluated: evaluated.len(),
            });
        }

        let result = match self {
            Self::Corridor(c) => corridor(c, reference, evaluated),
            Self::IsoCorridor(c) => iso_corridor(c, reference, evaluated),
            Self::IsoPhase(c) => iso_phase(c, reference, evaluated),
            Self::CrossCorrelation(c) => cross_correlation(c, reference, evaluated),
            Self::IsoMagnitude(c) => iso_magnitude(c, reference, evaluated),
            Self::IsoSlope(c) => iso_slope(c, reference, evaluated),
            Self::Iso(c) => iso(c, reference, evaluated),
            Self::IsoSmall(c) => iso_small(c, reference, evaluated),
            Self::PearsonCorrelation => pearson(reference, evaluated),
            Self::EuclideanDistance => euclidean(reference, evaluated),
            Self::Ospa(c) => ospa(c, reference, evaluated),
            Self::AreaValidation(c) => area_validation(c, reference, evaluated),
        };
        Ok(result)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corridor(c) => write!(
                f,
                "Corridor ({}, {}, {}, {})",
                c.inner, c.outer, c.delay_inner, c.delay_outer
            ),
            Self::IsoCorridor(c) => write!(f, "IsoCorridorMetric ({}, {}, {})", c.inner, c.outer, c.regression),
            Self::IsoPhase(c) => write!(f, "IsoPhaseMetric ({})", c.allowed_time_shift),
            Self::CrossCorrelation(c) => write!(f, "CrossCorrelationMetric ({})", c.allowed_time_shift),
            Self::IsoMagnitude(_) => f.write_str("IsoMagnitudeMetric"),
            Self::IsoSlope(_) => f.write_str("IsoSlopeMetric"),
            Self::Iso(_) => f.write_str("ISO Metric"),
            Self::IsoSmall(c) => write!(f, "IsoMetricSmall ({})", c.phase.allowed_time_shift),
            Self::PearsonCorrelation => f.write_str("Pearson Correlation"),
            Self::EuclideanDistance => f.write_str("Euclidean Distance"),
            Self::Ospa(c) => write!(
                f,
                "OSPA ({}, {}, {}, {}, {})",
                c.cutoff, c.size_y, c.interval_time, c.interval_extent, c.p
            ),
            Self::AreaValidation(c) => write!(f, "AVM ({})", c.averaging_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(values: Vec<f64>) -> SignalData {
        SignalData::uniform(1.0, values).unwrap()
    }

    #[test]
    fn rejects_empty_input() {
        let err = Metric::PearsonCorrelation
            .compute(&SignalData::empty(), &SignalData::empty())
            .unwrap_err();
        assert!(matches!(err, MetricError::EmptyInput));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Metric::EuclideanDistance
            .compute(&sig(vec![1.0, 2.0]), &sig(vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, MetricError::LengthMismatch { reference: 2, evaluated: 1 }));
    }

    #[test]
    fn display_names() {
        let corridor = Metric::Corridor(CorridorConfig::new(0.05, 0.5, 0.1, 2.0).unwrap());
        assert_eq!(corridor.to_string(), "Corridor (0.05, 0.5, 0.1, 2)");
        assert_eq!(Metric::IsoPhase(PhaseConfig::default()).to_string(), "IsoPhaseMetric (0.2)");
        assert_eq!(Metric::Ospa(OspaConfig::default()).to_string(), "OSPA (0.5, 1, 1, 0.2, 1)");
    }
}
