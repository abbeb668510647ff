//! Slope score on phase-aligned segments.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tracematch_signal::{MetricResult, SignalData};

use crate::error::{MetricError, non_negative, positive};
use crate::phase::{PhaseAlignment, PhaseConfig, align};
use crate::stats::{decay_score, l2_distance, l2_norm};

/// Half-width of the slope smoothing window, in samples.
const SMOOTHING_HALF_WIDTH: usize = 4;

/// Configuration for the ISO 18571 slope score.
///
/// # Defaults
///
/// | Parameter    | Default |
/// |--------------|---------|
/// | `alignment`  | [`PhaseConfig::default`] |
/// | `max_error`  | 2.0     |
/// | `regression` | 1.0     |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeConfig {
    pub(crate) alignment: PhaseConfig,
    pub(crate) max_error: f64,
    pub(crate) regression: f64,
}

impl Default for SlopeConfig {
    fn default() -> Self {
        Self {
            alignment: PhaseConfig::default(),
            max_error: 2.0,
            regression: 1.0,
        }
    }
}

impl SlopeConfig {
    /// Set the phase search used before differentiating.
    #[must_use]
    pub fn with_alignment(mut self, alignment: PhaseConfig) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the relative error at which the score reaches 0.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] unless `max_error` is finite and positive.
    pub fn with_max_error(mut self, max_error: f64) -> Result<Self, MetricError> {
        self.max_error = positive("max_error", max_error)?;
        Ok(self)
    }

    /// Set the decay exponent.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] for a negative or non-finite exponent.
    pub fn with_regression(mut self, regression: f64) -> Result<Self, MetricError> {
        self.regression = non_negative("regression", regression)?;
        Ok(self)
    }

    /// Return the phase search configuration.
    #[must_use]
    pub fn alignment(&self) -> PhaseConfig {
        self.alignment
    }

    /// Return the maximum relative error.
    #[must_use]
    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    /// Return the decay exponent.
    #[must_use]
    pub fn regression(&self) -> f64 {
        self.regression
    }
}

/// Per-sample slope by central differences, one-sided at the edges,
/// smoothed with a symmetric moving average that shrinks near the edges.
pub(crate) fn smoothed_slope(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let slope: Vec<f64> = (0..n)
        .map(|i| match i {
            0 => values[1] - values[0],
            i if i == n - 1 => values[i] - values[i - 1],
            i => (values[i + 1] - values[i - 1]) / 2.0,
        })
        .collect();

    (0..n)
        .map(|i| {
            let h = SMOOTHING_HALF_WIDTH.min(i).min(n - 1 - i);
            let window = &slope[i - h..=i + h];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

pub(crate) struct SlopeScore {
    pub(crate) score: f64,
    pub(crate) reference_slope: SignalData,
    pub(crate) evaluated_slope: SignalData,
}

pub(crate) fn score_aligned(config: &SlopeConfig, aligned: &PhaseAlignment) -> SlopeScore {
    let ref_slope = smoothed_slope(aligned.shifted_reference.values());
    let eval_slope = smoothed_slope(aligned.shifted_evaluated.values());

    let eval_norm = l2_norm(&eval_slope);
    let score = if eval_norm == 0.0 {
        debug!("evaluated slope has zero norm, slope score set to 1");
        1.0
    } else {
        decay_score(
            l2_distance(&ref_slope, &eval_slope) / eval_norm,
            config.max_error,
            config.regression,
        )
    };

    SlopeScore {
        score,
        reference_slope: aligned.shifted_reference.with_values(ref_slope),
        evaluated_slope: aligned.shifted_evaluated.with_values(eval_slope),
    }
}

pub(crate) fn iso_slope(config: &SlopeConfig, reference: &SignalData, evaluated: &SignalData) -> MetricResult {
    let aligned = align(&config.alignment, reference, evaluated);
    let slope = score_aligned(config, &aligned);
    MetricResult::new(reference.clone(), evaluated.clone(), reference.filled(slope.score))
        .with_input_metadata("reference_slope", slope.reference_slope)
        .with_input_metadata("evaluated_slope", slope.evaluated_slope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_of_line_is_constant() {
        let values: Vec<f64> = (0..12).map(|i| 2.0 * i as f64).collect();
        let slope = smoothed_slope(&values);
        assert!(slope.iter().all(|s| (s - 2.0).abs() < 1e-12));
    }

    #[test]
    fn smoothing_window_shrinks_at_edges() {
        let values = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let slope = smoothed_slope(&values);
        // First sample uses only its own forward difference.
        assert!((slope[0] - 1.0).abs() < 1e-12);
        // Last sample uses only its own backward difference.
        assert!((slope[10] + 1.0).abs() < 1e-12);
        assert_eq!(slope.len(), values.len());
    }

    #[test]
    fn short_inputs() {
        assert_eq!(smoothed_slope(&[]), Vec::<f64>::new());
        assert_eq!(smoothed_slope(&[3.0]), vec![0.0]);
    }

    #[test]
    fn flat_evaluated_scores_one() {
        let r = SignalData::uniform(1.0, (0..10).map(f64::from).collect()).unwrap();
        let e = r.filled(1.0);
        let result = iso_slope(&SlopeConfig::default(), &r, &e);
        assert_eq!(result.result.values()[0], 1.0);
    }

    #[test]
    fn identical_signals_score_one() {
        let r = SignalData::uniform(1.0, (0..20).map(|i| (i as f64 * 0.4).sin()).collect()).unwrap();
        let result = iso_slope(&SlopeConfig::default(), &r, &r);
        assert!((result.result.values()[0] - 1.0).abs() < 1e-12);
        assert!(result.input_metadata.contains_key("reference_slope"));
    }
}
