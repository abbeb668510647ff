//! Magnitude score on phase-aligned, time-warped segments.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use tracematch_signal::{MetricResult, SignalData};

use crate::error::{MetricError, non_negative, positive};
use crate::phase::{PhaseAlignment, PhaseConfig, align};
use crate::stats::{decay_score, l2_distance, l2_norm};
use crate::warp::Dtw;
use crate::window::WarpingWindow;

/// Configuration for the ISO 18571 magnitude score.
///
/// # Defaults
///
/// | Parameter             | Default |
/// |-----------------------|---------|
/// | `alignment`           | [`PhaseConfig::default`] |
/// | `time_warping_window` | 0.1     |
/// | `max_error`           | 0.5     |
/// | `regression`          | 1.0     |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeConfig {
    pub(crate) alignment: PhaseConfig,
    pub(crate) time_warping_window: f64,
    pub(crate) max_error: f64,
    pub(crate) regression: f64,
}

impl Default for MagnitudeConfig {
    fn default() -> Self {
        Self {
            alignment: PhaseConfig::default(),
            time_warping_window: 0.1,
            max_error: 0.5,
            regression: 1.0,
        }
    }
}

impl MagnitudeConfig {
    /// Set the phase search used before warping.
    #[must_use]
    pub fn with_alignment(mut self, alignment: PhaseConfig) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the warping band radius as a fraction of the aligned length.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] for a negative or non-finite fraction.
    pub fn with_time_warping_window(mut self, fraction: f64) -> Result<Self, MetricError> {
        self.time_warping_window = non_negative("time_warping_window", fraction)?;
        Ok(self)
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

    /// Return the warping band fraction.
    #[must_use]
    pub fn time_warping_window(&self) -> f64 {
        self.time_warping_window
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

/// Magnitude score of an already phase-aligned pair plus both warped series.
pub(crate) struct MagnitudeScore {
    pub(crate) score: f64,
    pub(crate) reference_warped: SignalData,
    pub(crate) evaluated_warped: SignalData,
}

#[instrument(level = "debug", skip_all, fields(len = aligned.shifted_reference.len()))]
pub(crate) fn score_aligned(config: &MagnitudeConfig, aligned: &PhaseAlignment) -> MagnitudeScore {
    let reference = &aligned.shifted_reference;
    let evaluated = &aligned.shifted_evaluated;
    let window = WarpingWindow::from_fraction(config.time_warping_window, reference.len());
    let path = Dtw::new(window).align(reference.values(), evaluated.values());
    let (reference_warped, evaluated_warped) = path.apply(reference, evaluated);

    let ref_norm = l2_norm(reference_warped.values());
    let score = if ref_norm == 0.0 {
        debug!("warped reference has zero norm, magnitude score set to 1");
        1.0
    } else {
        let error = l2_distance(evaluated_warped.values(), reference_warped.values()) / ref_norm;
        decay_score(error, config.max_error, config.regression)
    };

    MagnitudeScore {
        score,
        reference_warped,
        evaluated_warped,
    }
}

pub(crate) fn iso_magnitude(
    config: &MagnitudeConfig,
    reference: &SignalData,
    evaluated: &SignalData,
) -> MetricResult {
    let aligned = align(&config.alignment, reference, evaluated);
    let magnitude = score_aligned(config, &aligned);
    MetricResult::new(
        reference.clone(),
        evaluated.clone(),
        reference.filled(magnitude.score),
    )
    .with_input_metadata("ref_warped", magnitude.reference_warped)
    .with_input_metadata("eval_warped", magnitude.evaluated_warped)
}
