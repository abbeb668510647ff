//! Shift search maximizing cross-correlation, shared by the phase-aligned metrics.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tracematch_signal::{MetricResult, SignalData};

use crate::error::{MetricError, non_negative};
use crate::stats::{decay_score, scaled_correlation};

/// Configuration for the phase metrics (`IsoPhase`, `CrossCorrelation`) and
/// for the alignment step of the magnitude and slope metrics.
///
/// # Defaults
///
/// | Parameter            | Default |
/// |----------------------|---------|
/// | `allowed_time_shift` | 0.2     |
/// | `regression`         | 1.0     |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub(crate) allowed_time_shift: f64,
    pub(crate) regression: f64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            allowed_time_shift: 0.2,
            regression: 1.0,
        }
    }
}

impl PhaseConfig {
    /// Create a configuration allowing shifts up to `allowed_time_shift`
    /// times the segment length.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::InvalidParameter`] | `allowed_time_shift` is negative, greater than 1, or not finite |
    pub fn new(allowed_time_shift: f64) -> Result<Self, MetricError> {
        let allowed_time_shift = non_negative("allowed_time_shift", allowed_time_shift)?;
        if allowed_time_shift > 1.0 {
            return Err(MetricError::InvalidParameter {
                name: "allowed_time_shift",
                value: allowed_time_shift,
                reason: "must not exceed 1",
            });
        }
        Ok(Self {
            allowed_time_shift,
            ..Self::default()
        })
    }

    /// Set the exponent applied to the shift decay.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] for a negative or non-finite exponent.
    pub fn with_regression(mut self, regression: f64) -> Result<Self, MetricError> {
        self.regression = non_negative("regression", regression)?;
        Ok(self)
    }

    /// Return the maximum shift as a fraction of the segment length.
    #[must_use]
    pub fn allowed_time_shift(&self) -> f64 {
        self.allowed_time_shift
    }

    /// Return the decay exponent.
    #[must_use]
    pub fn regression(&self) -> f64 {
        self.regression
    }

    /// Largest shift searched for a segment of `len` samples.
    ///
    /// Capped so that every searched overlap keeps at least two samples.
    #[must_use]
    pub fn max_shift(&self, len: usize) -> usize {
        ((self.allowed_time_shift * len as f64).floor() as usize).min(len.saturating_sub(2))
    }
}

/// Which input the best shift advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftDirection {
    /// Reference is advanced: `reference[k..]` against `evaluated[..n - k]`.
    Left,
    /// Evaluated is advanced: `reference[..n - k]` against `evaluated[k..]`.
    Right,
}

/// Outcome of the shift search.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseAlignment {
    /// Best shift in samples.
    pub shift: usize,
    /// Direction of the best shift.
    pub direction: ShiftDirection,
    /// Largest shift that was searched.
    pub max_shift: usize,
    /// Rescaled correlation at the best shift.
    pub correlation: f64,
    /// Shift score: 1 at zero shift, decaying to 0 at `max_shift`.
    pub score: f64,
    /// Reference overlap at the best shift.
    pub shifted_reference: SignalData,
    /// Evaluated overlap at the best shift.
    pub shifted_evaluated: SignalData,
}

/// Index of the first maximum.
fn first_argmax(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| {
            if v > best.1 { (i, v) } else { best }
        })
}

/// Search shifts `0..=max_shift` in both directions for the highest correlation.
///
/// Ties go to the left search and, within a direction, to the smaller shift.
/// Both returned overlaps are placed on `reference.timestamps()[..n - shift]`.
#[must_use]
pub fn align(config: &PhaseConfig, reference: &SignalData, evaluated: &SignalData) -> PhaseAlignment {
    let r = reference.values();
    let e = evaluated.values();
    let n = r.len().min(e.len());
    let max_shift = config.max_shift(n);

    let left: Vec<f64> = (0..=max_shift)
        .map(|k| scaled_correlation(&r[k..n], &e[..n - k]))
        .collect();
    let right: Vec<f64> = (0..=max_shift)
        .map(|k| scaled_correlation(&r[..n - k], &e[k..n]))
        .collect();

    let (best_left, left_corr) = first_argmax(&left);
    let (best_right, right_corr) = first_argmax(&right);
    let (shift, direction, correlation) = if right_corr > left_corr {
        (best_right, ShiftDirection::Right, right_corr)
    } else {
        (best_left, ShiftDirection::Left, left_corr)
    };

    let score = if shift == 0 || max_shift == 0 {
        1.0
    } else {
        decay_score(shift as f64, max_shift as f64, config.regression)
    };

    let (shifted_reference, shifted_evaluated) = if shift == 0 {
        (reference.slice(0..n), evaluated.slice(0..n))
    } else {
        let timestamps = reference.timestamps()[..n - shift].to_vec();
        let (rv, ev) = match direction {
            ShiftDirection::Left => (&r[shift..n], &e[..n - shift]),
            ShiftDirection::Right => (&r[..n - shift], &e[shift..n]),
        };
        (
            SignalData::from_parts(timestamps.clone(), rv.to_vec()),
            SignalData::from_parts(timestamps, ev.to_vec()),
        )
    };

    debug!(shift, ?direction, max_shift, correlation, score, "phase alignment");

    PhaseAlignment {
        shift,
        direction,
        max_shift,
        correlation,
        score,
        shifted_reference,
        shifted_evaluated,
    }
}

impl PhaseAlignment {
    /// Attach the shifted overlaps to `result` as input metadata.
    pub(crate) fn annotate(&self, result: MetricResult) -> MetricResult {
        result
            .with_input_metadata("shifted_reference", self.shifted_reference.clone())
            .with_input_metadata("shifted_evaluated", self.shifted_evaluated.clone())
    }
}

pub(crate) fn iso_phase(config: &PhaseConfig, reference: &SignalData, evaluated: &SignalData) -> MetricResult {
    let alignment = align(config, reference, evaluated);
    let result = reference.filled(alignment.score);
    alignment.annotate(MetricResult::new(reference.clone(), evaluated.clone(), result))
}

/// Score is the peak correlation; the shift score is kept as `phase` metadata.
pub(crate) fn cross_correlation(
    config: &PhaseConfig,
    reference: &SignalData,
    evaluated: &SignalData,
) -> MetricResult {
    let alignment = align(config, reference, evaluated);
    let result = reference.filled(alignment.correlation);
    alignment.annotate(
        MetricResult::new(reference.clone(), evaluated.clone(), result)
            .with_result_metadata("phase", reference.filled(alignment.score)),
    )
}
