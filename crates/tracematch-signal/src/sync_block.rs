//! Matched time window between a reference and an evaluation channel.

use serde::{Deserialize, Serialize};

/// Tolerance applied before flooring `duration / step`, so that durations
/// which are whole multiples of the step up to float error are not rounded down.
const DISCRETIZE_EPS: f64 = 1e-9;

/// Number of whole samples spanned by `duration` at the given sample interval.
///
/// Negative durations and non-positive steps yield 0.
#[must_use]
pub fn samples_in(duration: f64, step: f64) -> usize {
    if step <= 0.0 || duration <= 0.0 {
        return 0;
    }
    (duration / step + DISCRETIZE_EPS).floor() as usize
}

/// A pair of equally long windows, one per measurement, considered aligned.
///
/// All times are in seconds relative to each measurement's own start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncBlock {
    /// Window start in the reference measurement.
    pub ref_start: f64,
    /// Window end in the reference measurement.
    pub ref_end: f64,
    /// Window start in the evaluation measurement.
    pub eval_start: f64,
    /// Window end in the evaluation measurement.
    pub eval_end: f64,
}

impl SyncBlock {
    /// Create a new sync block.
    #[must_use]
    pub fn new(ref_start: f64, ref_end: f64, eval_start: f64, eval_end: f64) -> Self {
        Self {
            ref_start,
            ref_end,
            eval_start,
            eval_end,
        }
    }

    /// Duration of the reference window.
    #[must_use]
    pub fn ref_duration(&self) -> f64 {
        self.ref_end - self.ref_start
    }

    /// Duration of the evaluation window.
    #[must_use]
    pub fn eval_duration(&self) -> f64 {
        self.eval_end - self.eval_start
    }

    /// Sample counts of the reference and evaluation windows at interval `step`.
    #[must_use]
    pub fn sample_counts(&self, step: f64) -> (usize, usize) {
        (
            samples_in(self.ref_duration(), step),
            samples_in(self.eval_duration(), step),
        )
    }

    /// True if this block starts before `previous` ends on the reference axis.
    #[must_use]
    pub fn overlaps(&self, previous: &SyncBlock) -> bool {
        self.ref_start < previous.ref_end
    }
}
