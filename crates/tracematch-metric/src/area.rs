//! Area validation metric: box-averaged relative difference.

use serde::{Deserialize, Serialize};

use tracematch_signal::{MetricResult, SignalData};

use crate::error::{MetricError, positive};

const MIN_AMPLITUDE: f64 = 1e-5;

/// Configuration for the area validation metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaValidationConfig {
    pub(crate) averaging_time: f64,
}

impl Default for AreaValidationConfig {
    fn default() -> Self {
        Self { averaging_time: 1.0 }
    }
}

impl AreaValidationConfig {
    /// Create a configuration averaging over `averaging_time` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] unless `averaging_time` is finite and positive.
    pub fn new(averaging_time: f64) -> Result<Self, MetricError> {
        Ok(Self {
            averaging_time: positive("averaging_time", averaging_time)?,
        })
    }

    /// Return the averaging window length in seconds.
    #[must_use]
    pub fn averaging_time(&self) -> f64 {
        self.averaging_time
    }
}

/// Centered box average of length `window`, zero-padded at both ends.
///
/// Sample `i` averages `values[i - before..=i + after]` with
/// `after = (window - 1) / 2`, so even windows reach one sample further back.
/// Every output is divided by `window`, so edge values are damped.
fn box_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let after = (window - 1) / 2;
    let before = window - 1 - after;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(before);
            let end = (i + after + 1).min(n);
            values[start..end].iter().sum::<f64>() / window as f64
        })
        .collect()
}

pub(crate) fn area_validation(
    config: &AreaValidationConfig,
    reference: &SignalData,
    evaluated: &SignalData,
) -> MetricResult {
    let amplitude = reference.amplitude().max(MIN_AMPLITUDE);
    let step = reference.sample_time_step();
    let window = if step > 0.0 {
        ((config.averaging_time / step).floor() as usize).max(1)
    } else {
        1
    };

    let differences: Vec<f64> = reference
        .values()
        .iter()
        .zip(evaluated.values())
        .map(|(r, e)| (r - e).abs() / amplitude)
        .collect();
    let scores = box_average(&differences, window)
        .into_iter()
        .map(|d| (1.0 - d).clamp(0.0, 1.0))
        .collect();

    MetricResult::new(reference.clone(), evaluated.clone(), reference.with_values(scores))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_average_is_centered() {
        let avg = box_average(&[0.0, 0.0, 3.0, 0.0, 0.0], 3);
        assert_eq!(avg, vec![0.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn even_window_reaches_back() {
        let avg = box_average(&[4.0, 0.0, 0.0, 0.0], 2);
        assert_eq!(avg, vec![2.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn identical_scores_one() {
        let r = SignalData::uniform(0.1, vec![1.0, 2.0, 3.0, 2.0, 1.0]).unwrap();
        let result = area_validation(&AreaValidationConfig::default(), &r, &r);
        assert!(result.result.values().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn large_deviation_clips_to_zero() {
        let r = SignalData::uniform(1.0, vec![1.0, 1.0, 1.0]).unwrap();
        let e = r.filled(5.0);
        let result = area_validation(&AreaValidationConfig::default(), &r, &e);
        assert_eq!(result.result.values(), &[0.0, 0.0, 0.0]);
    }
}
