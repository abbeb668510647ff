//! Normalized Euclidean distance with per-sample redistribution.

use tracing::debug;

use tracematch_signal::{MetricResult, SignalData};

use crate::stats::redistribute;

/// Lower bound on the normalizing amplitude.
const MIN_AMPLITUDE: f64 = 1e-5;

/// `1 - distance / (amplitude * sqrt(n))`, spread over samples by each
/// sample's closeness `1 - d_i^2 / amplitude^2`.
///
/// The amplitude is the larger of both inputs' amplitudes.
pub(crate) fn euclidean(reference: &SignalData, evaluated: &SignalData) -> MetricResult {
    let amplitude = reference
        .amplitude()
        .max(evaluated.amplitude())
        .max(MIN_AMPLITUDE);
    let n = reference.len();

    let squared: Vec<f64> = reference
        .values()
        .iter()
        .zip(evaluated.values())
        .map(|(r, e)| (r - e).powi(2))
        .collect();
    let distance = squared.iter().sum::<f64>().sqrt();
    let max_distance = amplitude * (n as f64).sqrt();
    let score = (1.0 - distance / max_distance).max(0.0);

    let weights: Vec<f64> = squared
        .iter()
        .map(|d| (1.0 - d / (amplitude * amplitude)).clamp(0.0, 1.0))
        .collect();

    debug!(distance, max_distance, score, "euclidean distance");
    MetricResult::new(
        reference.clone(),
        evaluated.clone(),
        reference.with_values(redistribute(&weights, score)),
    )
}
