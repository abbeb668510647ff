//! Numeric helpers shared by the metric implementations.

/// Sums at or below this are treated as zero when redistributing a score.
pub(crate) const EPS: f64 = 1e-12;

/// Pearson correlation rescaled from `[-1, 1]` to `[0, 1]`.
///
/// Returns 0 when either input has zero variance or the slices are empty.
pub(crate) fn scaled_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut upper = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        upper += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let lower = (var_a * var_b).sqrt();
    if lower == 0.0 || !lower.is_finite() {
        return 0.0;
    }
    (upper / lower + 1.0) / 2.0
}

/// Euclidean norm.
pub(crate) fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Euclidean norm of `a - b` over the common prefix.
pub(crate) fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// `max(0, (max_error - error) / max_error) ^ regression`.
pub(crate) fn decay_score(error: f64, max_error: f64, regression: f64) -> f64 {
    if max_error <= 0.0 {
        return if error <= 0.0 { 1.0 } else { 0.0 };
    }
    ((max_error - error) / max_error).max(0.0).powf(regression)
}

/// Spread a scalar `score` over samples in proportion to `weights`.
///
/// The returned curve sums to `score * weights.len()`. When the weights sum to
/// (nearly) zero or are not finite, every sample receives `score`.
pub(crate) fn redistribute(weights: &[f64], score: f64) -> Vec<f64> {
    let n = weights.len() as f64;
    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() || sum <= EPS {
        return vec![score; weights.len()];
    }
    weights.iter().map(|w| w * n / sum * score).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_of_identical_is_one() {
        let a = [1.0, 3.0, 2.0, 5.0];
        assert!((scaled_correlation(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_of_negation_is_zero() {
        let a = [1.0, -3.0, 2.0, 0.0];
        let b: Vec<f64> = a.iter().map(|v| -v).collect();
        assert!(scaled_correlation(&a, &b).abs() < 1e-12);
    }

    #[test]
    fn correlation_of_flat_is_zero() {
        assert_eq!(scaled_correlation(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn decay_is_clamped() {
        assert_eq!(decay_score(0.0, 0.5, 1.0), 1.0);
        assert_eq!(decay_score(1.0, 0.5, 1.0), 0.0);
        assert!((decay_score(0.25, 0.5, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn redistribute_preserves_total() {
        let curve = redistribute(&[1.0, 3.0], 0.5);
        assert!((curve.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((curve[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn redistribute_zero_sum_is_uniform() {
        assert_eq!(redistribute(&[0.0, 0.0, 0.0], 0.4), vec![0.4; 3]);
    }
}
