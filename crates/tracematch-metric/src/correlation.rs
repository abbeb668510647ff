//! Whole-segment Pearson correlation.

use tracematch_signal::{MetricResult, SignalData};

use crate::stats::scaled_correlation;

/// Global correlation rescaled to `[0, 1]`, broadcast over the reference grid.
pub(crate) fn pearson(reference: &SignalData, evaluated: &SignalData) -> MetricResult {
    let correlation = scaled_correlation(reference.values(), evaluated.values());
    MetricResult::new(reference.clone(), evaluated.clone(), reference.filled(correlation))
}
