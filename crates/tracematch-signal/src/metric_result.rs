//! Structured output of a metric computation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::signal::SignalData;

/// Inputs, per-sample score, and diagnostic side-channels of one metric run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Reference segment the metric was applied to.
    pub reference_input: SignalData,
    /// Evaluated segment the metric was applied to.
    pub evaluated_input: SignalData,
    /// Per-sample score, 1 = perfect match.
    pub result: SignalData,
    /// Curves derived from the score, such as weighted sub-scores.
    pub result_metadata: BTreeMap<String, SignalData>,
    /// Transformed inputs, such as shifted or warped copies.
    pub input_metadata: BTreeMap<String, SignalData>,
}

impl MetricResult {
    /// Create a result with empty metadata maps.
    #[must_use]
    pub fn new(reference_input: SignalData, evaluated_input: SignalData, result: SignalData) -> Self {
        Self {
            reference_input,
            evaluated_input,
            result,
            result_metadata: BTreeMap::new(),
            input_metadata: BTreeMap::new(),
        }
    }

    /// Attach a curve derived from the score.
    #[must_use]
    pub fn with_result_metadata(mut self, key: impl Into<String>, signal: SignalData) -> Self {
        self.result_metadata.insert(key.into(), signal);
        self
    }

    /// Attach a transformed copy of an input.
    #[must_use]
    pub fn with_input_metadata(mut self, key: impl Into<String>, signal: SignalData) -> Self {
        self.input_metadata.insert(key.into(), signal);
        self
    }

    /// Mean of the per-sample score. Zero for an empty result.
    #[must_use]
    pub fn score_mean(&self) -> f64 {
        self.result.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_maps() {
        let s = SignalData::uniform(1.0, vec![1.0, 1.0]).unwrap();
        let r = MetricResult::new(s.clone(), s.clone(), s.clone())
            .with_result_metadata("phase", s.clone())
            .with_input_metadata("shifted_reference", s.clone());
        assert_eq!(r.result_metadata.len(), 1);
        assert!(r.input_metadata.contains_key("shifted_reference"));
        assert!((r.score_mean() - 1.0).abs() < 1e-12);
    }
}
