//! Per-channel metric results and their aggregate curve.

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use tracematch_signal::{MetricResult, SignalData};

use crate::error::ResultError;
use crate::measurement::Channel;

/// One metric result together with the channels it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelResult {
    /// Reference channel.
    pub reference: Channel,
    /// Evaluation channel.
    pub evaluation: Channel,
    /// Metric output for the synchronized pair.
    pub result: MetricResult,
}

/// Scalar statistics of a per-sample score curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Smallest score.
    pub min: f64,
    /// Largest score.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Upper median: the element at index `len / 2` of the sorted scores.
    pub median: f64,
}

impl ScoreSummary {
    /// Summarize a score curve, or `None` if it is empty.
    #[must_use]
    pub fn of(signal: &SignalData) -> Option<Self> {
        let mut sorted = signal.values().to_vec();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: signal.mean(),
            median: sorted[sorted.len() / 2],
        })
    }
}

impl ChannelResult {
    /// Summary statistics of the per-sample score.
    #[must_use]
    pub fn summary(&self) -> Option<ScoreSummary> {
        ScoreSummary::of(&self.result.result)
    }
}

/// Ordered channel results of one executed comparison plus their mean curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    name: String,
    channel_results: Vec<ChannelResult>,
    total: Option<SignalData>,
}

impl ComparisonResult {
    /// Create an empty result.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel_results: Vec::new(),
            total: None,
        }
    }

    /// Return the comparison name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append one channel result.
    pub fn add_result(&mut self, reference: Channel, evaluation: Channel, result: MetricResult) {
        self.channel_results.push(ChannelResult {
            reference,
            evaluation,
            result,
        });
    }

    /// Return the channel results in insertion order.
    #[must_use]
    pub fn channel_results(&self) -> &[ChannelResult] {
        &self.channel_results
    }

    /// First result whose reference channel is named `name`.
    #[must_use]
    pub fn channel_result_by_name(&self, name: &str) -> Option<&ChannelResult> {
        self.channel_results
            .iter()
            .find(|r| r.reference.name == name)
    }

    /// Return the aggregate curve once [`calculate_total`](Self::calculate_total) has run.
    #[must_use]
    pub fn total(&self) -> Option<&SignalData> {
        self.total.as_ref()
    }

    /// Compute the elementwise mean of all channel score curves.
    ///
    /// The total lives on the first channel's time grid. With no channel
    /// results a warning is logged and the total stays unset.
    ///
    /// # Errors
    ///
    /// Returns [`ResultError::GridMismatch`] if any score curve differs in
    /// length from the first.
    #[instrument(level = "debug", skip(self), fields(comparison = %self.name))]
    pub fn calculate_total(&mut self) -> Result<(), ResultError> {
        let Some(first) = self.channel_results.first() else {
            warn!("no channel results to aggregate");
            return Ok(());
        };

        let grid = &first.result.result;
        let expected = grid.len();
        let mut sums = vec![0.0; expected];
        for channel in &self.channel_results {
            let values = channel.result.result.values();
            if values.len() != expected {
                return Err(ResultError::GridMismatch {
                    channel: channel.reference.name.clone(),
                    expected,
                    found: values.len(),
                });
            }
            for (sum, v) in sums.iter_mut().zip(values) {
                *sum += v;
            }
        }

        let n = self.channel_results.len() as f64;
        self.total = Some(grid.with_values(sums.into_iter().map(|s| s / n).collect()));
        Ok(())
    }

    /// Mean of the aggregate curve, or `None` before it is computed.
    #[must_use]
    pub fn result_average(&self) -> Option<f64> {
        self.total.as_ref().map(SignalData::mean)
    }
}
