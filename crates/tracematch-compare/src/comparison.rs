//! Comparison configuration: measurements, channel assignments, metric, and sync blocks.

use tracing::{debug, error, instrument};

use tracematch_metric::Metric;
use tracematch_signal::SyncBlock;

use crate::error::ConfigurationError;
use crate::measurement::{Channel, Measurement};

/// Relative tolerance when comparing the two measurement sample rates.
const SAMPLE_RATE_RTOL: f64 = 1e-9;

/// One reference measurement compared against one evaluation measurement.
///
/// Every reference channel starts assigned to the evaluation channel of the
/// same name, or left unassigned when there is none. Sync blocks are kept in
/// insertion order and must not overlap on the reference axis.
#[derive(Debug, Clone)]
pub struct Comparison {
    reference: Measurement,
    evaluation: Measurement,
    assignments: Vec<(String, Option<String>)>,
    metric: Option<Metric>,
    sync_blocks: Vec<SyncBlock>,
}

/// A validated comparison, ready to execute.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Display name of the comparison.
    pub name: String,
    /// Metric applied to every pair.
    pub metric: Metric,
    /// Assigned (reference, evaluation) channel pairs.
    pub pairs: Vec<(Channel, Channel)>,
    /// Sync blocks in order.
    pub sync_blocks: Vec<SyncBlock>,
}

impl Comparison {
    /// Create a comparison with name-based channel assignment, no metric, and no blocks.
    #[must_use]
    pub fn new(reference: Measurement, evaluation: Measurement) -> Self {
        let assignments = reference
            .channels()
            .iter()
            .map(|c| {
                let matched = evaluation
                    .channel_by_name(&c.name)
                    .map(|e| e.name.clone());
                (c.name.clone(), matched)
            })
            .collect();
        Self {
            reference,
            evaluation,
            assignments,
            metric: None,
            sync_blocks: Vec::new(),
        }
    }

    /// Return the reference measurement.
    #[must_use]
    pub fn reference(&self) -> &Measurement {
        &self.reference
    }

    /// Return the evaluation measurement.
    #[must_use]
    pub fn evaluation(&self) -> &Measurement {
        &self.evaluation
    }

    /// Return the selected metric, if any.
    #[must_use]
    pub fn metric(&self) -> Option<&Metric> {
        self.metric.as_ref()
    }

    /// Select the metric used for every channel pair.
    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = Some(metric);
    }

    /// Return the sync blocks in order.
    #[must_use]
    pub fn sync_blocks(&self) -> &[SyncBlock] {
        &self.sync_blocks
    }

    /// Remove every sync block.
    pub fn clear_sync_blocks(&mut self) {
        self.sync_blocks.clear();
    }

    /// `"{reference} - {evaluation} ({metric})"`, or `"None"` for an unset metric.
    #[must_use]
    pub fn name(&self) -> String {
        let metric = self
            .metric
            .as_ref()
            .map_or_else(|| "None".to_owned(), ToString::to_string);
        format!(
            "{} - {} ({metric})",
            self.reference.name(),
            self.evaluation.name()
        )
    }

    /// Assign evaluation channel `evaluation` to reference channel `reference`.
    ///
    /// Passing `None` clears the assignment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownChannel`] if either name is not part
    /// of its measurement.
    pub fn assign_channel(
        &mut self,
        reference: &str,
        evaluation: Option<&str>,
    ) -> Result<(), ConfigurationError> {
        if let Some(name) = evaluation
            && self.evaluation.channel_by_name(name).is_none()
        {
            return Err(ConfigurationError::UnknownChannel {
                measurement: self.evaluation.name().to_owned(),
                name: name.to_owned(),
            });
        }
        let slot = self
            .assignments
            .iter_mut()
            .find(|(r, _)| r == reference)
            .ok_or_else(|| ConfigurationError::UnknownChannel {
                measurement: self.reference.name().to_owned(),
                name: reference.to_owned(),
            })?;
        slot.1 = evaluation.map(str::to_owned);
        Ok(())
    }

    /// Return the evaluation channel name assigned to `reference`, if any.
    #[must_use]
    pub fn assignment(&self, reference: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(r, _)| r == reference)
            .and_then(|(_, e)| e.as_deref())
    }

    /// Assigned (reference, evaluation) channel pairs in reference channel order.
    #[must_use]
    pub fn channel_pairs(&self) -> Vec<(Channel, Channel)> {
        self.assignments
            .iter()
            .filter_map(|(r, e)| {
                let reference = self.reference.channel_by_name(r)?;
                let evaluation = self.evaluation.channel_by_name(e.as_deref()?)?;
                Some((reference.clone(), evaluation.clone()))
            })
            .collect()
    }

    /// Append a sync block.
    ///
    /// A block that starts before the previous block ends on the reference
    /// axis is rejected: an error is logged, the block list is left unchanged,
    /// and `false` is returned.
    pub fn add_sync_block(&mut self, block: SyncBlock) -> bool {
        if let Some(previous) = self.sync_blocks.last()
            && block.overlaps(previous)
        {
            error!(
                ref_start = block.ref_start,
                previous_end = previous.ref_end,
                "sync block overlaps the previous block, rejected"
            );
            return false;
        }
        debug!(?block, "sync block added");
        self.sync_blocks.push(block);
        true
    }

    pub(crate) fn last_sync_block_mut(&mut self) -> Option<&mut SyncBlock> {
        self.sync_blocks.last_mut()
    }

    /// Check every precondition and freeze the comparison into a plan.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ConfigurationError::MetricNotSet`] | No metric selected |
    /// | [`ConfigurationError::NoChannelPairs`] | No reference channel is assigned |
    /// | [`ConfigurationError::SampleRateMismatch`] | The measurements differ in sample rate |
    /// | [`ConfigurationError::NoSyncBlocks`] | No sync block defined |
    /// | [`ConfigurationError::SyncBlockOverlap`] | A block starts before its predecessor ends |
    /// | [`ConfigurationError::SyncBlockLengthMismatch`] | A block's windows differ in sample count |
    #[instrument(level = "debug", skip(self), fields(comparison = %self.name()))]
    pub fn validate(&self) -> Result<ExecutionPlan, ConfigurationError> {
        let metric = self.metric.ok_or(ConfigurationError::MetricNotSet)?;

        let pairs = self.channel_pairs();
        if pairs.is_empty() {
            return Err(ConfigurationError::NoChannelPairs);
        }

        let reference_rate = self.reference.sample_rate();
        let evaluation_rate = self.evaluation.sample_rate();
        if !rates_match(reference_rate, evaluation_rate) {
            return Err(ConfigurationError::SampleRateMismatch {
                reference: reference_rate,
                evaluation: evaluation_rate,
            });
        }

        if self.sync_blocks.is_empty() {
            return Err(ConfigurationError::NoSyncBlocks);
        }

        let step = 1.0 / reference_rate;
        for (index, block) in self.sync_blocks.iter().enumerate() {
            if index > 0 {
                let previous = &self.sync_blocks[index - 1];
                if block.overlaps(previous) {
                    return Err(ConfigurationError::SyncBlockOverlap {
                        index,
                        ref_start: block.ref_start,
                        previous_end: previous.ref_end,
                    });
                }
            }
            let (reference, evaluation) = block.sample_counts(step);
            if reference != evaluation {
                return Err(ConfigurationError::SyncBlockLengthMismatch {
                    index,
                    reference,
                    evaluation,
                });
            }
        }

        Ok(ExecutionPlan {
            name: self.name(),
            metric,
            pairs,
            sync_blocks: self.sync_blocks.clone(),
        })
    }
}

fn rates_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= SAMPLE_RATE_RTOL * a.abs().max(b.abs())
}
