//! Comparison execution: chunked fan-out over channel pairs and ordered aggregation.

use std::num::NonZeroUsize;
use std::thread;

use rayon::prelude::*;
use tracing::{debug, error, info, instrument, warn};

use tracematch_metric::Metric;
use tracematch_signal::{
    MetricResult, SignalData, SyncBlock, apply_sync_block, concat_signal_data, shift_metric_result,
};

use crate::comparison::{Comparison, ExecutionPlan};
use crate::error::CompareError;
use crate::measurement::{Channel, ChannelSource};
use crate::result::{ChannelResult, ComparisonResult};

/// Synchronized segments shorter than this are logged as a data quality warning.
pub const MIN_RELIABLE_SAMPLES: usize = 10;

/// Pair count above which chunks have a fixed size.
const LARGE_BATCH_PAIRS: usize = 500;

/// Chunk size used for large batches.
const LARGE_BATCH_CHUNK: usize = 250;

/// How chunks of channel pairs are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Chunks run one after another on the calling thread.
    #[default]
    Sequential,
    /// Chunks run on a private worker pool built for each comparison.
    Parallel {
        /// Worker count. `None` uses half the logical cores, at least one.
        threads: Option<usize>,
    },
}

impl ExecutionMode {
    /// Resolved worker count: 1 for sequential execution.
    #[must_use]
    pub fn threads(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel { threads } => threads.unwrap_or_else(default_threads).max(1),
        }
    }
}

/// Half the logical core count, at least one.
#[must_use]
pub fn default_threads() -> usize {
    let cores = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    (cores / 2).max(1)
}

/// Number of channel pairs per unit of work.
///
/// `250` for more than `500` pairs, otherwise a quarter of the pairs, at least one.
#[must_use]
pub fn chunk_size(pairs: usize) -> usize {
    if pairs > LARGE_BATCH_PAIRS {
        LARGE_BATCH_CHUNK
    } else {
        (pairs / 4).max(1)
    }
}

/// Runs comparisons against a [`ChannelSource`].
///
/// Results are reassembled in chunk submission order, so output is identical
/// for both execution modes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonExecutor {
    mode: ExecutionMode,
}

impl ComparisonExecutor {
    /// Create an executor.
    #[must_use]
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    /// Return the execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Validate and execute one comparison.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CompareError::Configuration`] | A precondition failed; no pair was processed |
    /// | [`CompareError::Source`] | A channel could not be loaded |
    /// | [`CompareError::Signal`] | A sync block could not be applied |
    /// | [`CompareError::Metric`] | The metric rejected a synchronized pair |
    /// | [`CompareError::Aggregation`] | Channel results could not be averaged |
    /// | [`CompareError::ThreadPool`] | The worker pool could not be built |
    #[instrument(skip_all, fields(comparison = %comparison.name()))]
    pub fn execute<S>(
        &self,
        comparison: &Comparison,
        source: &S,
    ) -> Result<ComparisonResult, CompareError>
    where
        S: ChannelSource + ?Sized,
    {
        let plan = comparison.validate().inspect_err(|err| {
            error!(%err, "comparison is not runnable");
        })?;

        let size = chunk_size(plan.pairs.len());
        info!(
            pairs = plan.pairs.len(),
            blocks = plan.sync_blocks.len(),
            chunk_size = size,
            mode = ?self.mode,
            "executing comparison"
        );

        let chunks = match self.mode {
            ExecutionMode::Sequential => plan
                .pairs
                .chunks(size)
                .map(|chunk| compare_chunk(chunk, &plan, source))
                .collect::<Result<Vec<_>, _>>()?,
            ExecutionMode::Parallel { .. } => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.mode.threads())
                    .build()?;
                pool.install(|| {
                    plan.pairs
                        .par_chunks(size)
                        .map(|chunk| compare_chunk(chunk, &plan, source))
                        .collect::<Result<Vec<_>, _>>()
                })?
            }
        };

        let mut result = ComparisonResult::new(plan.name);
        for channel in chunks.into_iter().flatten() {
            result.add_result(channel.reference, channel.evaluation, channel.result);
        }
        result.calculate_total()?;

        info!(
            channels = result.channel_results().len(),
            average = result.result_average(),
            "comparison complete"
        );
        Ok(result)
    }

    /// Execute comparisons strictly one at a time.
    ///
    /// `on_done` is called once per successful comparison as it finishes.
    /// Failing comparisons are logged and skipped. Returns the successful
    /// results in input order.
    pub fn execute_all<S, F>(
        &self,
        comparisons: &[Comparison],
        source: &S,
        mut on_done: F,
    ) -> Vec<ComparisonResult>
    where
        S: ChannelSource + ?Sized,
        F: FnMut(&ComparisonResult),
    {
        let mut results = Vec::with_capacity(comparisons.len());
        for (index, comparison) in comparisons.iter().enumerate() {
            match self.execute(comparison, source) {
                Ok(result) => {
                    on_done(&result);
                    results.push(result);
                }
                Err(err) => {
                    warn!(index, comparison = %comparison.name(), %err, "comparison skipped");
                }
            }
        }
        info!(
            total = comparisons.len(),
            completed = results.len(),
            "batch complete"
        );
        results
    }
}

/// Synchronize and score every pair of one chunk, in order.
fn compare_chunk<S>(
    chunk: &[(Channel, Channel)],
    plan: &ExecutionPlan,
    source: &S,
) -> Result<Vec<ChannelResult>, CompareError>
where
    S: ChannelSource + ?Sized,
{
    chunk
        .iter()
        .map(|(reference, evaluation)| {
            let ref_data = source.load(&reference.id)?;
            let eval_data = source.load(&evaluation.id)?;
            let result = compare_pair(&ref_data, &eval_data, &plan.metric, &plan.sync_blocks)
                .inspect_err(|err| {
                    error!(reference = %reference.name, evaluation = %evaluation.name, %err, "channel pair failed");
                })?;
            Ok(ChannelResult {
                reference: reference.clone(),
                evaluation: evaluation.clone(),
                result,
            })
        })
        .collect()
}

/// Apply every block in order, stitch the segments, and score the stitched pair once.
///
/// # Errors
///
/// Returns [`CompareError::Signal`] if a block cannot be applied, or
/// [`CompareError::Metric`] if the metric rejects the pair.
pub fn compare_pair(
    reference: &SignalData,
    evaluated: &SignalData,
    metric: &Metric,
    blocks: &[SyncBlock],
) -> Result<MetricResult, CompareError> {
    let mut ref_joined = SignalData::empty();
    let mut eval_joined = SignalData::empty();
    for block in blocks {
        let (r, e) = apply_sync_block(reference, evaluated, block)?;
        ref_joined = concat_signal_data(&ref_joined, &r);
        eval_joined = concat_signal_data(&eval_joined, &e);
    }
    warn_if_short(&ref_joined);
    debug!(samples = ref_joined.len(), metric = %metric, "scoring pair");
    Ok(metric.compute(&ref_joined, &eval_joined)?)
}

/// Score the segments selected by a single block.
///
/// Every curve of the returned result is shifted back to the reference
/// measurement's time axis, starting at `block.ref_start`.
///
/// # Errors
///
/// Returns [`CompareError::Signal`] if the block cannot be applied, or
/// [`CompareError::Metric`] if the metric rejects the pair.
pub fn compare_individual(
    reference: &SignalData,
    evaluated: &SignalData,
    metric: &Metric,
    block: &SyncBlock,
) -> Result<MetricResult, CompareError> {
    let (r, e) = apply_sync_block(reference, evaluated, block)?;
    warn_if_short(&r);
    let result = metric.compute(&r, &e)?;
    Ok(shift_metric_result(&result, block.ref_start))
}

fn warn_if_short(segment: &SignalData) {
    if segment.len() < MIN_RELIABLE_SAMPLES {
        warn!(
            samples = segment.len(),
            minimum = MIN_RELIABLE_SAMPLES,
            "synchronized segment is short, score may be unreliable"
        );
    }
}
