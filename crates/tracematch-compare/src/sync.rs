//! Sync block construction from alignment markers.
//!
//! Markers are either threshold crossings of a chosen value ([`SyncProcessor::sync`])
//! or step changes of a piecewise-constant channel ([`SyncProcessor::sync_multi`]).

use tracing::{error, info, instrument, warn};

use tracematch_signal::{SignalData, SyncBlock};

use crate::comparison::Comparison;
use crate::error::ConfigurationError;

/// Relative tolerance for treating two marker values as equal.
const MARKER_RTOL: f64 = 1e-9;

/// Lower bound of the crossing tolerance in [`SyncProcessor::find_sync_time`].
const MIN_CROSSING_TOLERANCE: f64 = 0.1;

/// A step-change marker: `(timestamp, value)`.
pub type Marker = (f64, f64);

/// Builds [`SyncBlock`]s for a [`Comparison`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProcessor;

impl SyncProcessor {
    /// Timestamp of the first sample after `after` where `channel` reaches `value`.
    ///
    /// A sample qualifies if the signal crosses `value` between it and its
    /// predecessor while landing within `max(0.1 * |value|, 0.1)` of it, or
    /// equals `value` exactly. The first qualifying sample wins. When none
    /// does, the channel's last timestamp is returned (0 for an empty channel).
    #[must_use]
    pub fn find_sync_time(channel: &SignalData, value: f64, after: f64) -> f64 {
        let timestamps = channel.timestamps();
        let values = channel.values();
        let Some(&first) = values.first() else {
            return 0.0;
        };

        let tolerance = (0.1 * value.abs()).max(MIN_CROSSING_TOLERANCE);
        let mut last = first;
        for (&t, &v) in timestamps.iter().zip(values).skip(1) {
            if t <= after {
                last = v;
                continue;
            }
            let near = (v - value).abs() < tolerance;
            let rising = v >= value && last <= value;
            let falling = v <= value && last >= value;
            if ((rising || falling) && near) || v == value {
                return t;
            }
            last = v;
        }
        channel.last_timestamp().unwrap_or(0.0)
    }

    /// End times giving the longest equal-length window from both start points.
    ///
    /// Returns `(ref_end, eval_end)`, each the start plus the shorter of the
    /// two remaining measurement durations.
    #[must_use]
    pub fn find_longest_end_sync_time(
        ref_start: f64,
        eval_start: f64,
        comparison: &Comparison,
    ) -> (f64, f64) {
        let common = (comparison.reference().length() - ref_start)
            .min(comparison.evaluation().length() - eval_start);
        (ref_start + common, eval_start + common)
    }

    /// Add the single block covering the longest common span from `t = 0`.
    pub fn sync_full(comparison: &mut Comparison) -> bool {
        let (ref_end, eval_end) = Self::find_longest_end_sync_time(0.0, 0.0, comparison);
        comparison.add_sync_block(SyncBlock::new(0.0, ref_end, 0.0, eval_end))
    }

    /// Append one block aligned on a crossing of `ref_value` / `eval_value`.
    ///
    /// Crossings are searched after the previous block's start times. The
    /// previous block, if any, is shortened so that it ends where the new
    /// block begins on the side with the smaller gap. Returns whether the new
    /// block was appended.
    #[instrument(level = "debug", skip(comparison, reference, evaluation))]
    pub fn sync(
        comparison: &mut Comparison,
        reference: &SignalData,
        evaluation: &SignalData,
        ref_value: f64,
        eval_value: f64,
    ) -> bool {
        let (after_ref, after_eval) = comparison
            .sync_blocks()
            .last()
            .map_or((0.0, 0.0), |b| (b.ref_start, b.eval_start));

        let ref_start = Self::find_sync_time(reference, ref_value, after_ref);
        let eval_start = Self::find_sync_time(evaluation, eval_value, after_eval);

        if let Some(previous) = comparison.last_sync_block_mut() {
            let span = (ref_start - previous.ref_start).min(eval_start - previous.eval_start);
            previous.ref_end = previous.ref_start + span;
            previous.eval_end = previous.eval_start + span;
        }

        let (ref_end, eval_end) = Self::find_longest_end_sync_time(ref_start, eval_start, comparison);
        comparison.add_sync_block(SyncBlock::new(ref_start, ref_end, eval_start, eval_end))
    }

    /// Step-change markers of a piecewise-constant channel.
    ///
    /// With `use_initial_value` the first sample seeds the list. The last
    /// sample always closes it.
    #[must_use]
    pub fn find_all_sync_times(channel: &SignalData, use_initial_value: bool) -> Vec<Marker> {
        let timestamps = channel.timestamps();
        let values = channel.values();
        let (Some(&t_last), Some(&v_last)) = (timestamps.last(), values.last()) else {
            return Vec::new();
        };

        let mut markers = Vec::new();
        if use_initial_value {
            markers.push((timestamps[0], values[0]));
        }
        markers.extend(
            (1..values.len())
                .filter(|&i| !is_close(values[i], values[i - 1]))
                .map(|i| (timestamps[i], values[i])),
        );
        if markers.last() != Some(&(t_last, v_last)) {
            markers.push((t_last, v_last));
        }
        markers
    }

    /// Append one block per consecutive pair of step-change markers.
    ///
    /// The reference interval length drives the evaluation interval. Blocks
    /// running past the end of the evaluation measurement are pulled back on
    /// both sides by the overflow; a block inverted by that is skipped with a
    /// warning. Returns the number of blocks appended.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ConfigurationError::MarkerCountMismatch`] | The channels yield different marker counts |
    /// | [`ConfigurationError::MarkerValueMismatch`] | Corresponding markers carry different values |
    ///
    /// No block is appended when an error is returned.
    #[instrument(level = "debug", skip(comparison, reference, evaluation))]
    pub fn sync_multi(
        comparison: &mut Comparison,
        reference: &SignalData,
        evaluation: &SignalData,
        use_initial_value: bool,
    ) -> Result<usize, ConfigurationError> {
        let ref_markers = Self::find_all_sync_times(reference, use_initial_value);
        let eval_markers = Self::find_all_sync_times(evaluation, use_initial_value);

        if ref_markers.len() != eval_markers.len() {
            let err = ConfigurationError::MarkerCountMismatch {
                reference: ref_markers.len(),
                evaluation: eval_markers.len(),
            };
            error!(%err, "sync markers do not correspond");
            return Err(err);
        }
        if let Some(index) = ref_markers
            .iter()
            .zip(&eval_markers)
            .position(|(r, e)| !is_close(r.1, e.1))
        {
            let err = ConfigurationError::MarkerValueMismatch {
                index,
                reference: ref_markers[index].1,
                evaluation: eval_markers[index].1,
            };
            error!(%err, "sync markers do not correspond");
            return Err(err);
        }

        let eval_length = comparison.evaluation().length();
        let mut added = 0;
        for (refs, evals) in ref_markers.windows(2).zip(eval_markers.windows(2)) {
            let (ref_start, mut ref_end) = (refs[0].0, refs[1].0);
            let eval_start = evals[0].0;
            let mut eval_end = eval_start + (ref_end - ref_start);

            if eval_end > eval_length {
                let overflow = eval_end - eval_length;
                eval_end -= overflow;
                ref_end -= overflow;
                if ref_end < ref_start {
                    warn!(ref_start, ref_end, "sync block inverted after clipping, skipped");
                    continue;
                }
            }
            if comparison.add_sync_block(SyncBlock::new(ref_start, ref_end, eval_start, eval_end)) {
                added += 1;
            }
        }
        info!(markers = ref_markers.len(), blocks = added, "marker sync complete");
        Ok(added)
    }
}

fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= MARKER_RTOL * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{Channel, ChannelId, Measurement};

    fn signal(values: &[f64]) -> SignalData {
        SignalData::uniform(1.0, values.to_vec()).unwrap()
    }

    fn comparison(ref_len: f64, eval_len: f64) -> Comparison {
        let channel = |m: &str| vec![Channel::new(ChannelId::new(format!("{m}::x")), "x")];
        Comparison::new(
            Measurement::new("ref", ref_len, 1.0, channel("ref")),
            Measurement::new("eval", eval_len, 1.0, channel("eval")),
        )
    }

    #[test]
    fn crossing_found_within_tolerance() {
        let s = signal(&[0.0, 0.5, 0.95, 2.0, 3.0]);
        // 0.95 is within 0.1 of 1.0 but does not cross it; 2.0 crosses but is too far
        assert_eq!(SyncProcessor::find_sync_time(&s, 1.0, 0.0), 4.0);
        let s = signal(&[0.0, 0.5, 1.05, 2.0]);
        assert_eq!(SyncProcessor::find_sync_time(&s, 1.0, 0.0), 2.0);
    }

    #[test]
    fn crossing_respects_after_time() {
        let s = signal(&[0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(SyncProcessor::find_sync_time(&s, 1.0, 0.0), 1.0);
        assert_eq!(SyncProcessor::find_sync_time(&s, 1.0, 1.0), 3.0);
    }

    #[test]
    fn missing_crossing_returns_last_timestamp() {
        let s = signal(&[0.0, 0.0, 0.0]);
        assert_eq!(SyncProcessor::find_sync_time(&s, 5.0, 0.0), 2.0);
    }

    #[test]
    fn longest_end_uses_shorter_remainder() {
        let c = comparison(10.0, 8.0);
        assert_eq!(SyncProcessor::find_longest_end_sync_time(2.0, 1.0, &c), (9.0, 8.0));
    }

    #[test]
    fn sync_full_covers_common_span() {
        let mut c = comparison(10.0, 8.0);
        assert!(SyncProcessor::sync_full(&mut c));
        assert_eq!(c.sync_blocks(), &[SyncBlock::new(0.0, 8.0, 0.0, 8.0)]);
    }

    #[test]
    fn second_sync_shrinks_previous_block() {
        let mut c = comparison(10.0, 10.0);
        let reference = signal(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let evaluation = signal(&[0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

        assert!(SyncProcessor::sync(&mut c, &reference, &evaluation, 1.0, 1.0));
        assert_eq!(c.sync_blocks()[0], SyncBlock::new(1.0, 9.0, 2.0, 10.0));

        assert!(SyncProcessor::sync(&mut c, &reference, &evaluation, 1.0, 1.0));
        let blocks = c.sync_blocks();
        assert_eq!(blocks[0], SyncBlock::new(1.0, 5.0, 2.0, 6.0));
        assert_eq!(blocks[1], SyncBlock::new(5.0, 9.0, 6.0, 10.0));
    }

    #[test]
    fn markers_on_step_changes() {
        let s = signal(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        assert_eq!(
            SyncProcessor::find_all_sync_times(&s, false),
            vec![(2.0, 1.0), (4.0, 2.0), (5.0, 2.0)]
        );
        assert_eq!(
            SyncProcessor::find_all_sync_times(&s, true),
            vec![(0.0, 0.0), (2.0, 1.0), (4.0, 2.0), (5.0, 2.0)]
        );
    }

    #[test]
    fn final_step_is_not_duplicated() {
        let s = signal(&[0.0, 0.0, 3.0]);
        assert_eq!(SyncProcessor::find_all_sync_times(&s, false), vec![(2.0, 3.0)]);
        assert!(SyncProcessor::find_all_sync_times(&SignalData::empty(), true).is_empty());
    }

    #[test]
    fn sync_multi_builds_equal_blocks() {
        let mut c = comparison(10.0, 10.0);
        let steps = [0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 0.0];
        let reference = signal(&steps);
        let evaluation = signal(&steps);

        let added = SyncProcessor::sync_multi(&mut c, &reference, &evaluation, false).unwrap();
        let markers = SyncProcessor::find_all_sync_times(&reference, false).len();
        assert_eq!(added, markers - 1);
        for block in c.sync_blocks() {
            assert!((block.ref_duration() - block.eval_duration()).abs() < 1e-12);
        }
    }

    #[test]
    fn sync_multi_rejects_marker_mismatch() {
        let mut c = comparison(10.0, 10.0);
        let reference = signal(&[0.0, 1.0, 1.0, 2.0]);
        let evaluation = signal(&[0.0, 0.0, 0.0, 0.0]);
        let err = SyncProcessor::sync_multi(&mut c, &reference, &evaluation, false).unwrap_err();
        assert!(matches!(err, ConfigurationError::MarkerCountMismatch { .. }));

        let evaluation = signal(&[0.0, 1.0, 1.0, 3.0]);
        let err = SyncProcessor::sync_multi(&mut c, &reference, &evaluation, false).unwrap_err();
        assert!(matches!(err, ConfigurationError::MarkerValueMismatch { index: 1, .. }));
        assert!(c.sync_blocks().is_empty());
    }

    #[test]
    fn sync_multi_clips_at_evaluation_end() {
        let mut c = comparison(10.0, 6.0);
        let reference = signal(&[0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0]);
        let evaluation = signal(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0]);
        let added = SyncProcessor::sync_multi(&mut c, &reference, &evaluation, false).unwrap();
        assert_eq!(added, 1);
        let block = c.sync_blocks()[0];
        assert_eq!(block, SyncBlock::new(1.0, 4.0, 3.0, 6.0));
    }
}
