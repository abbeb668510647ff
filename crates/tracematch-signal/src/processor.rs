//! Segment extraction, concatenation, and time shifting.

use tracing::{instrument, warn};

use crate::error::SignalError;
use crate::metric_result::MetricResult;
use crate::signal::SignalData;
use crate::sync_block::{samples_in, SyncBlock};

/// Cut the windows described by `block` out of both signals.
///
/// Start times are discretized to sample indices using the reference sample
/// interval. The window length is computed independently from the reference
/// and the evaluation durations and the two must agree. Each returned segment
/// is re-based so that its first timestamp is 0. If a window runs past the end
/// of either signal, both segments are truncated to the common available length.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SignalError::TooShort`] | The reference has fewer than 2 samples or a non-positive interval |
/// | [`SignalError::SyncBlockLengthMismatch`] | Reference and evaluation windows discretize to different lengths |
#[instrument(level = "debug", skip(reference, evaluated))]
pub fn apply_sync_block(
    reference: &SignalData,
    evaluated: &SignalData,
    block: &SyncBlock,
) -> Result<(SignalData, SignalData), SignalError> {
    let step = reference.sample_time_step();
    if reference.len() < 2 || step <= 0.0 {
        return Err(SignalError::TooShort {
            len: reference.len(),
        });
    }

    let (ref_len, eval_len) = block.sample_counts(step);
    if ref_len != eval_len {
        return Err(SignalError::SyncBlockLengthMismatch {
            reference: ref_len,
            evaluation: eval_len,
        });
    }

    if block.ref_start < 0.0 || block.eval_start < 0.0 {
        warn!(
            ref_start = block.ref_start,
            eval_start = block.eval_start,
            "sync block starts before the data, clamping to the first sample"
        );
    }
    let ref_start = samples_in(block.ref_start, step);
    let eval_start = samples_in(block.eval_start, step);
    let available = reference
        .len()
        .saturating_sub(ref_start)
        .min(evaluated.len().saturating_sub(eval_start));

    let length = if ref_len > available {
        warn!(
            requested = ref_len,
            available, "sync block runs past the end of the data, truncating"
        );
        available
    } else {
        ref_len
    };

    let ref_segment = reference.slice(ref_start..ref_start + length);
    let eval_segment = evaluated.slice(eval_start..eval_start + length);
    Ok((rebase(&ref_segment), rebase(&eval_segment)))
}

fn rebase(signal: &SignalData) -> SignalData {
    match signal.first_timestamp() {
        Some(first) => signal.shift(-first),
        None => signal.clone(),
    }
}

/// Append `next` after `prev`.
///
/// `next` is shifted so that its first sample lands exactly one sample
/// interval after the last sample of `prev`. The interval is taken from
/// `prev`, falling back to `next` when `prev` has a single sample. An empty
/// `prev` returns `next` unshifted.
#[must_use]
pub fn concat_signal_data(prev: &SignalData, next: &SignalData) -> SignalData {
    let (Some(prev_last), Some(next_first)) = (prev.last_timestamp(), next.first_timestamp()) else {
        return if prev.is_empty() { next.clone() } else { prev.clone() };
    };

    let step = if prev.len() > 1 {
        prev.sample_time_step()
    } else {
        next.sample_time_step()
    };
    let offset = prev_last + step - next_first;

    let mut timestamps = prev.timestamps().to_vec();
    timestamps.extend(next.timestamps().iter().map(|t| t + offset));
    let mut values = prev.values().to_vec();
    values.extend_from_slice(next.values());
    SignalData::from_parts(timestamps, values)
}

/// Translate a signal's timestamps by `offset`.
#[must_use]
pub fn shift_signal(signal: &SignalData, offset: f64) -> SignalData {
    signal.shift(offset)
}

/// Translate every curve of a metric result by `offset`.
#[must_use]
pub fn shift_metric_result(result: &MetricResult, offset: f64) -> MetricResult {
    MetricResult {
        reference_input: result.reference_input.shift(offset),
        evaluated_input: result.evaluated_input.shift(offset),
        result: result.result.shift(offset),
        result_metadata: result
            .result_metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.shift(offset)))
            .collect(),
        input_metadata: result
            .input_metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.shift(offset)))
            .collect(),
    }
}

/// Concatenate two metric results field by field and key by key.
///
/// # Errors
///
/// Returns [`SignalError::MetadataKeyMismatch`] if the operands do not carry
/// identical key sets in both metadata maps.
pub fn concat_metric_result(
    prev: &MetricResult,
    next: &MetricResult,
) -> Result<MetricResult, SignalError> {
    let result_metadata = concat_maps(&prev.result_metadata, &next.result_metadata)?;
    let input_metadata = concat_maps(&prev.input_metadata, &next.input_metadata)?;
    Ok(MetricResult {
        reference_input: concat_signal_data(&prev.reference_input, &next.reference_input),
        evaluated_input: concat_signal_data(&prev.evaluated_input, &next.evaluated_input),
        result: concat_signal_data(&prev.result, &next.result),
        result_metadata,
        input_metadata,
    })
}

fn concat_maps(
    prev: &std::collections::BTreeMap<String, SignalData>,
    next: &std::collections::BTreeMap<String, SignalData>,
) -> Result<std::collections::BTreeMap<String, SignalData>, SignalError> {
    if let Some(key) = next.keys().find(|k| !prev.contains_key(*k)) {
        return Err(SignalError::MetadataKeyMismatch { key: key.clone() });
    }
    prev.iter()
        .map(|(key, signal)| {
            let other = next
                .get(key)
                .ok_or_else(|| SignalError::MetadataKeyMismatch { key: key.clone() })?;
            Ok((key.clone(), concat_signal_data(signal, other)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(values: Vec<f64>) -> SignalData {
        SignalData::uniform(1.0, values).unwrap()
    }

    #[test]
    fn full_length_block_keeps_everything() {
        let reference = signal(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let evaluated = signal(vec![1.0, 2.0, 3.0, 4.0]);
        let n = reference.len().min(evaluated.len()) as f64;
        let block = SyncBlock::new(0.0, n, 0.0, n);

        let (r, e) = apply_sync_block(&reference, &evaluated, &block).unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(e.len(), 4);
        assert_eq!(r.first_timestamp(), Some(0.0));
        assert_eq!(e.first_timestamp(), Some(0.0));
    }

    #[test]
    fn offset_block_is_rebased() {
        let reference = signal(vec![0.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
        let evaluated = signal(vec![0.0, 1.0, 2.0, 3.0, 0.0, 0.0]);
        let block = SyncBlock::new(2.0, 5.0, 1.0, 4.0);

        let (r, e) = apply_sync_block(&reference, &evaluated, &block).unwrap();
        assert_eq!(r.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(e.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(r.timestamps(), &[0.0, 1.0, 2.0]);
        assert_eq!(e.timestamps(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn mismatched_block_lengths_fail() {
        let reference = signal(vec![0.0; 10]);
        let evaluated = signal(vec![0.0; 10]);
        let block = SyncBlock::new(0.0, 5.0, 0.0, 4.0);

        let err = apply_sync_block(&reference, &evaluated, &block).unwrap_err();
        assert!(matches!(
            err,
            SignalError::SyncBlockLengthMismatch { reference: 5, evaluation: 4 }
        ));
    }

    #[test]
    fn overlong_block_is_truncated_equally() {
        let reference = signal(vec![1.0; 6]);
        let evaluated = signal(vec![1.0; 6]);
        let block = SyncBlock::new(0.0, 5.0, 3.0, 8.0);

        let (r, e) = apply_sync_block(&reference, &evaluated, &block).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(e.len(), 3);
    }

    #[test]
    fn negative_start_is_clamped_to_first_sample() {
        let reference = signal(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let evaluated = signal(vec![5.0, 6.0, 7.0, 8.0, 9.0]);
        let block = SyncBlock::new(-1.0, 2.0, 1.0, 4.0);

        let (r, e) = apply_sync_block(&reference, &evaluated, &block).unwrap();
        assert_eq!(r.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(e.values(), &[6.0, 7.0, 8.0]);
        assert_eq!(r.first_timestamp(), Some(0.0));
    }

    #[test]
    fn single_sample_reference_is_rejected() {
        let reference = signal(vec![1.0]);
        let block = SyncBlock::new(0.0, 1.0, 0.0, 1.0);
        let err = apply_sync_block(&reference, &reference, &block).unwrap_err();
        assert!(matches!(err, SignalError::TooShort { len: 1 }));
    }

    #[test]
    fn concat_continues_the_grid() {
        let a = signal(vec![1.0, 2.0, 3.0]);
        let b = signal(vec![4.0, 5.0]);
        let joined = concat_signal_data(&a, &b);
        assert_eq!(joined.timestamps(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(joined.values(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn concat_onto_empty_is_identity() {
        let b = signal(vec![4.0, 5.0]).shift(7.0);
        let joined = concat_signal_data(&SignalData::empty(), &b);
        assert_eq!(joined, b);
    }

    #[test]
    fn shift_metric_result_moves_every_curve() {
        let s = signal(vec![1.0, 2.0]);
        let result = MetricResult::new(s.clone(), s.clone(), s.clone())
            .with_result_metadata("sub", s.clone())
            .with_input_metadata("copy", s.clone());
        let shifted = shift_metric_result(&result, 10.0);
        assert_eq!(shifted.result.timestamps(), &[10.0, 11.0]);
        assert_eq!(shifted.reference_input.timestamps(), &[10.0, 11.0]);
        assert_eq!(shifted.result_metadata["sub"].timestamps(), &[10.0, 11.0]);
        assert_eq!(shifted.input_metadata["copy"].timestamps(), &[10.0, 11.0]);
        assert_eq!(shifted.result.values(), result.result.values());
    }

    #[test]
    fn concat_metric_result_requires_same_keys() {
        let s = signal(vec![1.0, 2.0]);
        let a = MetricResult::new(s.clone(), s.clone(), s.clone()).with_result_metadata("x", s.clone());
        let b = MetricResult::new(s.clone(), s.clone(), s.clone()).with_result_metadata("y", s.clone());
        let err = concat_metric_result(&a, &b).unwrap_err();
        assert!(matches!(err, SignalError::MetadataKeyMismatch { .. }));
    }

    #[test]
    fn concat_metric_result_joins_metadata() {
        let s = signal(vec![1.0, 2.0]);
        let a = MetricResult::new(s.clone(), s.clone(), s.clone()).with_input_metadata("x", s.clone());
        let joined = concat_metric_result(&a, &a).unwrap();
        assert_eq!(joined.result.len(), 4);
        assert_eq!(joined.input_metadata["x"].timestamps(), &[0.0, 1.0, 2.0, 3.0]);
    }
}
