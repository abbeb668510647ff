//! End-to-end tests for tracematch-compare: sync, execute, aggregate.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tracematch_compare::{
    Channel, ChannelId, CompareError, Comparison, ComparisonExecutor, ConfigurationError,
    ExecutionMode, InMemorySource, Measurement, SourceError, SyncProcessor,
};
use tracematch_metric::{Metric, MetricRegistry, PhaseConfig};
use tracematch_signal::{SignalData, SyncBlock};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a 1 Hz measurement and register its channels in `source`.
fn measurement(
    source: &mut InMemorySource,
    name: &str,
    channels: &[(&str, Vec<f64>)],
) -> Measurement {
    let len = channels.first().map_or(0, |(_, v)| v.len());
    let channels = channels
        .iter()
        .map(|(channel, values)| {
            let id = ChannelId::new(format!("{name}::{channel}"));
            let data = SignalData::uniform(1.0, values.clone()).expect("valid test signal");
            source.insert(id.clone(), data);
            Channel::new(id, *channel)
        })
        .collect();
    Measurement::new(name, len as f64, 1.0, channels)
}

fn noisy_channels(prefix: &str, count: usize, len: usize, seed: u64) -> Vec<(String, Vec<f64>)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|c| {
            let values = (0..len)
                .map(|i| (i as f64 * 0.1 + c as f64).sin() * 3.0 + rng.r#gen::<f64>() * 0.2)
                .collect();
            (format!("{prefix}{c}"), values)
        })
        .collect()
}

fn as_refs(channels: &[(String, Vec<f64>)]) -> Vec<(&str, Vec<f64>)> {
    channels
        .iter()
        .map(|(n, v)| (n.as_str(), v.clone()))
        .collect()
}

fn step(len: usize, from: usize, to: usize) -> Vec<f64> {
    (0..len)
        .map(|i| if (from..to).contains(&i) { 10.0 } else { 0.0 })
        .collect()
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[test]
fn identical_measurements_score_one() {
    let mut source = InMemorySource::new();
    let channels = noisy_channels("ch", 5, 64, 7);
    let reference = measurement(&mut source, "ref", &as_refs(&channels));
    let evaluation = measurement(&mut source, "eval", &as_refs(&channels));

    let mut comparison = Comparison::new(reference, evaluation);
    comparison.set_metric(Metric::PearsonCorrelation);
    assert!(SyncProcessor::sync_full(&mut comparison));

    let result = ComparisonExecutor::default()
        .execute(&comparison, &source)
        .unwrap();
    assert_eq!(result.name(), "ref - eval (Pearson Correlation)");
    assert_eq!(result.channel_results().len(), 5);
    assert_eq!(result.total().unwrap().len(), 64);
    assert!((result.result_average().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn parallel_matches_sequential() {
    let mut source = InMemorySource::new();
    let ref_channels = noisy_channels("ch", 24, 80, 1);
    let eval_channels = noisy_channels("ch", 24, 80, 2);
    let reference = measurement(&mut source, "ref", &as_refs(&ref_channels));
    let evaluation = measurement(&mut source, "eval", &as_refs(&eval_channels));

    let mut comparison = Comparison::new(reference, evaluation);
    comparison.set_metric(MetricRegistry::default().get("ISO").unwrap());
    comparison.add_sync_block(SyncBlock::new(0.0, 30.0, 0.0, 30.0));
    comparison.add_sync_block(SyncBlock::new(40.0, 70.0, 40.0, 70.0));

    let sequential = ComparisonExecutor::new(ExecutionMode::Sequential)
        .execute(&comparison, &source)
        .unwrap();
    let parallel = ComparisonExecutor::new(ExecutionMode::Parallel { threads: Some(4) })
        .execute(&comparison, &source)
        .unwrap();

    assert_eq!(sequential, parallel);
    let order: Vec<_> = parallel
        .channel_results()
        .iter()
        .map(|r| r.reference.name.clone())
        .collect();
    let expected: Vec<_> = ref_channels.iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(order, expected);
    assert_eq!(parallel.total().unwrap().len(), 60);
}

#[test]
fn total_is_mean_of_channel_curves() {
    let mut source = InMemorySource::new();
    let ref_channels = noisy_channels("ch", 3, 40, 3);
    let eval_channels = noisy_channels("ch", 3, 40, 4);
    let reference = measurement(&mut source, "ref", &as_refs(&ref_channels));
    let evaluation = measurement(&mut source, "eval", &as_refs(&eval_channels));

    let mut comparison = Comparison::new(reference, evaluation);
    comparison.set_metric(Metric::EuclideanDistance);
    SyncProcessor::sync_full(&mut comparison);

    let result = ComparisonExecutor::default()
        .execute(&comparison, &source)
        .unwrap();
    let total = result.total().unwrap();
    for i in 0..total.len() {
        let mean = result
            .channel_results()
            .iter()
            .map(|r| r.result.result.values()[i])
            .sum::<f64>()
            / 3.0;
        assert!((total.values()[i] - mean).abs() < 1e-12);
    }
}

#[test]
fn delayed_step_detected_through_the_pipeline() {
    let mut source = InMemorySource::new();
    let reference = measurement(&mut source, "ref", &[("speed", step(10, 3, 7))]);
    let evaluation = measurement(&mut source, "eval", &[("speed", step(10, 5, 9))]);

    let mut comparison = Comparison::new(reference, evaluation);
    comparison.set_metric(Metric::IsoPhase(PhaseConfig::new(0.3).unwrap()));
    SyncProcessor::sync_full(&mut comparison);

    let result = ComparisonExecutor::default()
        .execute(&comparison, &source)
        .unwrap();
    let score = result.result_average().unwrap();
    assert!(score < 1.0);
    assert!(score > 0.0);
}

#[test]
fn crossing_sync_removes_the_delay() {
    let mut source = InMemorySource::new();
    let reference = measurement(&mut source, "ref", &[("speed", step(20, 3, 12))]);
    let evaluation = measurement(&mut source, "eval", &[("speed", step(20, 5, 14))]);

    let ref_data = SignalData::uniform(1.0, step(20, 3, 12)).unwrap();
    let eval_data = SignalData::uniform(1.0, step(20, 5, 14)).unwrap();

    let mut comparison = Comparison::new(reference, evaluation);
    comparison.set_metric(Metric::PearsonCorrelation);
    assert!(SyncProcessor::sync(&mut comparison, &ref_data, &eval_data, 10.0, 10.0));
    assert_eq!(comparison.sync_blocks()[0], SyncBlock::new(3.0, 18.0, 5.0, 20.0));

    let result = ComparisonExecutor::default()
        .execute(&comparison, &source)
        .unwrap();
    assert!((result.result_average().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn marker_sync_feeds_the_executor() {
    let steps = vec![0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0];
    let mut source = InMemorySource::new();
    let reference = measurement(&mut source, "ref", &[("gear", steps.clone())]);
    let evaluation = measurement(&mut source, "eval", &[("gear", steps.clone())]);
    let data = SignalData::uniform(1.0, steps).unwrap();

    let mut comparison = Comparison::new(reference, evaluation);
    comparison.set_metric(Metric::EuclideanDistance);
    let added = SyncProcessor::sync_multi(&mut comparison, &data, &data, true).unwrap();
    assert_eq!(added, 4);

    let result = ComparisonExecutor::default()
        .execute(&comparison, &source)
        .unwrap();
    assert_eq!(result.total().unwrap().len(), 11);
    assert!((result.result_average().unwrap() - 1.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn configuration_error_aborts_before_loading() {
    let mut source = InMemorySource::new();
    let reference = measurement(&mut source, "ref", &[("a", vec![1.0; 10])]);
    let evaluation = measurement(&mut source, "eval", &[("a", vec![1.0; 10])]);

    let mut comparison = Comparison::new(reference, evaluation);
    comparison.set_metric(Metric::PearsonCorrelation);

    // an empty source would fail on load, so reaching it would change the error
    let err = ComparisonExecutor::default()
        .execute(&comparison, &InMemorySource::new())
        .unwrap_err();
    assert!(matches!(
        err,
        CompareError::Configuration(ConfigurationError::NoSyncBlocks)
    ));
}

#[test]
fn missing_channel_data_is_reported() {
    let mut source = InMemorySource::new();
    let reference = measurement(&mut source, "ref", &[("a", vec![1.0; 10])]);
    let evaluation = measurement(&mut InMemorySource::new(), "eval", &[("a", vec![1.0; 10])]);

    let mut comparison = Comparison::new(reference, evaluation);
    comparison.set_metric(Metric::PearsonCorrelation);
    SyncProcessor::sync_full(&mut comparison);

    let err = ComparisonExecutor::default()
        .execute(&comparison, &source)
        .unwrap_err();
    assert!(matches!(err, CompareError::Source(SourceError::Missing { .. })));
}

#[test]
fn batch_skips_invalid_comparisons() {
    let mut source = InMemorySource::new();
    let channels = noisy_channels("ch", 2, 30, 9);
    let reference = measurement(&mut source, "ref", &as_refs(&channels));
    let good = measurement(&mut source, "good", &as_refs(&channels));
    let other = measurement(&mut source, "other", &[("unrelated", vec![0.0; 30])]);

    let mut first = Comparison::new(reference.clone(), good.clone());
    first.set_metric(Metric::PearsonCorrelation);
    SyncProcessor::sync_full(&mut first);

    let mut unassigned = Comparison::new(reference.clone(), other);
    unassigned.set_metric(Metric::PearsonCorrelation);
    SyncProcessor::sync_full(&mut unassigned);

    let mut last = Comparison::new(reference, good);
    last.set_metric(Metric::EuclideanDistance);
    SyncProcessor::sync_full(&mut last);

    let mut finished = Vec::new();
    let results = ComparisonExecutor::new(ExecutionMode::Parallel { threads: Some(2) })
        .execute_all(&[first, unassigned, last], &source, |r| {
            finished.push(r.name().to_owned());
        });

    assert_eq!(results.len(), 2);
    assert_eq!(
        finished,
        [
            "ref - good (Pearson Correlation)",
            "ref - good (Euclidean Distance)"
        ]
    );
}
