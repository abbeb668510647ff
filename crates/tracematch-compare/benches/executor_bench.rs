//! Criterion benchmarks for tracematch-compare: sequential vs pooled execution.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tracematch_compare::{
    Channel, ChannelId, Comparison, ComparisonExecutor, ExecutionMode, InMemorySource,
    Measurement, SyncProcessor,
};
use tracematch_metric::MetricRegistry;
use tracematch_signal::SignalData;

const SAMPLE_RATE: f64 = 100.0;

fn make_measurement(
    source: &mut InMemorySource,
    name: &str,
    channels: usize,
    len: usize,
    seed: u64,
) -> Measurement {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let channels = (0..channels)
        .map(|c| {
            let values = (0..len)
                .map(|i| (i as f64 * 0.02 + c as f64).sin() * 10.0 + rng.r#gen::<f64>())
                .collect();
            let id = ChannelId::new(format!("{name}::ch{c}"));
            source.insert(id.clone(), SignalData::uniform(1.0 / SAMPLE_RATE, values).unwrap());
            Channel::new(id, format!("ch{c}"))
        })
        .collect();
    Measurement::new(name, len as f64 / SAMPLE_RATE, SAMPLE_RATE, channels)
}

fn bench_execute(c: &mut Criterion) {
    let metric = MetricRegistry::default().get("ISO").unwrap();
    let mut group = c.benchmark_group("execute");
    group.sample_size(10);

    for channels in [8usize, 64] {
        let mut source = InMemorySource::new();
        let reference = make_measurement(&mut source, "ref", channels, 512, 1);
        let evaluation = make_measurement(&mut source, "eval", channels, 512, 2);
        let mut comparison = Comparison::new(reference, evaluation);
        comparison.set_metric(metric);
        SyncProcessor::sync_full(&mut comparison);

        for (label, mode) in [
            ("sequential", ExecutionMode::Sequential),
            ("parallel", ExecutionMode::Parallel { threads: None }),
        ] {
            let executor = ComparisonExecutor::new(mode);
            group.bench_with_input(BenchmarkId::new(label, channels), &comparison, |b, cmp| {
                b.iter(|| executor.execute(cmp, &source).unwrap());
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_execute);
criterion_main!(benches);
