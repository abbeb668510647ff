//! Criterion benchmarks for tracematch-metric: registry metrics on noisy signals.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tracematch_metric::{Dtw, MetricRegistry, WarpingWindow};
use tracematch_signal::SignalData;

fn make_noisy_wave(n: usize, seed: u64) -> SignalData {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let values = (0..n)
        .map(|i| (i as f64 * 0.02).sin() * 10.0 + rng.r#gen::<f64>())
        .collect();
    SignalData::uniform(0.01, values).unwrap()
}

fn bench_registry_metrics(c: &mut Criterion) {
    let registry = MetricRegistry::default();
    let mut group = c.benchmark_group("metric_compute");

    for len in [256usize, 1024] {
        let reference = make_noisy_wave(len, 1);
        let evaluated = make_noisy_wave(len, 2);
        for (name, metric) in registry.iter() {
            let id = BenchmarkId::new(name, len);
            group.bench_with_input(id, &(&reference, &evaluated), |b, (r, e)| {
                b.iter(|| metric.compute(r, e).unwrap());
            });
        }
    }

    group.finish();
}

fn bench_dtw_align(c: &mut Criterion) {
    let a = make_noisy_wave(2048, 3);
    let b = make_noisy_wave(2048, 4);
    let mut group = c.benchmark_group("dtw_align");

    for fraction in [0.01, 0.1] {
        let dtw = Dtw::new(WarpingWindow::from_fraction(fraction, a.len()));
        group.bench_with_input(BenchmarkId::from_parameter(fraction), &dtw, |bencher, dtw| {
            bencher.iter(|| dtw.align(a.values(), b.values()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_registry_metrics, bench_dtw_align);
criterion_main!(benches);
