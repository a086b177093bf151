// Benchmarks for the per-tick statistics and the full engine tick
// Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use washwatch::hardware::RawSample;
use washwatch::stats::{MedianFilter, VarianceTracker};
use washwatch::{Config, Monitor};

fn bench_variance_tracker(c: &mut Criterion) {
    let values: Vec<f64> = (0..10_000).map(|i| (i as f64 * 0.37).sin()).collect();
    c.bench_function("variance tracker 10k adds (window 50)", |b| {
        b.iter(|| {
            let mut tracker = VarianceTracker::new(50);
            for &v in &values {
                tracker.add(v);
            }
            black_box((tracker.variance(), tracker.range()))
        });
    });
}

fn bench_median_filter(c: &mut Criterion) {
    let values: Vec<f64> = (0..10_000).map(|i| ((i * 7919) % 101) as f64).collect();
    c.bench_function("median filter 10k adds (window 3)", |b| {
        b.iter(|| {
            let mut filter = MedianFilter::new(3);
            let mut sum = 0.0;
            for &v in &values {
                filter.add(v);
                sum += filter.median().unwrap_or(0.0);
            }
            black_box(sum)
        });
    });
}

fn bench_monitor_tick(c: &mut Criterion) {
    let config = Config::default();
    let samples: Vec<RawSample> = (0..10_000)
        .map(|i| {
            let x = ((i as f64 * 0.63).sin() * 8000.0) as i16;
            RawSample::new(x, x / 2, 16000)
        })
        .collect();
    c.bench_function("monitor 10k ticks", |b| {
        b.iter(|| {
            let mut monitor = Monitor::new(&config, 0);
            for (i, &raw) in samples.iter().enumerate() {
                black_box(monitor.tick(raw, i as u64 * 15));
            }
            monitor.counter()
        });
    });
}

criterion_group!(benches, bench_variance_tracker, bench_median_filter, bench_monitor_tick);
criterion_main!(benches);
