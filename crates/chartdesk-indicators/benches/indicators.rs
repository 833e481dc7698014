//! Benchmarks for indicator implementations.

use chartdesk_core::traits::{Indicator, MultiOutputIndicator};
use chartdesk_indicators::{ema, rsi, BollingerBands, Ema, Macd, Rsi, Sma};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn benchmark_sma(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMA");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("batch", size), &data, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_ema(c: &mut Criterion) {
    let mut group = c.benchmark_group("EMA");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("batch", size), &data, |b, data| {
            let ema = Ema::new(20);
            b.iter(|| ema.calculate(black_box(data)))
        });

        // Feeding one price at a time, as the live pipeline does
        group.bench_with_input(BenchmarkId::new("incremental", size), &data, |b, data| {
            b.iter(|| {
                let mut previous = None;
                for end in 1..=data.len() {
                    if let Some(value) = ema(black_box(&data[..end]), 20, previous) {
                        previous = Some(value);
                    }
                }
                previous
            })
        });
    }

    group.finish();
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("batch", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("point", size), &data, |b, data| {
            b.iter(|| rsi(black_box(data), black_box(14)))
        });
    }

    group.finish();
}

fn benchmark_multi_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("MultiOutput");

    for size in [1000, 10000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("macd", size), &data, |b, data| {
            let macd = Macd::new();
            b.iter(|| macd.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("bollinger", size), &data, |b, data| {
            let bands = BollingerBands::default();
            b.iter(|| bands.calculate(black_box(data)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sma, benchmark_ema, benchmark_rsi, benchmark_multi_output);
criterion_main!(benches);
