/**
 * Performance benchmarks for halftone-dbs
 *
 * Run with:
 *   cargo bench
 *
 * View HTML reports in:
 *   target/criterion/report/index.html
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use halftone_dbs::{
    ordered_dither, BinaryPattern, Boundary, DbsConfig, DbsOptimizer, ErrorField, GrayField,
    KernelCache, Move, PsfKernel, RankerConfig, SeededRandom, ThresholdMatrix, VoidClusterRanker,
};

fn gradient_image(size: usize) -> GrayField {
    let data = (0..size * size)
        .map(|idx| ((idx % size) + (idx / size)) as f32 / (2.0 * size as f32))
        .collect();
    GrayField::from_raw(data, size, size)
}

/// Benchmark DBS halftoning for different image sizes
fn bench_dbs(c: &mut Criterion) {
    let mut group = c.benchmark_group("dbs");
    group.sample_size(10);

    for size in [16, 32, 64].iter() {
        let gray = gradient_image(*size);
        let config = DbsConfig {
            kernel_size: 9,
            sigma: 1.0,
            iterations: 3,
            seed: Some(42),
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::new("gradient", size), size, |b, _| {
            b.iter(|| {
                let mut cache = KernelCache::new();
                let optimizer =
                    DbsOptimizer::new(&gray, config.clone(), &mut cache).unwrap();
                black_box(optimizer.run().unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark the move-pricing primitive for different kernel sizes
fn bench_delta_cost(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta_cost");

    for kernel_size in [3usize, 9, 13].iter() {
        let mut rng = SeededRandom::new(Some(7));
        let gray = gradient_image(64);
        let pattern = BinaryPattern::random(64, 64, &mut rng);
        let psf = PsfKernel::gaussian(*kernel_size, 1.0);
        let field = ErrorField::build(&gray, &pattern, &psf, Boundary::Zero);
        let mv = Move::swap(32, 32, pattern.get(32, 32), 33, 32, 1 - pattern.get(32, 32));

        group.bench_with_input(
            BenchmarkId::new("kernel", kernel_size),
            kernel_size,
            |b, _| {
                b.iter(|| black_box(field.delta_cost(&mv)));
            },
        );
    }

    group.finish();
}

/// Benchmark void-and-cluster ranking for different block sizes
fn bench_ranker(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranker");
    group.sample_size(10);

    for size in [16, 32].iter() {
        let config = RankerConfig {
            kernel_size: 9,
            sigma: 1.9,
            seed: Some(42),
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::new("block", size), size, |b, _| {
            b.iter(|| {
                let mut cache = KernelCache::new();
                let ranker =
                    VoidClusterRanker::new(*size, *size, config.clone(), &mut cache).unwrap();
                black_box(ranker.rank().unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark ordered dithering against Bayer and blue-noise matrices
fn bench_ordered_dither(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_dither");

    let gray = gradient_image(256);
    let bayer = ThresholdMatrix::bayer(8).unwrap();

    group.bench_function("bayer_8", |b| {
        b.iter(|| black_box(ordered_dither(&gray, &bayer)));
    });

    let mut cache = KernelCache::new();
    let rank_config = RankerConfig {
        kernel_size: 9,
        sigma: 1.9,
        seed: Some(42),
        ..Default::default()
    };
    let rank = VoidClusterRanker::new(16, 16, rank_config, &mut cache)
        .unwrap()
        .rank()
        .unwrap();
    let blue_noise = ThresholdMatrix::from_rank_array(&rank);

    group.bench_function("blue_noise_16", |b| {
        b.iter(|| black_box(ordered_dither(&gray, &blue_noise)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_dbs,
    bench_delta_cost,
    bench_ranker,
    bench_ordered_dither
);
criterion_main!(benches);
