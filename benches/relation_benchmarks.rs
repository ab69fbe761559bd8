//! Benchmarks for integer relations.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use presburger::prelude::*;

/// A box `0 <= x_i <= size` in `dims` dimensions with one coupling equality.
fn boxed_relation(dims: usize, size: i64) -> IntegerRelation {
    let mut ineqs = Vec::new();
    for d in 0..dims {
        let mut lower = vec![0i64; dims + 1];
        lower[d] = 1;
        let mut upper = vec![0i64; dims + 1];
        upper[d] = -1;
        upper[dims] = size;
        ineqs.push(lower);
        ineqs.push(upper);
    }
    let mut eq = vec![1i64; dims + 1];
    eq[dims] = -size;
    IntegerRelation::from_coefficients::<i64, _>(&ineqs[..], &[eq][..], 0, dims).unwrap()
}

/// Benchmark construction from coefficient rows.
fn bench_construction(c: &mut Criterion) {
    let rows: Vec<Vec<i64>> = (0..64).map(|i| (0..9).map(|j| (i * j) % 7 - 3).collect()).collect();
    c.bench_function("from_coefficients_64x9", |b| {
        b.iter(|| IntegerRelation::from_coefficients::<i64, _>(black_box(&rows[..]), &[], 4, 4).unwrap())
    });
}

/// Benchmark intersection.
fn bench_intersect(c: &mut Criterion) {
    let a = boxed_relation(4, 10);
    let b = boxed_relation(4, 20);
    c.bench_function("intersect_4d", |bench| bench.iter(|| black_box(&a).intersect(black_box(&b)).unwrap()));
}

/// Benchmark the integer sampler on growing dimensions.
fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    for dims in [2usize, 4, 6] {
        let rel = boxed_relation(dims, 7);
        group.bench_with_input(BenchmarkId::from_parameter(dims), &rel, |b, rel| {
            b.iter(|| OmegaSampler::default().sample(black_box(rel)).unwrap())
        });
    }
    group.finish();
}

/// Benchmark integer-point equality.
fn bench_is_equal(c: &mut Criterion) {
    let a = boxed_relation(3, 9);
    let b = a.intersect(&a).unwrap();
    c.bench_function("is_equal_3d", |bench| bench.iter(|| black_box(&a).is_equal(black_box(&b)).unwrap()));
}

criterion_group!(benches, bench_construction, bench_intersect, bench_sampling, bench_is_equal);
criterion_main!(benches);
