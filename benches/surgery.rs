//! Benchmarks for the structural surgery routines and signatures
//!
//! 1. **`ideal_to_finite`**: truncating the cusp of the figure-eight knot complement
//! 2. **`puncture`**: opening a sphere boundary in growing connected sums
//! 3. **`connected_sum_with`**: summing copies of a small closed manifold
//! 4. **`iso_sig`**: canonical signatures of growing triangulations
//! 5. **`skeleton`**: recomputing faces, links and boundary components

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gluing::prelude::*;
use std::hint::black_box;

fn figure_eight() -> Triangulation<3> {
    let mut tri = Triangulation::<3>::new();
    let r = tri.new_simplex();
    let s = tri.new_simplex();
    tri.join(r, 0, s, Perm::from_images([1, 3, 0, 2])).unwrap();
    tri.join(r, 1, s, Perm::from_images([2, 0, 3, 1])).unwrap();
    tri.join(r, 2, s, Perm::from_images([0, 3, 2, 1])).unwrap();
    tri.join(r, 3, s, Perm::from_images([2, 1, 0, 3])).unwrap();
    tri
}

fn rp2_cross_circle() -> Triangulation<3> {
    let mut tri = Triangulation::<3>::new();
    let [r, s, t] = [tri.new_simplex(), tri.new_simplex(), tri.new_simplex()];
    tri.join(s, 0, r, Perm::IDENTITY).unwrap();
    tri.join(s, 3, r, Perm::from_images([3, 0, 1, 2])).unwrap();
    tri.join(s, 1, t, Perm::from_images([3, 0, 1, 2])).unwrap();
    tri.join(s, 2, t, Perm::IDENTITY).unwrap();
    tri.join(r, 1, t, Perm::from_images([2, 3, 0, 1])).unwrap();
    tri.join(r, 3, t, Perm::from_images([2, 3, 0, 1])).unwrap();
    tri
}

/// Connected sum of `copies` copies of RP² × S¹.
fn summed(copies: usize) -> Triangulation<3> {
    let summand = rp2_cross_circle();
    let mut tri = summand.clone();
    for _ in 1..copies {
        tri.connected_sum_with(&summand).unwrap();
    }
    tri
}

fn benchmark_ideal_to_finite(c: &mut Criterion) {
    let mut group = c.benchmark_group("ideal_to_finite");
    group.bench_function("figure_eight", |b| {
        b.iter_batched(
            figure_eight,
            |mut tri| black_box(tri.ideal_to_finite().unwrap()),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn benchmark_puncture(c: &mut Criterion) {
    let mut group = c.benchmark_group("puncture");
    for copies in [1, 4, 16] {
        let base = summed(copies);
        group.throughput(Throughput::Elements(base.size() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(copies), &base, |b, base| {
            b.iter_batched(
                || base.clone(),
                |mut tri| {
                    tri.puncture(None).unwrap();
                    black_box(tri)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn benchmark_connected_sum(c: &mut Criterion) {
    let summand = rp2_cross_circle();
    let mut group = c.benchmark_group("connected_sum_with");
    for copies in [1, 4, 16] {
        let base = summed(copies);
        group.bench_with_input(BenchmarkId::from_parameter(copies), &base, |b, base| {
            b.iter_batched(
                || base.clone(),
                |mut tri| {
                    tri.connected_sum_with(&summand).unwrap();
                    black_box(tri)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn benchmark_iso_sig(c: &mut Criterion) {
    let mut group = c.benchmark_group("iso_sig");
    for copies in [1, 2, 4] {
        let tri = summed(copies);
        group.throughput(Throughput::Elements(tri.size() as u64));
        group.bench_with_input(BenchmarkId::new("exhaustive", copies), &tri, |b, tri| {
            b.iter(|| black_box(tri.iso_sig()));
        });
        group.bench_with_input(BenchmarkId::new("index_order", copies), &tri, |b, tri| {
            b.iter(|| black_box(tri.iso_sig_with(&IndexOrderLabelling)));
        });
    }
    let sig = summed(4).iso_sig();
    group.bench_function("decode", |b| {
        b.iter(|| black_box(Triangulation::<3>::from_iso_sig(black_box(&sig)).unwrap()));
    });
    group.finish();
}

fn benchmark_skeleton(c: &mut Criterion) {
    let mut group = c.benchmark_group("skeleton");
    for copies in [1, 8, 32] {
        let tri = summed(copies);
        group.throughput(Throughput::Elements(tri.size() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(copies), &tri, |b, tri| {
            b.iter(|| black_box(Skeleton::compute(tri)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_ideal_to_finite,
    benchmark_puncture,
    benchmark_connected_sum,
    benchmark_iso_sig,
    benchmark_skeleton
);
criterion_main!(benches);
