// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use markup_index::{Aabb2D, Index, LinearIndex};

fn grid(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            out.push(Aabb2D::<f64>::from_xywh(
                x as f64 * cell,
                y as f64 * cell,
                cell,
                cell,
            ));
        }
    }
    out
}

struct Rng(u64);

impl Rng {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        ((x >> 11) as f64) / ((1_u64 << 53) as f64)
    }
}

/// Small boxes scattered over a 2000x2000 image, like point and vertex annotations.
fn scattered(count: usize, size: f64) -> Vec<Aabb2D<f64>> {
    let mut rng = Rng(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let x = rng.next_f64() * (2000.0 - size);
            let y = rng.next_f64() * (2000.0 - size);
            Aabb2D::<f64>::from_xywh(x, y, size, size)
        })
        .collect()
}

fn bench_build_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_query");
    for &n in &[32_usize, 64, 128] {
        let rects = grid(n, 10.0);
        let q = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("rtree_insert_n{n}"), |b| {
            b.iter_batched(
                Index::<f64, u32>::new,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        idx.insert(r, i as u32);
                    }
                    black_box(idx.query_rect(q).count());
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("rtree_rebuild_n{n}"), |b| {
            let entries: Vec<_> = rects
                .iter()
                .copied()
                .enumerate()
                .map(|(i, r)| (r, i as u32))
                .collect();
            b.iter_batched(
                Index::<f64, u32>::new,
                |mut idx| {
                    idx.rebuild(&entries);
                    black_box(idx.query_rect(q).count());
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("linear_insert_n{n}"), |b| {
            b.iter_batched(
                LinearIndex::<f64, u32>::new,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        idx.insert(r, i as u32);
                    }
                    black_box(idx.query_rect(q).count());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_point_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_queries");
    let rects = scattered(4096, 12.0);
    let mut rtree = Index::<f64, u32>::new();
    let mut linear = LinearIndex::<f64, u32>::new();
    for (i, r) in rects.iter().copied().enumerate() {
        rtree.insert(r, i as u32);
        linear.insert(r, i as u32);
    }
    let points: Vec<(f64, f64)> = (0..256)
        .map(|q| ((q % 16) as f64 * 125.0, (q / 16) as f64 * 125.0))
        .collect();
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("rtree_4096", |b| {
        b.iter(|| {
            let total: usize = points
                .iter()
                .map(|&(x, y)| rtree.query_point(x, y).count())
                .sum();
            black_box(total)
        });
    });
    group.bench_function("linear_4096", |b| {
        b.iter(|| {
            let total: usize = points
                .iter()
                .map(|&(x, y)| linear.query_point(x, y).count())
                .sum();
            black_box(total)
        });
    });
    group.finish();
}

/// Every entry moves a little, as when a whole view is panned or a polygon is dragged.
fn bench_reindex(c: &mut Criterion) {
    let mut group = c.benchmark_group("reindex");
    let rects = grid(64, 10.0);
    group.throughput(Throughput::Elements(rects.len() as u64));
    group.bench_function("rtree_move_all", |b| {
        b.iter_batched(
            || {
                let mut idx = Index::<f64, u32>::new();
                let keys: Vec<_> = rects
                    .iter()
                    .copied()
                    .enumerate()
                    .map(|(i, r)| idx.insert(r, i as u32))
                    .collect();
                (idx, keys)
            },
            |(mut idx, keys)| {
                for (k, r) in keys.into_iter().zip(&rects) {
                    let moved =
                        Aabb2D::new(r.min_x + 3.0, r.min_y - 2.0, r.max_x + 3.0, r.max_y - 2.0);
                    idx.reindex(k, moved);
                }
                black_box(idx.len());
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_build_query, bench_point_queries, bench_reindex);
criterion_main!(benches);
