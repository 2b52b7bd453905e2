// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use markup_index::{Aabb2D, Index};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

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

fn bench_against_rstar(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_external_compare_f64");
    for &n in &[64_usize, 128] {
        let rects = grid(n, 10.0);
        let q = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
        let entries: Vec<_> = rects
            .iter()
            .copied()
            .enumerate()
            .map(|(i, r)| (r, i as u32))
            .collect();
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("markup_rebuild_query_n{n}"), |b| {
            b.iter_batched(
                Index::<f64, u32>::new,
                |mut idx| {
                    idx.rebuild(&entries);
                    black_box(idx.query_rect(q).count());
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("rstar_bulk_load_query_n{n}"), |b| {
            b.iter_batched(
                || {
                    rects
                        .iter()
                        .map(|r| Rectangle::from_corners([r.min_x, r.min_y], [r.max_x, r.max_y]))
                        .collect::<Vec<_>>()
                },
                |rectangles| {
                    let tree = RTree::bulk_load(rectangles);
                    let aabb = AABB::from_corners([q.min_x, q.min_y], [q.max_x, q.max_y]);
                    black_box(tree.locate_in_envelope_intersecting(&aabb).count());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_against_rstar);
criterion_main!(benches);
