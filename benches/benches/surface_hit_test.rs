// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use markup_canvas::{AxisTransform, Shape, Style, Surface};

/// A 64x64 lattice of points with a polyline segment next to each one.
fn populated() -> Surface {
    let mut surface = Surface::new(AxisTransform::default());
    for y in 0..64 {
        for x in 0..64 {
            let p = Point::new(f64::from(x) * 30.0, f64::from(y) * 30.0);
            let point = Shape::point(format!("p{x}-{y}"), p, Style::default());
            let seg = Shape::line(
                format!("s{x}-{y}"),
                p + (5.0, 5.0),
                p + (20.0, 12.0),
                Style::default(),
            );
            for shape in [point, seg].into_iter().flatten() {
                let _ = surface.insert(shape);
            }
        }
    }
    surface
}

fn probes() -> Vec<Point> {
    (0..256)
        .map(|i| Point::new(f64::from(i % 16) * 117.0 + 3.0, f64::from(i / 16) * 117.0 + 3.0))
        .collect()
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface_hit_test");
    let probes = probes();
    group.throughput(Throughput::Elements(probes.len() as u64));

    let mut surface = populated();
    surface.flush();
    group.bench_function("identity", |b| {
        b.iter(|| {
            let hits = probes.iter().filter(|&&p| surface.hit_test(p).is_some()).count();
            black_box(hits)
        });
    });

    surface.zoom_at(Point::new(400.0, 300.0), 3.0);
    group.bench_function("zoomed", |b| {
        b.iter(|| {
            let hits = probes.iter().filter(|&&p| surface.hit_test(p).is_some()).count();
            black_box(hits)
        });
    });

    group.bench_function("pan_then_hit", |b| {
        b.iter(|| {
            surface.pan((1.0, -1.0).into());
            black_box(surface.hit_test(Point::new(400.0, 300.0)))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_hit_test);
criterion_main!(benches);
