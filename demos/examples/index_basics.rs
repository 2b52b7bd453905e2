// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial index basics: insert, move, query, remove.
//!
//! Run:
//! - `cargo run -p markup_demos --example index_basics`

use markup_index::{Aabb2D, Index};

fn main() {
    env_logger::init();

    let mut idx: Index<f64, &'static str> = Index::new();
    let a = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), "a");
    let b = idx.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0), "b");
    let _c = idx.insert(Aabb2D::new(40.0, 40.0, 50.0, 50.0), "c");

    let under: Vec<_> = idx.query_point(7.0, 7.0).map(|c| c.payload).collect();
    println!("candidates at (7, 7): {under:?}");

    idx.reindex(a, Aabb2D::new(100.0, 0.0, 110.0, 10.0));
    let under: Vec<_> = idx.query_point(7.0, 7.0).map(|c| c.payload).collect();
    println!("after moving a: {under:?}");

    let window = Aabb2D::new(0.0, 0.0, 45.0, 45.0);
    let mut visible: Vec<_> = idx.query_rect(window).map(|c| c.payload).collect();
    visible.sort_unstable();
    println!("intersecting {window:?}: {visible:?}");

    println!("removed {:?}, {} left", idx.remove(b), idx.len());
}
