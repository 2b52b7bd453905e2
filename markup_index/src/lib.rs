// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup Index: a generic 2D AABB index for hit-test acceleration.
//!
//! - Insert and remove axis-aligned bounding boxes (AABBs) with small `Copy` payloads.
//! - Move an entry with [`IndexGeneric::reindex`], which removes the stale box from the
//!   backend and inserts the new one in a single call. There is no way to mutate a box in
//!   place, so the backend can never hold a box that disagrees with the entry.
//! - Query by point or intersecting rectangle. Results are [`Candidate`]s carrying the key,
//!   the indexed box, and the payload; they are a superset of precise hits.
//!
//! The index is generic over the scalar type `T` and does not depend on any geometry crate.
//! Higher layers compute screen-space boxes and feed them here.
//!
//! # Example
//!
//! ```rust
//! use markup_index::{Aabb2D, Index};
//!
//! let mut idx: Index<f64, u32> = Index::new();
//! let k1 = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
//! let _k2 = idx.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0), 2);
//!
//! // Move the first box.
//! assert!(idx.reindex(k1, Aabb2D::new(20.0, 0.0, 30.0, 10.0)));
//!
//! // Query a point inside the second box only.
//! let hits: Vec<_> = idx.query_point(6.0, 6.0).collect();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].payload, 2);
//! ```
//!
//! ## Choosing a backend
//!
//! - `RTreeF32`/`RTreeF64` (default): R-tree with area-weighted splits; queries cost
//!   O(log n + k) for well-distributed boxes. See the [`backends`] docs for the split metric.
//! - `FlatVec` ([`LinearIndex`]): linear scans, exact by construction. Good for very small
//!   sets and as a reference in tests.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. Debug builds may assert.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod index;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::rtree::{RTree, RTreeF32, RTreeF64};
pub use index::{Candidate, Index, IndexGeneric, Key, LinearIndex};
pub use types::Aabb2D;
