// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `rtree`: generic R-tree (`T: Scalar`) with an area-weighted split
//!   (aliases: `RTreeF32`, `RTreeF64`).
//! - `flatvec`: flat vector with linear scans; small, simple, and a brute-force reference.
//!
//! Split note
//! ----------
//! On overflow the R-tree sorts children along each axis and, for a split point `k`, minimizes:
//!
//! `cost(k) = area(LB_k) * k + area(RB_k) * (n - k)`
//!
//! where `LB_k` and `RB_k` are the bounding boxes of the first `k` and remaining `n - k` items.
//! All `k` are evaluated in O(n) per axis using prefix/suffix bounding boxes.
//! Accumulators are widened (`f32`→`f64`) for robust comparisons.
//! The bulk builder uses an STR-like pass to seed packed leaves and parents.

pub mod flatvec;
pub mod rtree;
