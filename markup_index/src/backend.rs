// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use alloc::boxed::Box;

use crate::types::Aabb2D;
use core::fmt::Debug;

/// Spatial backend abstraction used by `IndexGeneric`.
///
/// There is no in-place update: a slot whose box changes is removed and inserted again,
/// so a backend never has to patch internal bounds for a moved item.
pub trait Backend<T: Copy + PartialOrd + Debug, P: Copy + Debug> {
    /// Insert a slot with its AABB. The slot must not currently be present.
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>);

    /// Remove a slot. Returns false if the slot was not present.
    fn remove(&mut self, slot: usize) -> bool;

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Query slots whose AABB contains the point.
    fn query_point<'a>(&'a self, x: T, y: T) -> Box<dyn Iterator<Item = usize> + 'a>;

    /// Query slots whose AABB intersects the rectangle.
    fn query_rect<'a>(&'a self, rect: Aabb2D<T>) -> Box<dyn Iterator<Item = usize> + 'a>;
}
