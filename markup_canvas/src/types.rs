// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public handle and flag types for the surface.

/// Identifier for a top-level drawable on a [`Surface`](crate::Surface).
///
/// A small, copyable generational handle: a slot index plus a generation counter.
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `DrawableId` for it is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a distinct id.
///
/// Stale ids never alias a different live drawable because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct DrawableId(pub(crate) u32, pub(crate) u32);

impl DrawableId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Drawable flags controlling rendering and picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DrawableFlags: u8 {
        /// Drawable is rendered and returned by rectangle queries.
        const VISIBLE  = 0b0000_0001;
        /// Drawable participates in hit testing.
        const PICKABLE = 0b0000_0010;
    }
}

impl Default for DrawableFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}
