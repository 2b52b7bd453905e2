// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector backend with linear scans. Small and simple; good for tiny sets.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::Aabb2D;

/// Flat vector backend with linear scans.
///
/// Every query visits every slot, so results are exact by construction. Tests and benches
/// use it as the reference the R-tree is checked against.
pub struct FlatVec<T: Copy + PartialOrd + Debug, P: Copy + Debug> {
    slots: Vec<Option<Aabb2D<T>>>,
    _p: core::marker::PhantomData<P>,
}

impl<T: Copy + PartialOrd + Debug, P: Copy + Debug> Default for FlatVec<T, P> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            _p: core::marker::PhantomData,
        }
    }
}

impl<T: Copy + PartialOrd + Debug, P: Copy + Debug> Debug for FlatVec<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.len();
        let alive = self.slots.iter().filter(|e| e.is_some()).count();
        f.debug_struct("FlatVec")
            .field("total_slots", &total)
            .field("alive", &alive)
            .finish_non_exhaustive()
    }
}

impl<T: Copy + PartialOrd + Debug, P: Copy + Debug> FlatVec<T, P> {
    fn scan(&self, pred: impl Fn(&Aabb2D<T>) -> bool) -> Box<dyn Iterator<Item = usize> + '_> {
        let out: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Some(a) if pred(a) => Some(i),
                _ => None,
            })
            .collect();
        Box::new(out.into_iter())
    }
}

impl<T: Copy + PartialOrd + Debug, P: Copy + Debug> Backend<T, P> for FlatVec<T, P> {
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        debug_assert!(self.slots[slot].is_none(), "slot {slot} inserted twice");
        self.slots[slot] = Some(aabb);
    }

    fn remove(&mut self, slot: usize) -> bool {
        self.slots
            .get_mut(slot)
            .and_then(|s| s.take())
            .is_some()
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn query_point<'a>(&'a self, x: T, y: T) -> Box<dyn Iterator<Item = usize> + 'a> {
        self.scan(move |a| a.contains_point(x, y))
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<T>) -> Box<dyn Iterator<Item = usize> + 'a> {
        self.scan(move |a| a.intersects(&rect))
    }
}
