// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::backends::flatvec::FlatVec;
use crate::backends::rtree::RTree;
use crate::types::{Aabb2D, Scalar};

/// Generational handle for entries.
///
/// A key stays valid until its entry is removed. Slots are recycled, but a recycled slot
/// gets a new generation, so a stale key never aliases a different live entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A query result: the entry's key, its current box, and its payload.
///
/// Candidates are a superset of precise hits; callers refine them with their own
/// geometry tests and resolve the payload to their own objects.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate<T, P> {
    /// Handle of the matching entry.
    pub key: Key,
    /// The box the entry is currently indexed under.
    pub aabb: Aabb2D<T>,
    /// Caller payload stored with the entry.
    pub payload: P,
}

#[derive(Clone, Debug)]
struct Entry<T, P> {
    generation: u32,
    aabb: Aabb2D<T>,
    payload: P,
}

/// A generic AABB index parameterized by a spatial backend.
///
/// Every mutation is applied to the backend immediately; there is no pending state, so
/// queries always reflect exactly the set of live entries.
pub struct IndexGeneric<T: Copy + PartialOrd + Debug, P: Copy + Debug, B: Backend<T, P>> {
    entries: Vec<Option<Entry<T, P>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    len: usize,
    backend: B,
}

impl<T, P, B> Debug for IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T, P> + Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndexGeneric")
            .field("len", &self.len)
            .field("free_list", &self.free_list.len())
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl<T, P, B> Default for IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T, P> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T, P> + Default,
{
    /// Create an empty index using the backend's default constructor.
    pub fn new() -> Self {
        Self::with_backend(B::default())
    }
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T, P>,
{
    /// Create an empty index around an explicit backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            backend,
        }
    }

    /// Reserve space for at least `n` entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a new AABB with payload. Returns a stable handle `Key`.
    pub fn insert(&mut self, aabb: Aabb2D<T>, payload: P) -> Key {
        let entry = |generation| {
            Some(Entry {
                generation,
                aabb,
                payload,
            })
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].wrapping_add(1).max(1);
            self.generations[idx] = generation;
            self.entries[idx] = entry(generation);
            (idx, generation)
        } else {
            self.entries.push(entry(1));
            self.generations.push(1);
            (self.entries.len() - 1, 1)
        };
        self.backend.insert(idx, aabb);
        self.len += 1;
        Key::new(idx, generation)
    }

    /// Remove an entry, returning its payload.
    ///
    /// Returns `None` for a stale or foreign key; callers that always pair insert and
    /// remove can treat that as a bookkeeping bug.
    pub fn remove(&mut self, key: Key) -> Option<P> {
        self.entry(key)?;
        let entry = self.entries[key.idx()].take()?;
        let removed = self.backend.remove(key.idx());
        debug_assert!(removed, "backend lost slot {}", key.idx());
        self.free_list.push(key.idx());
        self.len -= 1;
        Some(entry.payload)
    }

    /// Move an entry to a new box.
    ///
    /// Backends are never patched in place: the slot is removed from the backend and
    /// inserted again under `aabb` in one step. Returns false for a stale key.
    pub fn reindex(&mut self, key: Key, aabb: Aabb2D<T>) -> bool {
        let Some(e) = self.entry_mut(key) else {
            return false;
        };
        e.aabb = aabb;
        let removed = self.backend.remove(key.idx());
        debug_assert!(removed, "backend lost slot {}", key.idx());
        self.backend.insert(key.idx(), aabb);
        true
    }

    /// Current box and payload of a live entry.
    pub fn get(&self, key: Key) -> Option<(Aabb2D<T>, P)> {
        self.entry(key).map(|e| (e.aabb, e.payload))
    }

    /// Whether `key` refers to a live entry.
    pub fn contains(&self, key: Key) -> bool {
        self.entry(key).is_some()
    }

    /// Iterate live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Candidate<T, P>> + '_ {
        self.entries.iter().enumerate().filter_map(|(i, e)| {
            e.as_ref().map(|e| Candidate {
                key: Key::new(i, e.generation),
                aabb: e.aabb,
                payload: e.payload,
            })
        })
    }

    /// Clear the index. Every outstanding key becomes stale.
    pub fn clear(&mut self) {
        for (idx, e) in self.entries.iter_mut().enumerate() {
            if e.take().is_some() {
                self.free_list.push(idx);
            }
        }
        self.len = 0;
        self.backend.clear();
    }

    /// Query for entries whose AABB contains the point.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = Candidate<T, P>> + '_ {
        self.resolve(self.backend.query_point(x, y))
    }

    /// Query for entries whose AABB intersects the given rectangle.
    pub fn query_rect(&self, rect: Aabb2D<T>) -> impl Iterator<Item = Candidate<T, P>> + '_ {
        self.resolve(self.backend.query_rect(rect))
    }

    fn resolve<'a>(
        &'a self,
        slots: impl Iterator<Item = usize> + 'a,
    ) -> impl Iterator<Item = Candidate<T, P>> + 'a {
        slots.filter_map(|i| {
            let e = self.entries.get(i)?.as_ref()?;
            Some(Candidate {
                key: Key::new(i, e.generation),
                aabb: e.aabb,
                payload: e.payload,
            })
        })
    }

    fn entry(&self, key: Key) -> Option<&Entry<T, P>> {
        self.entries
            .get(key.idx())?
            .as_ref()
            .filter(|e| e.generation == key.1)
    }

    fn entry_mut(&mut self, key: Key) -> Option<&mut Entry<T, P>> {
        self.entries
            .get_mut(key.idx())?
            .as_mut()
            .filter(|e| e.generation == key.1)
    }
}

impl<T: Scalar, P: Copy + Debug> IndexGeneric<T, P, RTree<T, P>> {
    /// Replace the whole contents with `entries`, bulk-packing the R-tree.
    ///
    /// Returns the new keys in input order. Every previously issued key becomes stale.
    pub fn rebuild(&mut self, entries: &[(Aabb2D<T>, P)]) -> Vec<Key> {
        self.clear();
        let mut keys = Vec::with_capacity(entries.len());
        let mut pairs = Vec::with_capacity(entries.len());
        for &(aabb, payload) in entries {
            let (idx, generation) = match self.free_list.pop() {
                Some(idx) => {
                    let generation = self.generations[idx].wrapping_add(1).max(1);
                    self.generations[idx] = generation;
                    (idx, generation)
                }
                None => {
                    self.entries.push(None);
                    self.generations.push(1);
                    (self.entries.len() - 1, 1)
                }
            };
            self.entries[idx] = Some(Entry {
                generation,
                aabb,
                payload,
            });
            pairs.push((idx, aabb));
            keys.push(Key::new(idx, generation));
        }
        self.len = entries.len();
        self.backend = RTree::bulk_build(&pairs);
        keys
    }
}

/// Default index: an R-tree over `T` coordinates.
pub type Index<T, P> = IndexGeneric<T, P, RTree<T, P>>;

/// Linear-scan index; exact by construction and handy as a reference.
pub type LinearIndex<T, P> = IndexGeneric<T, P, FlatVec<T, P>>;
