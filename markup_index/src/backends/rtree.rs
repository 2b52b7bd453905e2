// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree backend generic over scalar `T: Scalar` with an area-weighted split.

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb2D, Scalar, ScalarAcc, area, union_aabb};

const MAX_CHILDREN: usize = 8;
const MIN_CHILDREN: usize = 3;

/// R-tree backend using area-weighted splits and widened accumulator metrics.
///
/// Removal prunes emptied nodes and recycles their arena slots, so a long run of
/// remove-then-insert cycles does not grow the arena without bound.
pub struct RTree<T: Scalar, P: Copy + Debug> {
    max_children: usize,
    min_children: usize,
    root: Option<NodeIdx>,
    arena: Vec<RNode<T>>,
    free_nodes: Vec<NodeIdx>,
    slots: Vec<Option<Aabb2D<T>>>,
    _p: core::marker::PhantomData<P>,
}

#[derive(Clone)]
struct RNode<T: Scalar> {
    bbox: Aabb2D<T>,
    leaf: bool,
    children: Vec<RChild<T>>,
}

#[derive(Clone)]
enum RChild<T: Scalar> {
    Node(NodeIdx),
    Item { slot: usize, bbox: Aabb2D<T> },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn get(self) -> usize {
        self.0
    }
}

impl<T: Scalar, P: Copy + Debug> Default for RTree<T, P> {
    fn default() -> Self {
        Self::with_fanout(MAX_CHILDREN, MIN_CHILDREN)
    }
}

type RChildren<T> = Vec<RChild<T>>;
type RBestSplit<T> = Option<(ScalarAcc<T>, RChildren<T>, RChildren<T>)>;

fn centroid_x<T: Scalar>(b: &Aabb2D<T>) -> T {
    T::mid(b.min_x, b.max_x)
}

fn centroid_y<T: Scalar>(b: &Aabb2D<T>) -> T {
    T::mid(b.min_y, b.max_y)
}

fn cmp_scalar<T: Scalar>(a: T, b: T) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl<T: Scalar, P: Copy + Debug> RTree<T, P> {
    /// Create an empty tree with a custom node fan-out.
    ///
    /// `min_children` is clamped so that a split always has a valid partition.
    pub fn with_fanout(max_children: usize, min_children: usize) -> Self {
        let max_children = max_children.max(2);
        let min_children = min_children.clamp(1, max_children / 2);
        Self {
            max_children,
            min_children,
            root: None,
            arena: Vec::new(),
            free_nodes: Vec::new(),
            slots: Vec::new(),
            _p: core::marker::PhantomData,
        }
    }

    /// Build a tree from `(slot, bbox)` pairs using an STR-like packed layout.
    pub fn bulk_build(pairs: &[(usize, Aabb2D<T>)]) -> Self {
        let mut tree = Self::default();
        let mut items = pairs.to_vec();
        for (slot, bbox) in pairs.iter().copied() {
            tree.set_slot(slot, Some(bbox));
        }
        tree.root = tree.pack(&mut items);
        tree
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn set_slot(&mut self, slot: usize, bbox: Option<Aabb2D<T>>) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot] = bbox;
    }

    fn alloc(&mut self, node: RNode<T>) -> NodeIdx {
        if let Some(idx) = self.free_nodes.pop() {
            self.arena[idx.get()] = node;
            idx
        } else {
            self.arena.push(node);
            NodeIdx(self.arena.len() - 1)
        }
    }

    fn child_bbox(&self, c: &RChild<T>) -> Aabb2D<T> {
        match c {
            RChild::Node(i) => self.arena[i.get()].bbox,
            RChild::Item { bbox, .. } => *bbox,
        }
    }

    fn children_bbox(&self, children: &[RChild<T>]) -> Aabb2D<T> {
        let mut it = children.iter();
        let first = match it.next() {
            Some(c) => self.child_bbox(c),
            None => Aabb2D::new(T::zero(), T::zero(), T::zero(), T::zero()),
        };
        it.fold(first, |acc, c| union_aabb(acc, self.child_bbox(c)))
    }

    /// STR-like bulk pack: sort by x into vertical slices, sort each slice by y, and chunk.
    fn pack(&mut self, items: &mut [(usize, Aabb2D<T>)]) -> Option<NodeIdx> {
        if items.is_empty() {
            return None;
        }
        let max = self.max_children;
        let slices = slice_count(items.len().div_ceil(max));
        items.sort_by(|a, b| cmp_scalar(centroid_x(&a.1), centroid_x(&b.1)));
        let slice_size = items.len().div_ceil(slices);
        let mut level: Vec<NodeIdx> = Vec::new();
        for slice in items.chunks_mut(slice_size) {
            slice.sort_by(|a, b| cmp_scalar(centroid_y(&a.1), centroid_y(&b.1)));
            for chunk in slice.chunks(max) {
                let children: RChildren<T> = chunk
                    .iter()
                    .map(|&(slot, bbox)| RChild::Item { slot, bbox })
                    .collect();
                let bbox = self.children_bbox(&children);
                level.push(self.alloc(RNode {
                    bbox,
                    leaf: true,
                    children,
                }));
            }
        }

        while level.len() > 1 {
            let slices = slice_count(level.len().div_ceil(max));
            level.sort_by(|a, b| {
                cmp_scalar(
                    centroid_x(&self.arena[a.get()].bbox),
                    centroid_x(&self.arena[b.get()].bbox),
                )
            });
            let slice_size = level.len().div_ceil(slices);
            let mut next = Vec::new();
            for slice in level.chunks_mut(slice_size) {
                slice.sort_by(|a, b| {
                    cmp_scalar(
                        centroid_y(&self.arena[a.get()].bbox),
                        centroid_y(&self.arena[b.get()].bbox),
                    )
                });
                for chunk in slice.chunks(max) {
                    let children: RChildren<T> = chunk.iter().map(|&i| RChild::Node(i)).collect();
                    let bbox = self.children_bbox(&children);
                    next.push(self.alloc(RNode {
                        bbox,
                        leaf: false,
                        children,
                    }));
                }
            }
            level = next;
        }
        level.pop()
    }

    fn choose_child(&self, children: &[RChild<T>], bbox: &Aabb2D<T>) -> usize {
        let mut best_idx = 0_usize;
        let mut best_cost: Option<(T::Acc, T::Acc)> = None;
        for (i, c) in children.iter().enumerate() {
            let cb = self.child_bbox(c);
            let grown = area(&union_aabb(cb, *bbox)) - area(&cb);
            let cost = (grown, area(&cb));
            let better = match best_cost {
                None => true,
                Some((bg, ba)) => grown < bg || (!(bg < grown) && cost.1 < ba),
            };
            if better {
                best_cost = Some(cost);
                best_idx = i;
            }
        }
        best_idx
    }

    /// Sort along each axis, precompute prefix/suffix boxes, and pick the `k` minimizing
    /// `area(LB_k) * k + area(RB_k) * (n - k)`.
    fn split(&self, children: &[RChild<T>]) -> (RChildren<T>, RChildren<T>) {
        let n = children.len();
        let min = self.min_children;
        let mut best: RBestSplit<T> = None;
        for axis in 0..2 {
            let mut v = children.to_owned();
            let key = |c: &RChild<T>| {
                let b = self.child_bbox(c);
                if axis == 0 { centroid_x(&b) } else { centroid_y(&b) }
            };
            v.sort_by(|a, b| cmp_scalar(key(a), key(b)));

            let mut prefix: Vec<Aabb2D<T>> = Vec::with_capacity(n);
            for c in &v {
                let bb = self.child_bbox(c);
                let acc = prefix.last().map_or(bb, |&p| union_aabb(p, bb));
                prefix.push(acc);
            }
            let mut suffix: Vec<Aabb2D<T>> = Vec::with_capacity(n);
            for c in v.iter().rev() {
                let bb = self.child_bbox(c);
                let acc = suffix.last().map_or(bb, |&p| union_aabb(bb, p));
                suffix.push(acc);
            }
            suffix.reverse();

            for k in min..=(n - min) {
                let cost = area(&prefix[k - 1]) * T::acc_from_usize(k)
                    + area(&suffix[k]) * T::acc_from_usize(n - k);
                if best.as_ref().is_none_or(|(bc, _, _)| cost < *bc) {
                    best = Some((cost, v[..k].to_vec(), v[k..].to_vec()));
                }
            }
        }
        match best {
            Some((_, l, r)) => (l, r),
            // Only reachable with a fan-out too small to partition; halve instead.
            None => {
                let mid = n / 2;
                (children[..mid].to_vec(), children[mid..].to_vec())
            }
        }
    }

    /// Insert below `node`; returns a new right sibling when `node` overflowed and split.
    fn insert_below(&mut self, node: NodeIdx, slot: usize, bbox: Aabb2D<T>) -> Option<NodeIdx> {
        let i = node.get();
        self.arena[i].bbox = union_aabb(self.arena[i].bbox, bbox);
        if self.arena[i].leaf {
            self.arena[i].children.push(RChild::Item { slot, bbox });
        } else {
            let pick = self.choose_child(&self.arena[i].children, &bbox);
            let RChild::Node(child) = self.arena[i].children[pick] else {
                unreachable!("internal nodes only hold nodes");
            };
            if let Some(right) = self.insert_below(child, slot, bbox) {
                self.arena[i].children.insert(pick + 1, RChild::Node(right));
            }
        }
        if self.arena[i].children.len() <= self.max_children {
            return None;
        }
        let children = core::mem::take(&mut self.arena[i].children);
        let (left, right) = self.split(&children);
        let leaf = self.arena[i].leaf;
        let l_bbox = self.children_bbox(&left);
        let r_bbox = self.children_bbox(&right);
        self.arena[i].children = left;
        self.arena[i].bbox = l_bbox;
        Some(self.alloc(RNode {
            bbox: r_bbox,
            leaf,
            children: right,
        }))
    }

    /// Remove `slot` from the subtree at `node`, pruning emptied children.
    fn remove_below(&mut self, node: NodeIdx, slot: usize, old: &Aabb2D<T>) -> bool {
        let i = node.get();
        if !self.arena[i].bbox.intersects(old) {
            return false;
        }
        let removed = if self.arena[i].leaf {
            let before = self.arena[i].children.len();
            self.arena[i]
                .children
                .retain(|c| !matches!(c, RChild::Item { slot: s, .. } if *s == slot));
            self.arena[i].children.len() != before
        } else {
            let kids: Vec<NodeIdx> = self.arena[i]
                .children
                .iter()
                .filter_map(|c| match c {
                    RChild::Node(n) => Some(*n),
                    RChild::Item { .. } => None,
                })
                .collect();
            let mut hit = None;
            for k in kids {
                if self.remove_below(k, slot, old) {
                    hit = Some(k);
                    break;
                }
            }
            if let Some(k) = hit
                && self.arena[k.get()].children.is_empty()
            {
                self.arena[i]
                    .children
                    .retain(|c| !matches!(c, RChild::Node(n) if *n == k));
                self.free_nodes.push(k);
            }
            hit.is_some()
        };
        if removed && !self.arena[i].children.is_empty() {
            let bb = self.children_bbox(&self.arena[i].children);
            self.arena[i].bbox = bb;
        }
        removed
    }

    fn query_with<'a>(
        &'a self,
        probe: Aabb2D<T>,
    ) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return Box::new(out.into_iter());
        };
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            let node = &self.arena[n.get()];
            if !node.bbox.intersects(&probe) {
                continue;
            }
            for c in &node.children {
                match c {
                    RChild::Node(ci) => stack.push(*ci),
                    RChild::Item { slot, bbox } if bbox.intersects(&probe) => out.push(*slot),
                    RChild::Item { .. } => {}
                }
            }
        }
        Box::new(out.into_iter())
    }
}

/// Number of vertical slices for an STR pass: `ceil(sqrt(parents))`.
fn slice_count(parents: usize) -> usize {
    let mut s = 1_usize;
    while s * s < parents {
        s += 1;
    }
    s
}

impl<T: Scalar, P: Copy + Debug> Backend<T, P> for RTree<T, P> {
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>) {
        debug_assert!(
            self.slots.get(slot).is_none_or(|s| s.is_none()),
            "slot {slot} inserted twice"
        );
        self.set_slot(slot, Some(aabb));
        match self.root {
            None => {
                let root = self.alloc(RNode {
                    bbox: aabb,
                    leaf: true,
                    children: vec![RChild::Item { slot, bbox: aabb }],
                });
                self.root = Some(root);
            }
            Some(root) => {
                if let Some(right) = self.insert_below(root, slot, aabb) {
                    let bbox =
                        union_aabb(self.arena[root.get()].bbox, self.arena[right.get()].bbox);
                    let new_root = self.alloc(RNode {
                        bbox,
                        leaf: false,
                        children: vec![RChild::Node(root), RChild::Node(right)],
                    });
                    self.root = Some(new_root);
                }
            }
        }
    }

    fn remove(&mut self, slot: usize) -> bool {
        let Some(old) = self.slots.get(slot).copied().flatten() else {
            return false;
        };
        self.set_slot(slot, None);
        let Some(root) = self.root else {
            return false;
        };
        let removed = self.remove_below(root, slot, &old);
        debug_assert!(removed, "slot {slot} tracked but missing from the tree");
        if self.arena[root.get()].children.is_empty() {
            self.root = None;
            self.arena.clear();
            self.free_nodes.clear();
        } else if !self.arena[root.get()].leaf && self.arena[root.get()].children.len() == 1 {
            // Collapse a root with a single child node.
            if let RChild::Node(only) = self.arena[root.get()].children[0] {
                self.free_nodes.push(root);
                self.root = Some(only);
            }
        }
        removed
    }

    fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
        self.free_nodes.clear();
        self.slots.clear();
    }

    fn query_point<'a>(&'a self, x: T, y: T) -> Box<dyn Iterator<Item = usize> + 'a> {
        self.query_with(Aabb2D::new(x, y, x, y))
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<T>) -> Box<dyn Iterator<Item = usize> + 'a> {
        self.query_with(rect)
    }
}

impl<T: Scalar, P: Copy + Debug> Debug for RTree<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RTree")
            .field("max_children", &self.max_children)
            .field("min_children", &self.min_children)
            .field("arena_nodes", &self.arena.len())
            .field("free_nodes", &self.free_nodes.len())
            .field("alive", &self.len())
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}

/// R-tree with f32 coordinates and f64 metrics.
pub type RTreeF32<P> = RTree<f32, P>;

/// R-tree with f64 coordinates and f64 metrics.
pub type RTreeF64<P> = RTree<f64, P>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(it: Box<dyn Iterator<Item = usize> + '_>) -> Vec<usize> {
        let mut v: Vec<_> = it.collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn insert_query_and_split() {
        let mut t: RTree<f64, ()> = RTree::default();
        for i in 0..40 {
            let x = (i % 8) as f64 * 20.0;
            let y = (i / 8) as f64 * 20.0;
            t.insert(i, Aabb2D::<f64>::from_xywh(x, y, 10.0, 10.0));
        }
        assert!(t.arena.len() > 1, "40 items must have split the root leaf");
        assert_eq!(sorted(t.query_point(25.0, 25.0)), vec![9]);
        assert_eq!(
            sorted(t.query_rect(Aabb2D::new(0.0, 0.0, 30.0, 10.0))),
            vec![0, 1]
        );
    }

    #[test]
    fn remove_then_reinsert_moves_item() {
        let mut t: RTree<f64, ()> = RTree::default();
        t.insert(0, Aabb2D::new(0.0, 0.0, 10.0, 10.0));
        t.insert(1, Aabb2D::new(12.0, 0.0, 22.0, 10.0));
        assert!(t.remove(0));
        t.insert(0, Aabb2D::new(100.0, 100.0, 110.0, 110.0));
        assert!(sorted(t.query_point(5.0, 5.0)).is_empty());
        assert_eq!(sorted(t.query_point(105.0, 105.0)), vec![0]);
        assert_eq!(sorted(t.query_point(15.0, 5.0)), vec![1]);
    }

    #[test]
    fn remove_unknown_slot_is_reported() {
        let mut t: RTree<f64, ()> = RTree::default();
        assert!(!t.remove(3));
        t.insert(3, Aabb2D::new(0.0, 0.0, 1.0, 1.0));
        assert!(t.remove(3));
        assert!(!t.remove(3));
        assert!(t.is_empty());
    }

    #[test]
    fn churn_recycles_arena_nodes() {
        let mut t: RTree<f64, ()> = RTree::default();
        for i in 0..64 {
            t.insert(i, Aabb2D::<f64>::from_xywh(i as f64 * 3.0, 0.0, 2.0, 2.0));
        }
        for round in 0..50 {
            for i in 0..64 {
                assert!(t.remove(i));
                let x = i as f64 * 3.0 + round as f64;
                t.insert(i, Aabb2D::<f64>::from_xywh(x, 0.0, 2.0, 2.0));
            }
        }
        assert_eq!(t.len(), 64);
        assert!(t.arena.len() < 64 * 4, "arena grew to {}", t.arena.len());
    }

    #[test]
    fn bulk_build_matches_incremental() {
        let pairs: Vec<_> = (0..100)
            .map(|i| {
                let x = (i % 10) as f64 * 10.0;
                let y = (i / 10) as f64 * 10.0;
                (i, Aabb2D::<f64>::from_xywh(x, y, 8.0, 8.0))
            })
            .collect();
        let bulk: RTree<f64, ()> = RTree::bulk_build(&pairs);
        let mut inc: RTree<f64, ()> = RTree::default();
        for (slot, bb) in pairs.iter().copied() {
            inc.insert(slot, bb);
        }
        let q = Aabb2D::new(15.0, 15.0, 42.0, 33.0);
        assert_eq!(sorted(bulk.query_rect(q)), sorted(inc.query_rect(q)));
        assert_eq!(bulk.len(), 100);
    }
}
