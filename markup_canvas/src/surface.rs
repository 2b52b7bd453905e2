// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The surface: owns drawables, the transform, the spatial index, and z-order.

use std::collections::HashMap;

use kurbo::{Point, Rect, Vec2};
use markup_index::{Aabb2D, Index, Key};

use crate::error::Error;
use crate::group::Group;
use crate::render::RenderContext;
use crate::shape::Shape;
use crate::style::{Style, StylePatch};
use crate::transform::AxisTransform;
use crate::types::{DrawableFlags, DrawableId};

/// Default pick distance in screen pixels.
pub const DEFAULT_HIT_THRESHOLD: f64 = 2.0;

/// A top-level item on a [`Surface`].
#[derive(Debug)]
pub enum Drawable {
    /// A single shape.
    Shape(Shape),
    /// A group of shapes that behaves as one.
    Group(Group),
}

impl From<Shape> for Drawable {
    fn from(s: Shape) -> Self {
        Self::Shape(s)
    }
}

impl From<Group> for Drawable {
    fn from(g: Group) -> Self {
        Self::Group(g)
    }
}

impl Drawable {
    /// Identifier of the shape or group.
    pub fn id(&self) -> &str {
        match self {
            Self::Shape(s) => s.id(),
            Self::Group(g) => g.id(),
        }
    }

    /// Screen-space bounds.
    pub fn bbox(&self) -> Aabb2D<f64> {
        match self {
            Self::Shape(s) => s.bbox(),
            Self::Group(g) => g.bbox(),
        }
    }

    /// Screen-space bounds as a kurbo rect.
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Shape(s) => s.bounds(),
            Self::Group(g) => g.bounds(),
        }
    }

    /// The shape itself, or the group's members.
    pub fn shapes(&self) -> &[Shape] {
        match self {
            Self::Shape(s) => core::slice::from_ref(s),
            Self::Group(g) => g.shapes(),
        }
    }

    /// Bounds grown by the pick slop.
    pub fn index_box(&self, threshold: f64) -> Aabb2D<f64> {
        match self {
            Self::Shape(s) => s.index_box(threshold),
            Self::Group(g) => g.index_box(threshold),
        }
    }

    /// Recompute screen geometry.
    pub fn project(&mut self, transform: &AxisTransform) {
        match self {
            Self::Shape(s) => s.project(transform),
            Self::Group(g) => g.project(transform),
        }
    }

    /// Precise pick test.
    pub fn is_under_cursor(&self, p: Point, threshold: f64) -> bool {
        match self {
            Self::Shape(s) => s.is_under_cursor(p, threshold),
            Self::Group(g) => g.is_under_cursor(p, threshold),
        }
    }

    /// Translate in world space.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Self::Shape(s) => s.translate(delta),
            Self::Group(g) => g.translate(delta),
        }
    }

    /// Replace the style of every shape.
    pub fn set_style(&mut self, style: Style) {
        match self {
            Self::Shape(s) => s.set_style(style),
            Self::Group(g) => g.set_style(style),
        }
    }

    /// Shallow-merge a patch into every shape's style.
    pub fn update_style(&mut self, patch: &StylePatch) {
        match self {
            Self::Shape(s) => s.update_style(patch),
            Self::Group(g) => g.update_style(patch),
        }
    }

    /// Paint into `ctx`.
    pub fn render(&self, ctx: &mut dyn RenderContext) {
        match self {
            Self::Shape(s) => s.render(ctx),
            Self::Group(g) => g.render(ctx),
        }
    }

    /// Deep copy under a new id. Group listeners are not copied.
    pub fn duplicate(&self, id: impl Into<String>) -> Self {
        match self {
            Self::Shape(s) => Self::Shape(s.clone().with_id(id)),
            Self::Group(g) => Self::Group(g.duplicate(id)),
        }
    }

    /// The shape, if this is one.
    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Self::Shape(s) => Some(s),
            Self::Group(_) => None,
        }
    }

    /// The shape, mutably.
    pub fn as_shape_mut(&mut self) -> Option<&mut Shape> {
        match self {
            Self::Shape(s) => Some(s),
            Self::Group(_) => None,
        }
    }

    /// The group, if this is one.
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Self::Group(g) => Some(g),
            Self::Shape(_) => None,
        }
    }

    /// The group, mutably.
    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Self::Group(g) => Some(g),
            Self::Shape(_) => None,
        }
    }
}

/// Screen regions touched since the last [`Surface::flush`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Damage {
    /// Old and new bounds of every drawable that changed, appeared, or went away.
    pub dirty_rects: Vec<Rect>,
    /// Number of index entries moved.
    pub reindexed: usize,
}

impl Damage {
    /// Union of all dirty rects.
    pub fn union_rect(&self) -> Option<Rect> {
        self.dirty_rects.iter().copied().reduce(|a, b| a.union(b))
    }

    /// Whether nothing needs repainting.
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty()
    }

    fn push(&mut self, r: Rect) {
        if r.is_finite() {
            self.dirty_rects.push(r);
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    name: String,
    drawable: Drawable,
    flags: DrawableFlags,
    z: u64,
    key: Key,
    dirty: bool,
}

/// Owner of every top-level drawable.
///
/// - Transform changes ([`pan`](Self::pan), [`zoom_at`](Self::zoom_at),
///   [`set_transform`](Self::set_transform)) reproject and reindex everything immediately.
/// - Edits through [`get_mut`](Self::get_mut) or [`update`](Self::update) mark the drawable
///   dirty; the index catches up on the next [`flush`](Self::flush), once per drawable no matter
///   how many edits happened in between.
/// - Z-order is insertion order; [`bring_to_front`](Self::bring_to_front) moves a drawable to
///   the top.
///
/// Hit queries read the index, so call `flush` after edits and before picking.
pub struct Surface {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    names: HashMap<String, DrawableId>,
    index: Index<f64, DrawableId>,
    transform: AxisTransform,
    threshold: f64,
    next_z: u64,
    dirty: Vec<DrawableId>,
    damage: Damage,
}

impl core::fmt::Debug for Surface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Surface")
            .field("alive", &self.names.len())
            .field("free_list", &self.free_list.len())
            .field("transform", &self.transform)
            .field("threshold", &self.threshold)
            .field("dirty", &self.dirty.len())
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(AxisTransform::IDENTITY)
    }
}

impl Surface {
    /// An empty surface.
    pub fn new(transform: AxisTransform) -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            names: HashMap::new(),
            index: Index::new(),
            transform,
            threshold: DEFAULT_HIT_THRESHOLD,
            next_z: 0,
            dirty: Vec::new(),
            damage: Damage::default(),
        }
    }

    /// Set the pick distance used by hit queries and index boxes.
    #[must_use]
    pub fn with_hit_threshold(mut self, threshold: f64) -> Self {
        self.set_hit_threshold(threshold);
        self
    }

    /// Pick distance in screen pixels.
    pub fn hit_threshold(&self) -> f64 {
        self.threshold
    }

    /// Change the pick distance; every index box is refreshed.
    pub fn set_hit_threshold(&mut self, threshold: f64) {
        if !(threshold.is_finite() && threshold >= 0.0) {
            log::warn!("ignoring hit threshold {threshold}");
            return;
        }
        if threshold != self.threshold {
            self.threshold = threshold;
            self.reproject_all();
        }
    }

    /// Number of live drawables.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the surface holds nothing.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `id` refers to a live drawable.
    pub fn is_alive(&self, id: DrawableId) -> bool {
        self.slot(id).is_some()
    }

    /// Look up a drawable by its shape or group id.
    pub fn find(&self, name: &str) -> Option<DrawableId> {
        self.names.get(name).copied()
    }

    /// Add a drawable on top of everything else.
    ///
    /// It is projected with the current transform and indexed right away.
    pub fn insert(&mut self, drawable: impl Into<Drawable>) -> Result<DrawableId, Error> {
        let mut drawable = drawable.into();
        let name = drawable.id().to_owned();
        if self.names.contains_key(&name) {
            return Err(Error::DuplicateId(name));
        }
        drawable.project(&self.transform);
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            // Slots at the last generation are retired, never freed.
            let generation = self.generations[idx] + 1;
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.slots.push(None);
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "DrawableId uses 32-bit indices by design."
        )]
        let id = DrawableId::new(idx as u32, generation);
        let key = self.index.insert(drawable.index_box(self.threshold), id);
        self.damage.push(drawable.bounds());
        let z = self.bump_z();
        self.slots[idx] = Some(Slot {
            generation,
            name: name.clone(),
            drawable,
            flags: DrawableFlags::default(),
            z,
            key,
            dirty: false,
        });
        self.names.insert(name, id);
        log::trace!("inserted {id:?} at z={z}");
        Ok(id)
    }

    /// Remove a drawable. Returns it, or `None` if `id` is stale.
    pub fn remove(&mut self, id: DrawableId) -> Option<Drawable> {
        self.slot(id)?;
        let slot = self.slots[id.idx()].take()?;
        if self.index.remove(slot.key).is_none() {
            self.report_corruption(id, "missing index entry on remove");
        }
        self.names.remove(&slot.name);
        self.release(id.idx());
        self.damage.push(slot.drawable.bounds());
        Some(slot.drawable)
    }

    /// Remove everything. Outstanding ids become stale.
    pub fn clear(&mut self) {
        for idx in 0..self.slots.len() {
            if let Some(slot) = self.slots[idx].take() {
                self.damage.push(slot.drawable.bounds());
                self.release(idx);
            }
        }
        self.names.clear();
        self.dirty.clear();
        self.index.clear();
    }

    /// Shared access to a drawable.
    pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.slot(id).map(|s| &s.drawable)
    }

    /// Mutable access to a drawable; marks it for reindexing on the next flush.
    pub fn get_mut(&mut self, id: DrawableId) -> Option<&mut Drawable> {
        self.mark_dirty(id);
        self.slot_mut(id).map(|s| &mut s.drawable)
    }

    /// Edit a drawable in place; marks it for reindexing on the next flush.
    pub fn update<R>(&mut self, id: DrawableId, f: impl FnOnce(&mut Drawable) -> R) -> Option<R> {
        self.get_mut(id).map(f)
    }

    /// Swap in new content for `id`, keeping its handle and z position.
    ///
    /// The replacement is projected and reindexed before this returns, so no query or render
    /// ever observes a mix of old and new.
    pub fn replace(
        &mut self,
        id: DrawableId,
        drawable: impl Into<Drawable>,
    ) -> Result<Drawable, Error> {
        let mut drawable = drawable.into();
        let Some(slot) = self.slot(id) else {
            return Err(Error::UnknownDrawable(id));
        };
        let name = drawable.id().to_owned();
        if name != slot.name && self.names.contains_key(&name) {
            return Err(Error::DuplicateId(name));
        }
        drawable.project(&self.transform);
        let index_box = drawable.index_box(self.threshold);
        let new_bounds = drawable.bounds();
        let Some(slot) = self.slot_mut(id) else {
            return Err(Error::UnknownDrawable(id));
        };
        let old = core::mem::replace(&mut slot.drawable, drawable);
        let old_name = core::mem::replace(&mut slot.name, name.clone());
        slot.dirty = false;
        let key = slot.key;
        self.dirty.retain(|d| *d != id);
        if old_name != name {
            self.names.remove(&old_name);
            self.names.insert(name, id);
        }
        self.reindex(id, key, index_box);
        self.damage.push(old.bounds());
        self.damage.push(new_bounds);
        Ok(old)
    }

    /// Current flags, or `None` for a stale id.
    pub fn flags(&self, id: DrawableId) -> Option<DrawableFlags> {
        self.slot(id).map(|s| s.flags)
    }

    /// Replace the flags. Returns `false` for a stale id.
    pub fn set_flags(&mut self, id: DrawableId, flags: DrawableFlags) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        if slot.flags != flags {
            slot.flags = flags;
            let bounds = slot.drawable.bounds();
            self.damage.push(bounds);
        }
        true
    }

    /// Paint order position; higher is on top.
    pub fn z(&self, id: DrawableId) -> Option<u64> {
        self.slot(id).map(|s| s.z)
    }

    /// Move a drawable above everything else.
    pub fn bring_to_front(&mut self, id: DrawableId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let z = self.bump_z();
        if let Some(slot) = self.slot_mut(id) {
            slot.z = z;
            let bounds = slot.drawable.bounds();
            self.damage.push(bounds);
        }
        true
    }

    /// Live drawables from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = (DrawableId, &Drawable)> {
        let mut live: Vec<(u64, DrawableId, &Drawable)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let s = s.as_ref()?;
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "DrawableId uses 32-bit indices by design."
                )]
                let id = DrawableId::new(i as u32, s.generation);
                Some((s.z, id, &s.drawable))
            })
            .collect();
        live.sort_unstable_by_key(|(z, ..)| *z);
        live.into_iter().map(|(_, id, d)| (id, d))
    }

    /// The world/screen transform.
    pub fn transform(&self) -> &AxisTransform {
        &self.transform
    }

    /// Replace the transform; everything is reprojected if it changed.
    pub fn set_transform(&mut self, transform: AxisTransform) -> bool {
        if transform == self.transform {
            return false;
        }
        self.transform = transform;
        self.reproject_all();
        true
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) -> bool {
        let changed = self.transform.pan(delta);
        if changed {
            self.reproject_all();
        }
        changed
    }

    /// Zoom about a screen-space focal point.
    pub fn zoom_at(&mut self, focal: Point, factor: f64) -> bool {
        let changed = self.transform.zoom_at(focal, factor);
        if changed {
            self.reproject_all();
        }
        changed
    }

    /// Whether edits are waiting for [`flush`](Self::flush).
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Bring the index up to date and return the damage accumulated since the last flush.
    pub fn flush(&mut self) -> Damage {
        self.sync_dirty();
        core::mem::take(&mut self.damage)
    }

    /// Rebuild the spatial index in one bulk pass over every live drawable.
    ///
    /// Pending edits are applied first. Cheaper than per-drawable inserts after a whole
    /// sample has been loaded. Damage is kept for the next [`flush`](Self::flush).
    pub fn rebuild_index(&mut self) {
        self.sync_dirty();
        let threshold = self.threshold;
        let mut live = Vec::with_capacity(self.names.len());
        let mut entries = Vec::with_capacity(self.names.len());
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot else {
                continue;
            };
            #[allow(
                clippy::cast_possible_truncation,
                reason = "DrawableId uses 32-bit indices by design."
            )]
            let id = DrawableId::new(i as u32, slot.generation);
            live.push(i);
            entries.push((slot.drawable.index_box(threshold), id));
        }
        let keys = self.index.rebuild(&entries);
        for (i, key) in live.into_iter().zip(keys) {
            if let Some(slot) = self.slots[i].as_mut() {
                slot.key = key;
            }
        }
        self.damage.reindexed += entries.len();
        log::debug!("rebuilt spatial index with {} entries", entries.len());
    }

    fn sync_dirty(&mut self) {
        let transform = self.transform;
        let threshold = self.threshold;
        for id in core::mem::take(&mut self.dirty) {
            let Some(slot) = self.slot_mut(id) else {
                continue;
            };
            if !slot.dirty {
                continue;
            }
            slot.dirty = false;
            let old_bounds = slot.drawable.bounds();
            slot.drawable.project(&transform);
            let new_bounds = slot.drawable.bounds();
            let index_box = slot.drawable.index_box(threshold);
            let key = slot.key;
            let renamed = (slot.drawable.id() != slot.name)
                .then(|| (slot.name.clone(), slot.drawable.id().to_owned()));
            self.reindex(id, key, index_box);
            if old_bounds != new_bounds {
                self.damage.push(old_bounds);
            }
            self.damage.push(new_bounds);
            if let Some((old, new)) = renamed {
                self.rename(id, old, new);
            }
        }
    }

    /// Index candidates at a screen point, unfiltered and unordered.
    pub fn candidates_at(&self, p: Point) -> Vec<DrawableId> {
        self.index.query_point(p.x, p.y).map(|c| c.payload).collect()
    }

    /// Every visible, pickable drawable under `p`, topmost first.
    pub fn hits_at(&self, p: Point) -> Vec<DrawableId> {
        let needed = DrawableFlags::VISIBLE | DrawableFlags::PICKABLE;
        let mut hits: Vec<(u64, DrawableId)> = self
            .index
            .query_point(p.x, p.y)
            .filter_map(|c| {
                let slot = self.slot(c.payload)?;
                (slot.flags.contains(needed) && slot.drawable.is_under_cursor(p, self.threshold))
                    .then_some((slot.z, c.payload))
            })
            .collect();
        hits.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        hits.into_iter().map(|(_, id)| id).collect()
    }

    /// The topmost visible, pickable drawable under `p`.
    pub fn hit_test(&self, p: Point) -> Option<DrawableId> {
        self.hits_at(p).into_iter().next()
    }

    /// Visible drawables whose bounds intersect `rect` (screen space), bottom to top.
    pub fn intersect_rect(&self, rect: Rect) -> Vec<DrawableId> {
        let q = Aabb2D::new(rect.x0, rect.y0, rect.x1, rect.y1);
        let mut out: Vec<(u64, DrawableId)> = self
            .index
            .query_rect(q)
            .filter_map(|c| {
                let slot = self.slot(c.payload)?;
                (slot.flags.contains(DrawableFlags::VISIBLE) && slot.drawable.bbox().intersects(&q))
                    .then_some((slot.z, c.payload))
            })
            .collect();
        out.sort_unstable_by_key(|(z, _)| *z);
        out.into_iter().map(|(_, id)| id).collect()
    }

    /// Paint visible drawables bottom to top.
    pub fn render(&self, ctx: Option<&mut dyn RenderContext>) -> Result<(), Error> {
        let Some(ctx) = ctx else {
            return Err(Error::NoRenderContext);
        };
        for (id, drawable) in self.iter() {
            if self
                .flags(id)
                .is_some_and(|f| f.contains(DrawableFlags::VISIBLE))
            {
                drawable.render(ctx);
            }
        }
        Ok(())
    }

    // --- internals ---

    fn slot(&self, id: DrawableId) -> Option<&Slot> {
        self.slots
            .get(id.idx())?
            .as_ref()
            .filter(|s| s.generation == id.1)
    }

    fn slot_mut(&mut self, id: DrawableId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.idx())?
            .as_mut()
            .filter(|s| s.generation == id.1)
    }

    fn mark_dirty(&mut self, id: DrawableId) {
        if let Some(slot) = self.slot_mut(id) {
            if !slot.dirty {
                slot.dirty = true;
                self.dirty.push(id);
            }
        }
    }

    fn release(&mut self, idx: usize) {
        if self.generations[idx] == u32::MAX {
            log::debug!("retiring drawable slot {idx}");
        } else {
            self.free_list.push(idx);
        }
    }

    fn bump_z(&mut self) -> u64 {
        let z = self.next_z;
        self.next_z += 1;
        z
    }

    fn reindex(&mut self, id: DrawableId, key: Key, index_box: Aabb2D<f64>) {
        if self.index.reindex(key, index_box) {
            self.damage.reindexed += 1;
        } else {
            self.report_corruption(id, "missing index entry on reindex");
        }
    }

    fn rename(&mut self, id: DrawableId, old: String, new: String) {
        if self.names.get(&new).is_some_and(|other| *other != id) {
            log::warn!("drawable {id:?} renamed to `{new}`, which is taken; keeping `{old}`");
            return;
        }
        self.names.remove(&old);
        self.names.insert(new.clone(), id);
        if let Some(slot) = self.slot_mut(id) {
            slot.name = new;
        }
    }

    fn reproject_all(&mut self) {
        let transform = self.transform;
        let threshold = self.threshold;
        let mut moves = Vec::with_capacity(self.names.len());
        // Everything moves, so all damage collapses into one rect.
        let mut area = self.damage.union_rect();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let Some(slot) = slot else {
                continue;
            };
            let old_bounds = slot.drawable.bounds();
            slot.drawable.project(&transform);
            slot.dirty = false;
            for r in [old_bounds, slot.drawable.bounds()] {
                if r.is_finite() {
                    area = Some(area.map_or(r, |a| a.union(r)));
                }
            }
            #[allow(
                clippy::cast_possible_truncation,
                reason = "DrawableId uses 32-bit indices by design."
            )]
            let id = DrawableId::new(i as u32, slot.generation);
            moves.push((id, slot.key, slot.drawable.index_box(threshold)));
        }
        self.dirty.clear();
        self.damage.dirty_rects.clear();
        if let Some(area) = area {
            self.damage.push(area);
        }
        for (id, key, index_box) in moves {
            self.reindex(id, key, index_box);
        }
    }

    fn report_corruption(&self, id: DrawableId, what: &str) {
        log::error!("spatial index out of sync for {id:?}: {what}");
        debug_assert!(false, "spatial index out of sync for {id:?}: {what}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DisplayList;

    fn line(id: &str, a: (f64, f64), b: (f64, f64)) -> Shape {
        Shape::line(id, a.into(), b.into(), Style::default()).unwrap()
    }

    fn rect(id: &str, a: (f64, f64), b: (f64, f64)) -> Shape {
        Shape::rect(id, a.into(), b.into(), Style::default()).unwrap()
    }

    #[test]
    fn insert_and_hit_topmost() {
        let mut s = Surface::default();
        let a = s.insert(rect("a", (0.0, 0.0), (50.0, 50.0))).unwrap();
        let b = s.insert(rect("b", (25.0, 25.0), (75.0, 75.0))).unwrap();
        assert_eq!(s.hit_test(Point::new(30.0, 30.0)), Some(b));
        assert_eq!(s.hits_at(Point::new(30.0, 30.0)), vec![b, a]);
        assert_eq!(s.hit_test(Point::new(10.0, 10.0)), Some(a));
        assert!(s.bring_to_front(a));
        assert_eq!(s.hit_test(Point::new(30.0, 30.0)), Some(a));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut s = Surface::default();
        s.insert(line("x", (0.0, 0.0), (1.0, 1.0))).unwrap();
        let err = s.insert(line("x", (5.0, 5.0), (6.0, 6.0))).unwrap_err();
        assert_eq!(err, Error::DuplicateId("x".into()));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn removed_ids_go_stale() {
        let mut s = Surface::default();
        let a = s.insert(line("a", (0.0, 0.0), (10.0, 0.0))).unwrap();
        assert!(s.remove(a).is_some());
        assert!(!s.is_alive(a));
        assert!(s.remove(a).is_none());
        assert!(s.candidates_at(Point::new(5.0, 0.0)).is_empty());
        let b = s.insert(line("a", (0.0, 0.0), (10.0, 0.0))).unwrap();
        assert_ne!(a, b, "reused slot must bump the generation");
        assert_eq!(s.find("a"), Some(b));
    }

    #[test]
    fn flush_reindexes_each_dirty_drawable_once() {
        let mut s = Surface::default();
        let a = s.insert(line("a", (0.0, 0.0), (10.0, 0.0))).unwrap();
        let _ = s.flush();
        for x in [20.0, 30.0, 40.0] {
            s.update(a, |d| {
                d.as_shape_mut()
                    .unwrap()
                    .set_coordinate(1, Point::new(x, 0.0))
                    .unwrap();
            });
        }
        assert!(s.is_dirty());
        let dmg = s.flush();
        assert_eq!(dmg.reindexed, 1);
        assert!(dmg.union_rect().is_some());
        assert!(!s.is_dirty());
        assert_eq!(s.hit_test(Point::new(35.0, 0.0)), Some(a));
        assert_eq!(s.flush(), Damage::default());
    }

    #[test]
    fn zoom_reprojects_and_reindexes() {
        let mut s = Surface::default();
        let p = s
            .insert(Shape::point("p", Point::new(10.0, 10.0), Style::default()).unwrap())
            .unwrap();
        assert!(s.zoom_at(Point::ZERO, 2.0));
        let shape = s.get(p).and_then(Drawable::as_shape).unwrap();
        assert_eq!(shape.dynamic_coordinate(), &[Point::new(20.0, 20.0)]);
        assert_eq!(s.hit_test(Point::new(21.0, 21.0)), Some(p));
        assert_eq!(s.hit_test(Point::new(30.0, 30.0)), None);
        assert!(s.pan(Vec2::new(100.0, 0.0)));
        assert_eq!(s.hit_test(Point::new(121.0, 21.0)), Some(p));
    }

    #[test]
    fn hidden_and_unpickable_are_skipped() {
        let mut s = Surface::default();
        let a = s.insert(rect("a", (0.0, 0.0), (10.0, 10.0))).unwrap();
        s.set_flags(a, DrawableFlags::VISIBLE);
        assert_eq!(s.hit_test(Point::new(5.0, 5.0)), None);
        s.set_flags(a, DrawableFlags::empty());
        let mut dl = DisplayList::new();
        s.render(Some(&mut dl)).unwrap();
        assert!(dl.is_empty());
        assert!(s.intersect_rect(Rect::new(0.0, 0.0, 100.0, 100.0)).is_empty());
    }

    #[test]
    fn render_requires_context_and_respects_z() {
        let mut s = Surface::default();
        s.insert(line("bottom", (0.0, 0.0), (1.0, 0.0))).unwrap();
        let top = s.insert(line("top", (0.0, 5.0), (1.0, 5.0))).unwrap();
        assert_eq!(s.render(None), Err(Error::NoRenderContext));
        let first = s.find("bottom").unwrap();
        s.bring_to_front(first);
        let order: Vec<_> = s.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![top, first]);
    }

    #[test]
    fn replace_swaps_atomically() {
        let mut s = Surface::default();
        let a = s.insert(line("a", (0.0, 0.0), (10.0, 0.0))).unwrap();
        let z = s.z(a);
        let old = s.replace(a, rect("a", (100.0, 100.0), (110.0, 110.0))).unwrap();
        assert_eq!(old.id(), "a");
        assert_eq!(s.z(a), z);
        assert_eq!(s.hit_test(Point::new(5.0, 0.0)), None);
        assert_eq!(s.hit_test(Point::new(105.0, 105.0)), Some(a));
        s.insert(line("b", (0.0, 0.0), (1.0, 1.0))).unwrap();
        assert!(matches!(
            s.replace(a, line("b", (0.0, 0.0), (1.0, 1.0))),
            Err(Error::DuplicateId(_))
        ));
    }

    #[test]
    fn groups_pick_through_any_member() {
        let mut s = Surface::default();
        let g = Group::new(
            "poly",
            vec![
                line("poly-0", (0.0, 0.0), (10.0, 0.0)),
                line("poly-1", (10.0, 0.0), (10.0, 10.0)),
            ],
        )
        .unwrap();
        let id = s.insert(g).unwrap();
        assert_eq!(s.hit_test(Point::new(11.0, 5.0)), Some(id));
        assert_eq!(s.hit_test(Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn index_agrees_with_brute_force() {
        struct Rng(u64);
        impl Rng {
            fn next_f64(&mut self, max: f64) -> f64 {
                self.0 ^= self.0 << 13;
                self.0 ^= self.0 >> 7;
                self.0 ^= self.0 << 17;
                (self.0 % 10_000) as f64 / 10_000.0 * max
            }
        }
        let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
        let mut s = Surface::default();
        for i in 0..200 {
            let a = (rng.next_f64(500.0), rng.next_f64(500.0));
            let b = (a.0 + rng.next_f64(40.0), a.1 + rng.next_f64(40.0));
            s.insert(line(&format!("l{i}"), a, b)).unwrap();
        }
        s.zoom_at(Point::new(250.0, 250.0), 1.7);
        s.pan(Vec2::new(-30.0, 12.0));
        for _ in 0..300 {
            let p = Point::new(rng.next_f64(900.0), rng.next_f64(900.0));
            let mut brute: Vec<_> = s
                .iter()
                .filter(|(_, d)| d.is_under_cursor(p, s.hit_threshold()))
                .map(|(id, _)| id)
                .collect();
            brute.reverse();
            assert_eq!(s.hits_at(p), brute);
        }
    }

    #[test]
    fn panning_without_flush_keeps_damage_bounded() {
        let mut s = Surface::default();
        s.insert(line("a", (0.0, 0.0), (10.0, 0.0))).unwrap();
        s.insert(line("b", (50.0, 50.0), (60.0, 50.0))).unwrap();
        s.insert(rect("c", (20.0, 20.0), (30.0, 30.0))).unwrap();
        for _ in 0..10 {
            assert!(s.pan(Vec2::new(1.0, 0.0)));
        }
        let dmg = s.flush();
        assert_eq!(dmg.dirty_rects.len(), 1);
        assert_eq!(dmg.reindexed, 30);
        let area = dmg.union_rect().unwrap();
        assert!(area.x0 <= 0.0 && area.x1 >= 70.0, "covers every old and new position");
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut s = Surface::default();
        let a = s.insert(line("a", (0.0, 0.0), (10.0, 0.0))).unwrap();
        s.remove(a).unwrap();
        s.generations[0] = u32::MAX - 1;
        let b = s.insert(line("b", (0.0, 0.0), (10.0, 0.0))).unwrap();
        assert_eq!(b, DrawableId::new(0, u32::MAX));
        s.remove(b).unwrap();
        let c = s.insert(line("c", (0.0, 0.0), (10.0, 0.0))).unwrap();
        assert_eq!(c.idx(), 1, "the exhausted slot is not reused");
        assert!(!s.is_alive(b));
        assert!(s.is_alive(c));
        s.clear();
        let d = s.insert(line("d", (0.0, 0.0), (10.0, 0.0))).unwrap();
        assert_eq!(d.idx(), 1);
    }

    #[test]
    fn bulk_rebuild_matches_incremental_index() {
        let mut s = Surface::default();
        let mut ids = Vec::new();
        for i in 0..40 {
            let x = f64::from(i) * 7.0;
            ids.push(s.insert(line(&format!("l{i}"), (x, 0.0), (x + 5.0, 9.0))).unwrap());
        }
        let probes: Vec<Point> = (0..60).map(|i| Point::new(f64::from(i) * 4.5, 4.0)).collect();
        let before: Vec<_> = probes.iter().map(|p| s.hits_at(*p)).collect();
        s.update(ids[3], |d| d.translate(Vec2::new(0.0, 100.0)));
        s.update(ids[3], |d| d.translate(Vec2::new(0.0, -100.0)));
        s.rebuild_index();
        assert!(!s.is_dirty());
        let after: Vec<_> = probes.iter().map(|p| s.hits_at(*p)).collect();
        assert_eq!(before, after);
        // Keys handed out by the rebuild stay usable.
        assert!(s.remove(ids[0]).is_some());
        s.update(ids[1], |d| d.translate(Vec2::new(500.0, 0.0)));
        assert_eq!(s.flush().reindexed, 42, "one pending edit, 40 from the rebuild, one move");
        assert_eq!(s.hit_test(Point::new(509.5, 4.5)), Some(ids[1]));
    }
}
