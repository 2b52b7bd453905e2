// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered collections of shapes that move, style, and pick as one.

use kurbo::{Point, Rect, Vec2};
use markup_index::Aabb2D;

use crate::bus::EventBus;
use crate::error::Error;
use crate::render::RenderContext;
use crate::shape::Shape;
use crate::style::{Style, StylePatch};
use crate::transform::AxisTransform;

/// Membership and geometry changes published by a [`Group`].
#[derive(Clone, Debug, PartialEq)]
pub enum GroupEvent {
    /// Shapes were appended, ids in insertion order.
    ShapesAdded(Vec<String>),
    /// Shapes were removed.
    ShapesRemoved(Vec<String>),
    /// A member's geometry or style was edited through [`Group::update`].
    ShapeChanged(String),
    /// A style patch was applied to every member.
    StyleChanged,
}

/// A non-empty, ordered list of shapes.
///
/// Insertion order is paint order. The group's bounds are the union of its members' bounds
/// and are kept current by every mutating method. Members share the group's transform.
#[derive(Debug)]
pub struct Group {
    id: String,
    shapes: Vec<Shape>,
    transform: AxisTransform,
    bbox: Aabb2D<f64>,
    events: EventBus<GroupEvent>,
}

impl Group {
    /// Build a group; fails if `shapes` is empty or member ids collide.
    pub fn new(id: impl Into<String>, shapes: Vec<Shape>) -> Result<Self, Error> {
        let id = id.into();
        if shapes.is_empty() {
            return Err(Error::geometry(&id, "a group needs at least one shape"));
        }
        let mut group = Self {
            id,
            shapes: Vec::with_capacity(shapes.len()),
            transform: AxisTransform::IDENTITY,
            bbox: Aabb2D::from_point(0.0, 0.0),
            events: EventBus::new(),
        };
        group.check_new_ids(&shapes)?;
        group.shapes = shapes;
        for s in &mut group.shapes {
            s.project(&AxisTransform::IDENTITY);
        }
        group.recompute_bbox();
        Ok(group)
    }

    /// Identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Union of member bounds, in screen space.
    pub fn bbox(&self) -> Aabb2D<f64> {
        self.bbox
    }

    /// [`bbox`](Self::bbox) as a kurbo rect.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.bbox.min_x, self.bbox.min_y, self.bbox.max_x, self.bbox.max_y)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Always `false` for a constructed group; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Members in paint order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Iterate members in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    /// Look up a member.
    pub fn get(&self, shape_id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == shape_id)
    }

    /// Whether a member with this id exists.
    pub fn contains(&self, shape_id: &str) -> bool {
        self.get(shape_id).is_some()
    }

    /// The transform members are projected with.
    pub fn transform(&self) -> &AxisTransform {
        &self.transform
    }

    /// Change notifications for this group.
    pub fn events(&self) -> &EventBus<GroupEvent> {
        &self.events
    }

    /// Subscribe or unsubscribe to change notifications.
    pub fn events_mut(&mut self) -> &mut EventBus<GroupEvent> {
        &mut self.events
    }

    /// Append shapes. All-or-nothing: a duplicate id rejects the whole batch.
    pub fn add(&mut self, shapes: impl IntoIterator<Item = Shape>) -> Result<(), Error> {
        let mut shapes: Vec<Shape> = shapes.into_iter().collect();
        if shapes.is_empty() {
            return Ok(());
        }
        self.check_new_ids(&shapes)?;
        let ids = shapes.iter().map(|s| s.id().to_owned()).collect();
        for s in &mut shapes {
            s.project(&self.transform);
        }
        self.shapes.append(&mut shapes);
        self.recompute_bbox();
        self.events.publish(&GroupEvent::ShapesAdded(ids));
        Ok(())
    }

    /// Remove members by id; unknown ids are skipped.
    ///
    /// Fails without removing anything if the group would become empty.
    pub fn remove(&mut self, shape_ids: &[&str]) -> Result<Vec<Shape>, Error> {
        let doomed = self
            .shapes
            .iter()
            .filter(|s| shape_ids.contains(&s.id()))
            .count();
        if doomed == 0 {
            return Ok(Vec::new());
        }
        if doomed == self.shapes.len() {
            return Err(Error::geometry(&self.id, "cannot remove every shape of a group"));
        }
        let (removed, kept): (Vec<Shape>, Vec<Shape>) = self
            .shapes
            .drain(..)
            .partition(|s| shape_ids.contains(&s.id()));
        self.shapes = kept;
        self.recompute_bbox();
        let ids = removed.iter().map(|s| s.id().to_owned()).collect();
        self.events.publish(&GroupEvent::ShapesRemoved(ids));
        Ok(removed)
    }

    /// Edit one member in place; bounds are refreshed afterwards.
    ///
    /// Returns `None` if there is no such member.
    pub fn update<R>(&mut self, shape_id: &str, f: impl FnOnce(&mut Shape) -> R) -> Option<R> {
        let shape = self.shapes.iter_mut().find(|s| s.id() == shape_id)?;
        let out = f(shape);
        shape.project(&self.transform);
        self.recompute_bbox();
        self.events.publish(&GroupEvent::ShapeChanged(shape_id.to_owned()));
        Some(out)
    }

    /// Move one vertex of one member.
    pub fn set_coordinate(&mut self, shape_id: &str, index: usize, p: Point) -> Result<(), Error> {
        match self.update(shape_id, |s| s.set_coordinate(index, p)) {
            Some(result) => result,
            None => Err(Error::geometry(&self.id, format!("no member `{shape_id}`"))),
        }
    }

    /// Translate every member in world space.
    pub fn translate(&mut self, delta: Vec2) {
        for s in &mut self.shapes {
            s.translate(delta);
        }
        self.recompute_bbox();
    }

    /// Replace every member's style.
    pub fn set_style(&mut self, style: Style) {
        for s in &mut self.shapes {
            s.set_style(style);
        }
        self.recompute_bbox();
        self.events.publish(&GroupEvent::StyleChanged);
    }

    /// Shallow-merge `patch` into every member's style.
    pub fn update_style(&mut self, patch: &StylePatch) {
        for s in &mut self.shapes {
            s.update_style(patch);
        }
        self.recompute_bbox();
        self.events.publish(&GroupEvent::StyleChanged);
    }

    /// Reproject every member.
    pub fn project(&mut self, transform: &AxisTransform) {
        self.transform = *transform;
        for s in &mut self.shapes {
            s.project(transform);
        }
        self.recompute_bbox();
    }

    /// Whether any member is under `p`.
    pub fn is_under_cursor(&self, p: Point, threshold: f64) -> bool {
        self.shapes.iter().any(|s| s.is_under_cursor(p, threshold))
    }

    /// The topmost member under `p`.
    pub fn hit_member(&self, p: Point, threshold: f64) -> Option<&Shape> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.is_under_cursor(p, threshold))
    }

    /// Union of member index boxes.
    pub fn index_box(&self, threshold: f64) -> Aabb2D<f64> {
        self.shapes
            .iter()
            .map(|s| s.index_box(threshold))
            .reduce(|a, b| a.union(&b))
            .unwrap_or(self.bbox)
    }

    /// Paint members in insertion order.
    pub fn render(&self, ctx: &mut dyn RenderContext) {
        for s in &self.shapes {
            s.render(ctx);
        }
    }

    /// Deep copy of the members under a new id, with no listeners attached.
    pub fn duplicate(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            shapes: self.shapes.clone(),
            transform: self.transform,
            bbox: self.bbox,
            events: EventBus::new(),
        }
    }

    fn check_new_ids(&self, incoming: &[Shape]) -> Result<(), Error> {
        for (i, s) in incoming.iter().enumerate() {
            let clash = self.contains(s.id()) || incoming[..i].iter().any(|o| o.id() == s.id());
            if clash {
                return Err(Error::geometry(
                    &self.id,
                    format!("duplicate member id `{}`", s.id()),
                ));
            }
        }
        Ok(())
    }

    fn recompute_bbox(&mut self) {
        if let Some(b) = self
            .shapes
            .iter()
            .map(Shape::bbox)
            .reduce(|a, b| a.union(&b))
        {
            self.bbox = b;
        }
    }
}
