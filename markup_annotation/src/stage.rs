// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage: annotations on a surface, with hover and selection.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use kurbo::{Point, Vec2};
use markup_canvas::{
    AxisTransform, Damage, DrawableFlags, DrawableId, EventBus, RenderContext, Style, Surface,
};

use crate::annotation::{Annotation, HoverableCapability};
use crate::config::StageConfig;
use crate::data::{AnnotationData, AnnotationRecord};
use crate::error::Error;
use crate::event::StageEvent;
use crate::label::{LabelDefinition, LabelStyleResolver};

/// The surface side of a pen draft.
///
/// `live` is shared with the pen; the stage clears it when it tears the draft down.
#[derive(Debug)]
struct DraftSlot {
    live: Rc<Cell<bool>>,
    target: Option<String>,
    drawable: Option<DrawableId>,
}

/// Annotations, the surface they are drawn on, and the bus announcing what happens to them.
///
/// One stage per canvas. Everything runs on the caller's thread: listeners on
/// [`events_mut`](Self::events_mut) are called synchronously from the method that caused the
/// event.
///
/// Per-annotation edits are batched: they are reindexed on the next [`flush`](Self::flush),
/// which picking calls ([`pointer_move`](Self::pointer_move), [`hit_test`](Self::hit_test),
/// [`hits_at`](Self::hits_at)) run first. Hosts typically also call `flush` once per frame to
/// collect damage.
///
/// At most one pen draft is attached at a time. Removing or deselecting the annotation it
/// edits, or clearing the stage, destroys the draft and shows the committed drawable again.
#[derive(Debug)]
pub struct Stage {
    config: StageConfig,
    surface: Surface,
    bus: EventBus<StageEvent>,
    labels: LabelStyleResolver,
    annotations: HashMap<String, Annotation>,
    order: Vec<String>,
    hovered: Option<String>,
    selected: Option<String>,
    draft: Option<DraftSlot>,
    serial: u64,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(StageConfig::default(), Vec::new())
    }
}

impl Stage {
    /// An empty stage.
    pub fn new(config: StageConfig, labels: Vec<LabelDefinition>) -> Self {
        let surface =
            Surface::new(config.transform()).with_hit_threshold(config.distance_threshold);
        let labels = LabelStyleResolver::new(labels)
            .with_default_color(config.default_color)
            .with_tiers(config.tiers());
        Self {
            config,
            surface,
            bus: EventBus::new(),
            labels,
            annotations: HashMap::new(),
            order: Vec::new(),
            hovered: None,
            selected: None,
            draft: None,
            serial: 0,
        }
    }

    /// Configuration the stage was built with.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// The underlying surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The current view transform.
    pub fn transform(&self) -> &AxisTransform {
        self.surface.transform()
    }

    /// Label lookup and style resolution.
    pub fn labels(&self) -> &LabelStyleResolver {
        &self.labels
    }

    /// The stage's event bus.
    pub fn events(&self) -> &EventBus<StageEvent> {
        &self.bus
    }

    /// Subscribe or unsubscribe host listeners.
    pub fn events_mut(&mut self) -> &mut EventBus<StageEvent> {
        &mut self.bus
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no annotations.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up an annotation.
    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.get(id)
    }

    /// Whether an annotation with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.annotations.contains_key(id)
    }

    /// Annotations in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.order.iter().filter_map(|id| self.annotations.get(id))
    }

    /// Add an annotation on top of the others.
    pub fn add(&mut self, record: AnnotationRecord) -> Result<(), Error> {
        if self.annotations.contains_key(&record.id) {
            return Err(Error::DuplicateAnnotation(record.id));
        }
        let annotation = Annotation::mount(record, &mut self.surface, &mut self.bus, &self.labels)
            .map_err(|e| match e {
                Error::Canvas(markup_canvas::Error::DuplicateId(id)) => {
                    Error::DuplicateAnnotation(id)
                }
                e => e,
            })?;
        let id = annotation.id().to_owned();
        log::debug!("added {} `{id}`", annotation.data().kind());
        self.annotations.insert(id.clone(), annotation);
        self.order.push(id.clone());
        self.bus.publish(&StageEvent::AnnotationAdded(id));
        Ok(())
    }

    /// Add many annotations. Records that fail to mount are skipped with a warning.
    ///
    /// Returns how many were added.
    pub fn load(&mut self, records: impl IntoIterator<Item = AnnotationRecord>) -> usize {
        let mut added = 0;
        for record in records {
            let id = record.id.clone();
            match self.add(record) {
                Ok(()) => added += 1,
                Err(e) => log::warn!("skipping annotation `{id}`: {e}"),
            }
        }
        added
    }

    /// Remove an annotation, releasing its drawable and listener.
    pub fn remove(&mut self, id: &str) -> Result<AnnotationRecord, Error> {
        if !self.annotations.contains_key(id) {
            return Err(Error::UnknownAnnotation(id.to_owned()));
        }
        if self.hovered.as_deref() == Some(id) {
            self.set_hovered(None);
        }
        if self.selected.as_deref() == Some(id) {
            self.unselect();
        }
        if self.draft_target() == Some(id) {
            self.close_draft();
        }
        let annotation = self
            .annotations
            .remove(id)
            .ok_or_else(|| Error::UnknownAnnotation(id.to_owned()))?;
        self.order.retain(|o| o != id);
        let record = annotation.unmount(&mut self.surface, &mut self.bus);
        self.bus.publish(&StageEvent::AnnotationRemoved(id.to_owned()));
        Ok(record)
    }

    /// Remove every annotation and anything else on the surface.
    pub fn clear(&mut self) {
        self.pointer_leave();
        self.unselect();
        self.close_draft();
        for id in core::mem::take(&mut self.order) {
            if let Some(a) = self.annotations.remove(&id) {
                a.unmount(&mut self.surface, &mut self.bus);
                self.bus.publish(&StageEvent::AnnotationRemoved(id));
            }
        }
        self.surface.clear();
    }

    /// Replace the label schema and restyle everything.
    pub fn set_labels(&mut self, labels: Vec<LabelDefinition>) {
        self.labels.set_labels(labels);
        for id in &self.order {
            if let Some(a) = self.annotations.get(id) {
                a.restyle(&mut self.surface, &self.labels);
            }
        }
    }

    /// Change an annotation's label.
    pub fn update_label(&mut self, id: &str, label: Option<String>) -> Result<(), Error> {
        let a = self
            .annotations
            .get_mut(id)
            .ok_or_else(|| Error::UnknownAnnotation(id.to_owned()))?;
        a.set_label(label);
        a.restyle(&mut self.surface, &self.labels);
        self.bus.publish(&StageEvent::AnnotationChanged(id.to_owned()));
        Ok(())
    }

    /// Replace an annotation's data. The drawable is swapped atomically and keeps its place
    /// in the stacking order.
    pub fn set_data(&mut self, id: &str, data: AnnotationData) -> Result<(), Error> {
        let a = self
            .annotations
            .get_mut(id)
            .ok_or_else(|| Error::UnknownAnnotation(id.to_owned()))?;
        a.set_data(data, &mut self.surface, &self.labels)?;
        self.bus.publish(&StageEvent::AnnotationChanged(id.to_owned()));
        Ok(())
    }

    /// Pan the view by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) -> bool {
        let changed = self.surface.pan(delta);
        self.transform_changed(changed)
    }

    /// Zoom about a screen-space focal point. The scale is clamped to the configured bounds.
    pub fn zoom_at(&mut self, focal: Point, factor: f64) -> bool {
        let changed = self.surface.zoom_at(focal, factor);
        self.transform_changed(changed)
    }

    /// Back to unit scale and zero offset.
    pub fn reset_view(&mut self) -> bool {
        let mut t = *self.surface.transform();
        let changed = t.reset() && self.surface.set_transform(t);
        self.transform_changed(changed)
    }

    /// Track the pointer. Returns the hovered annotation afterwards.
    ///
    /// Of all annotations under the pointer, only the topmost becomes hovered.
    pub fn pointer_move(&mut self, screen: Point) -> Option<&str> {
        self.flush();
        let world = self.surface.transform().to_world(screen);
        self.bus.publish(&StageEvent::PointerMove { screen, world });
        let winner = self.pick(screen).into_iter().next();
        if winner != self.hovered {
            self.set_hovered(winner);
        }
        self.hovered.as_deref()
    }

    /// The pointer left the canvas.
    pub fn pointer_leave(&mut self) {
        if self.hovered.is_some() {
            self.set_hovered(None);
        }
    }

    /// Topmost annotation under a screen point.
    pub fn hit_test(&mut self, screen: Point) -> Option<String> {
        self.flush();
        self.pick(screen).into_iter().next()
    }

    /// Every annotation under a screen point, topmost first.
    pub fn hits_at(&mut self, screen: Point) -> Vec<String> {
        self.flush();
        self.pick(screen)
    }

    /// Currently hovered annotation.
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Currently selected annotation.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select an annotation, deselecting any other.
    pub fn select(&mut self, id: &str) -> Result<(), Error> {
        if !self.annotations.contains_key(id) {
            return Err(Error::UnknownAnnotation(id.to_owned()));
        }
        if self.draft_target().is_some_and(|t| t != id) {
            self.close_draft();
        }
        if self.selected.as_deref() != Some(id) {
            self.set_selected(Some(id.to_owned()));
        }
        Ok(())
    }

    /// Clear the selection. Returns what was selected.
    pub fn unselect(&mut self) -> Option<String> {
        if self.draft_target().is_some() {
            self.close_draft();
        }
        let previous = self.selected.clone()?;
        self.set_selected(None);
        Some(previous)
    }

    /// Logical snapshot of every annotation, in the order they were added.
    pub fn snapshot(&self) -> Vec<AnnotationRecord> {
        self.iter().map(|a| a.record().clone()).collect()
    }

    /// [`snapshot`](Self::snapshot) as a JSON array.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Replace the contents of the stage with the records in a JSON array.
    ///
    /// Malformed JSON leaves the stage untouched. Well-formed records that fail to mount
    /// are skipped. Returns how many were added.
    pub fn from_json(&mut self, json: &str) -> Result<usize, Error> {
        let records: Vec<AnnotationRecord> = serde_json::from_str(json)?;
        self.clear();
        let added = self.load(records);
        self.surface.rebuild_index();
        Ok(added)
    }

    /// Paint everything visible, bottom to top.
    pub fn render(&self, ctx: Option<&mut dyn RenderContext>) -> Result<(), Error> {
        self.surface.render(ctx)?;
        Ok(())
    }

    /// Reindex edited drawables and collect damage.
    pub fn flush(&mut self) -> Damage {
        let damage = self.surface.flush();
        if damage.reindexed > 0 {
            log::debug!("flush reindexed {} drawables", damage.reindexed);
        }
        damage
    }

    // --- pen support ---

    pub(crate) fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Style for drafts drawn with `label`.
    pub(crate) fn draft_style(&self, label: Option<&str>) -> Style {
        self.labels.style_for(label, false, true)
    }

    pub(crate) fn set_hidden(&mut self, drawable: DrawableId, hidden: bool) {
        let flags = if hidden {
            DrawableFlags::empty()
        } else {
            DrawableFlags::default()
        };
        self.surface.set_flags(drawable, flags);
    }

    /// Attach a new draft, destroying any previous one. `target` is the annotation being
    /// edited, if any. The returned flag stays set until the stage destroys the draft.
    pub(crate) fn open_draft(&mut self, target: Option<String>) -> Rc<Cell<bool>> {
        self.close_draft();
        let live = Rc::new(Cell::new(true));
        self.draft = Some(DraftSlot {
            live: live.clone(),
            target,
            drawable: None,
        });
        live
    }

    /// Record the surface drawable of the draft owning `live`.
    pub(crate) fn attach_draft(&mut self, live: &Rc<Cell<bool>>, drawable: DrawableId) {
        match &mut self.draft {
            Some(slot) if Rc::ptr_eq(&slot.live, live) => slot.drawable = Some(drawable),
            _ => log::debug!("drawable {drawable:?} attached to a closed draft"),
        }
    }

    /// Destroy the draft owning `live`, if it is still attached.
    pub(crate) fn release_draft(&mut self, live: &Rc<Cell<bool>>) {
        if self.draft.as_ref().is_some_and(|d| Rc::ptr_eq(&d.live, live)) {
            self.close_draft();
        }
    }

    /// A fresh annotation id.
    pub(crate) fn next_id(&mut self) -> String {
        loop {
            self.serial += 1;
            let id = format!("a{}", self.serial);
            if !self.annotations.contains_key(&id) && self.surface.find(&id).is_none() {
                return id;
            }
        }
    }

    // --- internals ---

    fn draft_target(&self) -> Option<&str> {
        self.draft.as_ref().and_then(|d| d.target.as_deref())
    }

    /// Remove the draft drawable and show the committed one again.
    fn close_draft(&mut self) {
        let Some(draft) = self.draft.take() else {
            return;
        };
        draft.live.set(false);
        if let Some(d) = draft.drawable {
            if self.surface.remove(d).is_none() {
                log::debug!("draft drawable {d:?} was already gone");
            }
        }
        let committed = draft
            .target
            .as_deref()
            .and_then(|t| self.annotations.get(t))
            .and_then(Annotation::drawable);
        if let Some(committed) = committed {
            self.set_hidden(committed, false);
        }
        log::debug!("closed draft of {:?}", draft.target);
    }

    fn pick(&self, screen: Point) -> Vec<String> {
        self.surface
            .hits_at(screen)
            .into_iter()
            .filter_map(|did| {
                let name = self.surface.get(did)?.id();
                let a = self.annotations.get(name)?;
                (a.drawable() == Some(did) && a.on_pointer_move(&self.surface, screen))
                    .then(|| name.to_owned())
            })
            .collect()
    }

    fn transform_changed(&mut self, changed: bool) -> bool {
        if changed {
            let t = *self.surface.transform();
            log::debug!("view scale={} offset={:?}", t.scale(), t.offset());
            self.bus.publish(&StageEvent::TransformChanged(t));
        }
        changed
    }

    fn set_hovered(&mut self, current: Option<String>) {
        let previous = core::mem::replace(&mut self.hovered, current.clone());
        log::trace!("hover {previous:?} -> {current:?}");
        self.bus.publish(&StageEvent::HoverChanged {
            previous: previous.clone(),
            current: current.clone(),
        });
        self.restyle(previous.as_deref());
        self.restyle(current.as_deref());
    }

    fn set_selected(&mut self, current: Option<String>) {
        let previous = core::mem::replace(&mut self.selected, current.clone());
        log::debug!("selection {previous:?} -> {current:?}");
        self.bus.publish(&StageEvent::SelectionChanged {
            previous: previous.clone(),
            current: current.clone(),
        });
        self.restyle(previous.as_deref());
        self.restyle(current.as_deref());
    }

    fn restyle(&mut self, id: Option<&str>) {
        if let Some(a) = id.and_then(|id| self.annotations.get(id)) {
            a.restyle(&mut self.surface, &self.labels);
        }
    }
}
