// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Annotations: records bound to drawables, with hover and select state.

use std::cell::Cell;
use std::rc::Rc;

use kurbo::Point;
use markup_canvas::{DrawableId, EventBus, Subscription, Surface};

use crate::data::{AnnotationData, AnnotationRecord};
use crate::error::Error;
use crate::event::StageEvent;
use crate::label::LabelStyleResolver;

/// Pointer interaction hooks.
///
/// The stage asks every candidate under the pointer whether it is really hit, picks the
/// topmost, and announces hover and selection changes on its bus. Each annotation learns
/// about those changes through the listener it registered when it was mounted.
pub trait HoverableCapability {
    /// Precise hit test against a screen point.
    fn on_pointer_move(&self, surface: &Surface, p: Point) -> bool;

    /// Hover state changed.
    fn on_hover_changed(&self, hovered: bool);

    /// Selection state changed.
    fn on_select_changed(&self, selected: bool);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct State {
    hovered: bool,
    selected: bool,
}

/// Interaction state shared between an annotation and its bus listener.
#[derive(Clone, Debug, Default)]
struct Interaction(Rc<Cell<State>>);

impl Interaction {
    fn get(&self) -> State {
        self.0.get()
    }

    fn set_hovered(&self, hovered: bool) {
        self.0.set(State {
            hovered,
            ..self.0.get()
        });
    }

    fn set_selected(&self, selected: bool) {
        self.0.set(State {
            selected,
            ..self.0.get()
        });
    }

    fn observe(&self, id: &str, event: &StageEvent) {
        let mine = |v: &Option<String>| v.as_deref() == Some(id);
        match event {
            StageEvent::HoverChanged { previous, current } => {
                if mine(previous) {
                    self.set_hovered(false);
                }
                if mine(current) {
                    self.set_hovered(true);
                }
            }
            StageEvent::SelectionChanged { previous, current } => {
                if mine(previous) {
                    self.set_selected(false);
                }
                if mine(current) {
                    self.set_selected(true);
                }
            }
            _ => {}
        }
    }
}

/// A labeled piece of geometry (or text) on a stage.
///
/// Tags and text have no drawable and are never hovered.
#[derive(Debug)]
pub struct Annotation {
    record: AnnotationRecord,
    drawable: Option<DrawableId>,
    interaction: Interaction,
    subscription: Subscription,
}

impl Annotation {
    /// Validate `record`, put its drawable on `surface`, and listen on `bus`.
    pub(crate) fn mount(
        record: AnnotationRecord,
        surface: &mut Surface,
        bus: &mut EventBus<StageEvent>,
        labels: &LabelStyleResolver,
    ) -> Result<Self, Error> {
        record.data.validate(&record.id)?;
        let style = labels.style_for(record.label.as_deref(), false, false);
        let drawable = match record.data.to_drawable(&record.id, style)? {
            Some(d) => Some(surface.insert(d)?),
            None => None,
        };
        let interaction = Interaction::default();
        let listener = interaction.clone();
        let id = record.id.clone();
        let subscription = bus.subscribe(move |e| listener.observe(&id, e));
        Ok(Self {
            record,
            drawable,
            interaction,
            subscription,
        })
    }

    /// Remove the drawable and the bus listener.
    pub(crate) fn unmount(
        self,
        surface: &mut Surface,
        bus: &mut EventBus<StageEvent>,
    ) -> AnnotationRecord {
        if let Some(d) = self.drawable {
            if surface.remove(d).is_none() {
                log::error!("annotation `{}` lost its drawable", self.record.id);
            }
        }
        if !bus.unsubscribe(self.subscription) {
            log::error!("annotation `{}` lost its bus listener", self.record.id);
        }
        self.record
    }

    /// Recompute the drawable's style from label and interaction state.
    pub(crate) fn restyle(&self, surface: &mut Surface, labels: &LabelStyleResolver) {
        let Some(d) = self.drawable else {
            return;
        };
        let state = self.interaction.get();
        let style = labels.style_for(self.label(), state.hovered, state.selected);
        surface.update(d, |drawable| drawable.set_style(style));
    }

    /// Swap in new data, replacing the drawable atomically. The z position is kept.
    pub(crate) fn set_data(
        &mut self,
        data: AnnotationData,
        surface: &mut Surface,
        labels: &LabelStyleResolver,
    ) -> Result<(), Error> {
        data.validate(&self.record.id)?;
        let state = self.interaction.get();
        let style = labels.style_for(self.label(), state.hovered, state.selected);
        let next = data.to_drawable(&self.record.id, style)?;
        match (self.drawable, next) {
            (Some(id), Some(d)) => {
                surface.replace(id, d)?;
            }
            (None, Some(d)) => self.drawable = Some(surface.insert(d)?),
            (Some(id), None) => {
                surface.remove(id);
                self.drawable = None;
            }
            (None, None) => {}
        }
        self.record.data = data;
        Ok(())
    }

    pub(crate) fn set_label(&mut self, label: Option<String>) {
        self.record.label = label;
    }

    /// Unique id.
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Label value.
    pub fn label(&self) -> Option<&str> {
        self.record.label.as_deref()
    }

    /// World-space data.
    pub fn data(&self) -> &AnnotationData {
        &self.record.data
    }

    /// Snapshot of id, label, and data.
    pub fn record(&self) -> &AnnotationRecord {
        &self.record
    }

    /// Handle of the drawable on the surface, if the annotation has geometry.
    pub fn drawable(&self) -> Option<DrawableId> {
        self.drawable
    }

    /// Whether the pointer is over this annotation (and nothing above it).
    pub fn is_hovered(&self) -> bool {
        self.interaction.get().hovered
    }

    /// Whether this annotation is selected.
    pub fn is_selected(&self) -> bool {
        self.interaction.get().selected
    }
}

impl HoverableCapability for Annotation {
    fn on_pointer_move(&self, surface: &Surface, p: Point) -> bool {
        self.drawable
            .and_then(|d| surface.get(d))
            .is_some_and(|d| d.is_under_cursor(p, surface.hit_threshold()))
    }

    fn on_hover_changed(&self, hovered: bool) {
        log::trace!("`{}` hovered={hovered}", self.record.id);
        self.interaction.set_hovered(hovered);
    }

    fn on_select_changed(&self, selected: bool) {
        log::trace!("`{}` selected={selected}", self.record.id);
        self.interaction.set_selected(selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelDefinition;
    use markup_canvas::{AxisTransform, Color};

    fn fixture() -> (Surface, EventBus<StageEvent>, LabelStyleResolver) {
        (
            Surface::new(AxisTransform::default()),
            EventBus::new(),
            LabelStyleResolver::new(vec![LabelDefinition::new("car", "#ff0000")]),
        )
    }

    fn point(id: &str) -> AnnotationRecord {
        AnnotationRecord::new(id, "car", AnnotationData::Point { x: 10.0, y: 10.0 })
    }

    #[test]
    fn mount_and_unmount_balance_resources() {
        let (mut surface, mut bus, labels) = fixture();
        let baseline = bus.listener_count();
        for round in 0..5 {
            let a = Annotation::mount(point(&format!("p{round}")), &mut surface, &mut bus, &labels)
                .unwrap();
            assert_eq!(bus.listener_count(), baseline + 1);
            assert_eq!(surface.len(), 1);
            a.unmount(&mut surface, &mut bus);
            assert_eq!(bus.listener_count(), baseline);
            assert!(surface.is_empty());
        }
    }

    #[test]
    fn bus_events_drive_interaction_state() {
        let (mut surface, mut bus, labels) = fixture();
        let a = Annotation::mount(point("a"), &mut surface, &mut bus, &labels).unwrap();
        bus.publish(&StageEvent::HoverChanged {
            previous: None,
            current: Some("a".into()),
        });
        assert!(a.is_hovered());
        bus.publish(&StageEvent::SelectionChanged {
            previous: None,
            current: Some("a".into()),
        });
        bus.publish(&StageEvent::HoverChanged {
            previous: Some("a".into()),
            current: Some("b".into()),
        });
        assert!(!a.is_hovered());
        assert!(a.is_selected());
    }

    #[test]
    fn restyle_follows_label_color() {
        let (mut surface, mut bus, labels) = fixture();
        let mut a = Annotation::mount(point("a"), &mut surface, &mut bus, &labels).unwrap();
        let stroke = |s: &Surface, a: &Annotation| {
            s.get(a.drawable().unwrap()).unwrap().shapes()[0].style().stroke
        };
        assert_eq!(stroke(&surface, &a), Color::rgb(255, 0, 0));
        a.set_label(Some("unknown".into()));
        a.restyle(&mut surface, &labels);
        assert_eq!(stroke(&surface, &a), Color::BLACK);
    }

    #[test]
    fn invalid_data_is_not_mounted() {
        let (mut surface, mut bus, labels) = fixture();
        let bad = AnnotationRecord::new("bad", "car", AnnotationData::Line { points: vec![] });
        assert!(Annotation::mount(bad, &mut surface, &mut bus, &labels).is_err());
        assert!(surface.is_empty());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn tags_have_no_drawable() {
        let (mut surface, mut bus, labels) = fixture();
        let tag = AnnotationRecord::unlabeled(
            "t",
            AnnotationData::Tag {
                values: vec!["night".into()],
            },
        );
        let a = Annotation::mount(tag, &mut surface, &mut bus, &labels).unwrap();
        assert!(a.drawable().is_none());
        assert!(!a.on_pointer_move(&surface, Point::ZERO));
    }
}
