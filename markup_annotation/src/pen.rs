// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pens: per-tool draft controllers for drawing and editing annotations.

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Point, Vec2};
use markup_canvas::{Drawable, DrawableId, GroupEvent};
use serde::{Deserialize, Serialize};

use crate::data::{AnnotationData, AnnotationRecord};
use crate::error::Error;
use crate::stage::Stage;

/// The kind of geometry a pen draws.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// One click places a point.
    Point,
    /// Clicks add polyline vertices.
    Line,
    /// Press and drag spans a rectangle.
    Rect,
    /// Clicks add polygon vertices.
    Polygon,
}

#[derive(Debug)]
struct Draft {
    /// Annotation id: the one being edited, or the one reserved for a new drawing.
    id: String,
    editing: bool,
    label: Option<String>,
    data: AnnotationData,
    /// First corner while dragging out a rectangle.
    anchor: Option<Point>,
    /// Rubber-band vertex following the pointer while drawing a polyline or polygon.
    cursor: Option<Point>,
    drawable: Option<DrawableId>,
    changed: Rc<Cell<bool>>,
    /// Cleared by the stage when it destroys the draft from its side.
    live: Rc<Cell<bool>>,
}

impl Draft {
    fn name(&self) -> String {
        format!("{}#draft", self.id)
    }

    fn preview(&self) -> AnnotationData {
        let mut data = self.data.clone();
        if let (
            Some(c),
            AnnotationData::Line { points } | AnnotationData::Polygon { points },
        ) = (self.cursor, &mut data)
        {
            points.push(c);
        }
        data
    }
}

/// Holds at most one draft: a scratch copy of an annotation that is being drawn or edited.
///
/// Editing ([`select`](Self::select)) hides the committed drawable and puts a copy on top of
/// everything; edits go to the copy. [`unselect`](Self::unselect) removes the copy and, if
/// anything changed, swaps the edited geometry into the committed annotation in one step.
///
/// Drawing ([`begin`](Self::begin), [`add_point`](Self::add_point),
/// [`update_pointer`](Self::update_pointer), [`finish`](Self::finish)) builds a preview the
/// same way and adds a new annotation on finish. Geometry that fails validation is dropped
/// and the pen returns to idle.
///
/// Starting any draft destroys the previous one first, without committing it. The stage
/// also destroys an edit draft when its annotation is removed or deselected; the pen then
/// forgets the draft and has nothing to commit.
///
/// Pointer positions are in screen space.
#[derive(Debug)]
pub struct Pen {
    tool: Tool,
    label: Option<String>,
    draft: Option<Draft>,
}

impl Pen {
    /// An idle pen for `tool`.
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            label: None,
            draft: None,
        }
    }

    /// The geometry this pen draws.
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Label given to new annotations.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Set the label for new annotations.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Whether a draft exists.
    pub fn has_draft(&self) -> bool {
        self.current().is_some()
    }

    /// Id of the annotation being edited, if the draft is an edit.
    pub fn editing(&self) -> Option<&str> {
        self.current()
            .filter(|d| d.editing)
            .map(|d| d.id.as_str())
    }

    /// The draft's geometry, without any rubber-band vertex.
    pub fn draft_data(&self) -> Option<&AnnotationData> {
        self.current().map(|d| &d.data)
    }

    /// The draft's drawable on the surface.
    pub fn draft_drawable(&self) -> Option<DrawableId> {
        self.current().and_then(|d| d.drawable)
    }

    /// Whether the edit draft differs from what was selected.
    pub fn is_changed(&self) -> bool {
        self.current().is_some_and(|d| d.changed.get())
    }

    /// Start editing `id` through a draft copy, and select it on the stage.
    pub fn select(&mut self, stage: &mut Stage, id: &str) -> Result<(), Error> {
        let annotation = stage
            .get(id)
            .ok_or_else(|| Error::UnknownAnnotation(id.to_owned()))?;
        let data = annotation.data().clone();
        let label = annotation.label().map(str::to_owned);
        let committed = annotation.drawable();
        self.reset(stage);

        let live = stage.open_draft(Some(id.to_owned()));
        let mut draft = Draft {
            id: id.to_owned(),
            editing: true,
            label,
            data,
            anchor: None,
            cursor: None,
            drawable: None,
            changed: Rc::new(Cell::new(false)),
            live,
        };
        if let Some(committed) = committed {
            let style = stage.draft_style(draft.label.as_deref());
            let copy = stage.surface().get(committed).map(|d| {
                let mut copy = d.duplicate(draft.name());
                copy.set_style(style);
                copy
            });
            if let Some(mut copy) = copy {
                watch(&mut copy, &draft.changed);
                match stage.surface_mut().insert(copy) {
                    Ok(d) => {
                        stage.attach_draft(&draft.live, d);
                        draft.drawable = Some(d);
                        stage.set_hidden(committed, true);
                    }
                    Err(e) => {
                        stage.release_draft(&draft.live);
                        return Err(e.into());
                    }
                }
            }
        }
        stage.select(id)?;
        log::debug!("editing `{id}`");
        self.draft = Some(draft);
        Ok(())
    }

    /// End the current draft.
    ///
    /// For an edit, commits the draft's geometry if it changed and returns the annotation id;
    /// the selection is cleared either way. A drawing in progress is discarded.
    pub fn unselect(&mut self, stage: &mut Stage) -> Result<Option<String>, Error> {
        let Some(draft) = self.take_active() else {
            return Ok(None);
        };
        if !draft.editing {
            stage.release_draft(&draft.live);
            return Ok(None);
        }
        let id = draft.id.clone();
        let result = if draft.changed.get() {
            stage
                .set_data(&id, draft.data.clone())
                .map(|()| Some(id.clone()))
        } else {
            Ok(None)
        };
        stage.release_draft(&draft.live);
        if stage.selected() == Some(id.as_str()) {
            stage.unselect();
        }
        if let Ok(Some(id)) = &result {
            log::debug!("committed edit of `{id}`");
        }
        result
    }

    /// Drop the draft without committing, and clear the selection it made.
    pub fn reset(&mut self, stage: &mut Stage) {
        let Some(draft) = self.take_active() else {
            return;
        };
        log::debug!("discarding draft of `{}`", draft.id);
        let edited = draft.editing.then(|| draft.id.clone());
        stage.release_draft(&draft.live);
        if let Some(id) = edited {
            if stage.selected() == Some(id.as_str()) {
                stage.unselect();
            }
        }
    }

    /// Start drawing a new annotation at `screen`.
    pub fn begin(&mut self, stage: &mut Stage, screen: Point) -> Result<(), Error> {
        self.reset(stage);
        let w = stage.transform().to_world(screen);
        let (data, anchor, cursor) = match self.tool {
            Tool::Point => (AnnotationData::Point { x: w.x, y: w.y }, None, None),
            Tool::Line => (AnnotationData::Line { points: vec![w] }, None, Some(w)),
            Tool::Polygon => (AnnotationData::Polygon { points: vec![w] }, None, Some(w)),
            Tool::Rect => (AnnotationData::rect_from_corners(w, w), Some(w), None),
        };
        let live = stage.open_draft(None);
        let mut draft = Draft {
            id: stage.next_id(),
            editing: false,
            label: self.label.clone(),
            data,
            anchor,
            cursor,
            drawable: None,
            changed: Rc::new(Cell::new(true)),
            live,
        };
        log::debug!("drawing {:?} `{}`", self.tool, draft.id);
        let result = refresh(stage, &mut draft);
        self.draft = Some(draft);
        if result.is_err() {
            self.reset(stage);
        }
        result
    }

    /// Follow the pointer: moves the rubber-band vertex, the rectangle's free corner, or the
    /// point. Ignored while editing.
    pub fn update_pointer(&mut self, stage: &mut Stage, screen: Point) -> Result<(), Error> {
        let w = stage.transform().to_world(screen);
        let draft = self.active()?;
        if draft.editing {
            return Ok(());
        }
        if let Some(anchor) = draft.anchor {
            draft.data = AnnotationData::rect_from_corners(anchor, w);
        } else if let AnnotationData::Point { x, y } = &mut draft.data {
            *x = w.x;
            *y = w.y;
        } else {
            draft.cursor = Some(w);
        }
        refresh(stage, draft)
    }

    /// Fix a vertex at `screen`. For points and rectangles this is the same as
    /// [`update_pointer`](Self::update_pointer).
    pub fn add_point(&mut self, stage: &mut Stage, screen: Point) -> Result<(), Error> {
        let w = stage.transform().to_world(screen);
        let draft = self.active()?;
        if let AnnotationData::Line { points } | AnnotationData::Polygon { points } =
            &mut draft.data
        {
            points.push(w);
            if draft.editing {
                draft.changed.set(true);
            } else {
                draft.cursor = Some(w);
            }
            return refresh(stage, draft);
        }
        if draft.editing {
            return Err(Error::NotEditable(draft.id.clone()));
        }
        self.update_pointer(stage, screen)
    }

    /// Complete the draft.
    ///
    /// A drawing is validated and added to the stage under a fresh id, which is returned.
    /// An edit is committed as by [`unselect`](Self::unselect). Either way the pen is idle
    /// afterwards.
    pub fn finish(&mut self, stage: &mut Stage) -> Result<String, Error> {
        let draft = self.take_active().ok_or(Error::NoDraft)?;
        if draft.editing {
            let id = draft.id.clone();
            self.draft = Some(draft);
            self.unselect(stage)?;
            return Ok(id);
        }
        let result = draft.data.validate(&draft.id).and_then(|()| {
            let id = if stage.contains(&draft.id) {
                stage.next_id()
            } else {
                draft.id.clone()
            };
            let record = AnnotationRecord {
                id: id.clone(),
                label: draft.label.clone(),
                data: draft.data.clone(),
            };
            stage.add(record).map(|()| id)
        });
        match &result {
            Ok(id) => log::debug!("finished `{id}`"),
            Err(e) => log::debug!("drawing `{}` dropped: {e}", draft.id),
        }
        stage.release_draft(&draft.live);
        result
    }

    /// Move one vertex of the draft to `screen`.
    pub fn drag_vertex(
        &mut self,
        stage: &mut Stage,
        index: usize,
        screen: Point,
    ) -> Result<(), Error> {
        let w = stage.transform().to_world(screen);
        let draft = self.active()?;
        if !draft.data.is_spatial() {
            return Err(Error::NotEditable(draft.id.clone()));
        }
        if !draft.data.set_vertex(index, w) {
            return Err(Error::Canvas(markup_canvas::Error::InvalidGeometry {
                id: draft.id.clone(),
                reason: format!("no vertex {index}"),
            }));
        }
        apply(stage, draft)
    }

    /// Move the whole draft by a screen-space delta.
    pub fn translate(&mut self, stage: &mut Stage, screen_delta: Vec2) -> Result<(), Error> {
        let d = stage.transform().to_world_vec(screen_delta);
        let draft = self.active()?;
        if !draft.data.is_spatial() {
            return Err(Error::NotEditable(draft.id.clone()));
        }
        draft.data.translate(d);
        if let Some(anchor) = &mut draft.anchor {
            *anchor += d;
        }
        if let Some(cursor) = &mut draft.cursor {
            *cursor += d;
        }
        apply(stage, draft)
    }
}

impl Pen {
    fn current(&self) -> Option<&Draft> {
        self.draft.as_ref().filter(|d| d.live.get())
    }

    /// The draft, unless the stage has destroyed it in the meantime.
    fn active(&mut self) -> Result<&mut Draft, Error> {
        if self.draft.as_ref().is_some_and(|d| !d.live.get()) {
            if let Some(stale) = self.draft.take() {
                log::debug!("draft of `{}` was closed by the stage", stale.id);
            }
        }
        self.draft.as_mut().ok_or(Error::NoDraft)
    }

    fn take_active(&mut self) -> Option<Draft> {
        self.active().ok()?;
        self.draft.take()
    }
}

/// Flag `changed` whenever the copied group reports a geometry or membership edit.
fn watch(drawable: &mut Drawable, changed: &Rc<Cell<bool>>) {
    if let Some(group) = drawable.as_group_mut() {
        let flag = changed.clone();
        group.events_mut().subscribe(move |e| {
            if !matches!(e, GroupEvent::StyleChanged) {
                flag.set(true);
            }
        });
    }
}

/// Push an in-place edit of the draft's data to its drawable.
fn apply(stage: &mut Stage, draft: &mut Draft) -> Result<(), Error> {
    if !draft.editing {
        return refresh(stage, draft);
    }
    let Some(d) = draft.drawable else {
        return Ok(());
    };
    let data = &draft.data;
    let synced = stage
        .surface_mut()
        .update(d, |drawable| data.sync(drawable).map(|()| drawable.as_group().is_some()))
        .ok_or(Error::Canvas(markup_canvas::Error::UnknownDrawable(d)))?;
    if !synced? {
        draft.changed.set(true);
    }
    Ok(())
}

/// Rebuild the draft's drawable from its data (plus the rubber-band vertex).
fn refresh(stage: &mut Stage, draft: &mut Draft) -> Result<(), Error> {
    let style = stage.draft_style(draft.label.as_deref());
    let Some(mut next) = draft.preview().to_drawable(&draft.name(), style)? else {
        return Ok(());
    };
    watch(&mut next, &draft.changed);
    match draft.drawable {
        Some(d) if stage.surface().is_alive(d) => {
            stage.surface_mut().replace(d, next)?;
        }
        _ => {
            let d = stage.surface_mut().insert(next)?;
            stage.attach_draft(&draft.live, d);
            draft.drawable = Some(d);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::label::LabelDefinition;
    use markup_canvas::DrawableFlags;

    fn stage() -> Stage {
        Stage::new(
            StageConfig::default(),
            vec![LabelDefinition::new("car", "#ff0000")],
        )
    }

    fn rect(id: &str, x: f64) -> AnnotationRecord {
        AnnotationRecord::new(
            id,
            "car",
            AnnotationData::Rect {
                x,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
        )
    }

    fn polyline(id: &str) -> AnnotationRecord {
        AnnotationRecord::new(
            id,
            "car",
            AnnotationData::Line {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(10.0, 0.0),
                    Point::new(10.0, 10.0),
                ],
            },
        )
    }

    #[test]
    fn at_most_one_draft_exists() {
        let mut st = stage();
        st.add(rect("a", 0.0)).unwrap();
        st.add(rect("b", 50.0)).unwrap();
        let mut pen = Pen::new(Tool::Rect);
        pen.select(&mut st, "a").unwrap();
        assert_eq!(st.surface().len(), 3);
        let first = pen.draft_drawable().unwrap();
        let a = st.get("a").and_then(|a| a.drawable()).unwrap();
        assert_eq!(st.surface().flags(a), Some(DrawableFlags::empty()));

        pen.select(&mut st, "b").unwrap();
        assert_eq!(st.surface().len(), 3, "first draft destroyed before the second");
        assert!(!st.surface().is_alive(first));
        assert_eq!(st.surface().flags(a), Some(DrawableFlags::default()));
        assert_eq!(pen.editing(), Some("b"));
        assert_eq!(st.selected(), Some("b"));
    }

    #[test]
    fn unchanged_edit_commits_nothing() {
        let mut st = stage();
        st.add(rect("a", 0.0)).unwrap();
        let mut pen = Pen::new(Tool::Rect);
        pen.select(&mut st, "a").unwrap();
        assert_eq!(pen.unselect(&mut st), Ok(None));
        assert!(!pen.has_draft());
        assert_eq!(st.surface().len(), 1);
        assert_eq!(st.selected(), None);
    }

    #[test]
    fn polyline_edit_is_tracked_through_group_events() {
        let mut st = stage();
        st.add(polyline("l")).unwrap();
        let mut pen = Pen::new(Tool::Line);
        pen.select(&mut st, "l").unwrap();
        assert!(!pen.is_changed());
        pen.drag_vertex(&mut st, 2, Point::new(20.0, 10.0)).unwrap();
        assert!(pen.is_changed());
        // The committed annotation is untouched until unselect.
        assert_eq!(st.get("l").unwrap().data().vertices()[2], Point::new(10.0, 10.0));
        assert_eq!(pen.unselect(&mut st), Ok(Some("l".to_owned())));
        assert_eq!(st.get("l").unwrap().data().vertices()[2], Point::new(20.0, 10.0));
        assert_eq!(st.surface().len(), 1);
        assert_eq!(st.hit_test(Point::new(15.0, 10.0)).as_deref(), Some("l"));
    }

    #[test]
    fn translate_rect_in_zoomed_view() {
        let mut st = stage();
        st.add(rect("a", 0.0)).unwrap();
        st.zoom_at(Point::ZERO, 2.0);
        let mut pen = Pen::new(Tool::Rect);
        pen.select(&mut st, "a").unwrap();
        pen.translate(&mut st, Vec2::new(20.0, 0.0)).unwrap();
        assert_eq!(pen.finish(&mut st).unwrap(), "a");
        assert_eq!(
            st.get("a").unwrap().data(),
            &AnnotationData::Rect {
                x: 10.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            }
        );
    }

    #[test]
    fn draft_is_not_hoverable() {
        let mut st = stage();
        st.add(rect("a", 0.0)).unwrap();
        let mut pen = Pen::new(Tool::Rect);
        pen.select(&mut st, "a").unwrap();
        assert_eq!(st.pointer_move(Point::new(5.0, 5.0)), None);
        pen.reset(&mut st);
        assert_eq!(st.pointer_move(Point::new(5.0, 5.0)), Some("a"));
        assert_eq!(st.selected(), None);
    }

    #[test]
    fn draw_polygon() {
        let mut st = stage();
        let mut pen = Pen::new(Tool::Polygon);
        pen.set_label(Some("car".into()));
        pen.begin(&mut st, Point::new(0.0, 0.0)).unwrap();
        pen.update_pointer(&mut st, Point::new(5.0, 0.0)).unwrap();
        pen.add_point(&mut st, Point::new(10.0, 0.0)).unwrap();
        pen.add_point(&mut st, Point::new(10.0, 10.0)).unwrap();
        assert_eq!(st.surface().len(), 1, "only the preview so far");
        let id = pen.finish(&mut st).unwrap();
        assert!(!pen.has_draft());
        let a = st.get(&id).unwrap();
        assert_eq!(a.label(), Some("car"));
        assert_eq!(a.data().vertices().len(), 3);
        assert_eq!(st.surface().len(), 1);
    }

    #[test]
    fn draw_rect_in_world_space() {
        let mut st = stage();
        st.zoom_at(Point::ZERO, 2.0);
        let mut pen = Pen::new(Tool::Rect);
        pen.begin(&mut st, Point::new(60.0, 40.0)).unwrap();
        pen.update_pointer(&mut st, Point::new(20.0, 20.0)).unwrap();
        let id = pen.finish(&mut st).unwrap();
        assert_eq!(
            st.get(&id).unwrap().data(),
            &AnnotationData::Rect {
                x: 10.0,
                y: 10.0,
                width: 20.0,
                height: 10.0,
            }
        );
    }

    #[test]
    fn invalid_drawing_returns_to_idle() {
        let mut st = stage();
        let mut pen = Pen::new(Tool::Line);
        pen.begin(&mut st, Point::new(3.0, 3.0)).unwrap();
        pen.update_pointer(&mut st, Point::new(30.0, 3.0)).unwrap();
        let err = pen.finish(&mut st).unwrap_err();
        assert!(matches!(
            err,
            Error::Canvas(markup_canvas::Error::InvalidGeometry { .. })
        ));
        assert!(!pen.has_draft());
        assert!(st.surface().is_empty());
        assert!(st.is_empty());
    }

    #[test]
    fn operations_need_a_draft() {
        let mut st = stage();
        let mut pen = Pen::new(Tool::Point);
        assert_eq!(pen.finish(&mut st), Err(Error::NoDraft));
        assert_eq!(pen.update_pointer(&mut st, Point::ZERO), Err(Error::NoDraft));
        assert_eq!(pen.drag_vertex(&mut st, 0, Point::ZERO), Err(Error::NoDraft));
        assert_eq!(pen.unselect(&mut st), Ok(None));
        assert!(matches!(
            pen.select(&mut st, "ghost"),
            Err(Error::UnknownAnnotation(_))
        ));
    }

    #[test]
    fn text_annotations_cannot_be_dragged() {
        let mut st = stage();
        st.add(AnnotationRecord::unlabeled(
            "t",
            AnnotationData::Text { value: "note".into() },
        ))
        .unwrap();
        let mut pen = Pen::new(Tool::Point);
        pen.select(&mut st, "t").unwrap();
        assert!(pen.draft_drawable().is_none());
        assert_eq!(pen.drag_vertex(&mut st, 0, Point::ZERO), Err(Error::NotEditable("t".into())));
        assert_eq!(pen.unselect(&mut st), Ok(None));
    }

    /// Screen-space extent of everything rendered.
    fn painted(st: &Stage) -> Vec<kurbo::Rect> {
        use kurbo::Shape as _;
        use markup_canvas::{DisplayList, DrawCommand};

        let mut list = DisplayList::new();
        st.render(Some(&mut list)).unwrap();
        list.commands
            .iter()
            .map(|c| match c {
                DrawCommand::Fill { path, .. } | DrawCommand::Stroke { path, .. } => {
                    path.bounding_box()
                }
            })
            .collect()
    }

    #[test]
    fn removing_the_edited_annotation_destroys_the_draft() {
        let mut st = stage();
        st.add(rect("a", 0.0)).unwrap();
        st.add(rect("b", 50.0)).unwrap();
        let mut pen = Pen::new(Tool::Rect);
        pen.select(&mut st, "a").unwrap();
        pen.translate(&mut st, Vec2::new(3.0, 0.0)).unwrap();
        st.remove("a").unwrap();

        assert_eq!(st.surface().len(), 1);
        assert!(!pen.has_draft());
        assert!(painted(&st).iter().all(|r| r.x0 >= 40.0), "nothing left where `a` was");

        // A new annotation under the same id is not overwritten by the old draft.
        st.add(rect("a", 0.0)).unwrap();
        assert_eq!(pen.unselect(&mut st), Ok(None));
        assert_eq!(
            st.get("a").unwrap().data(),
            &AnnotationData::Rect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            }
        );
        assert_eq!(pen.translate(&mut st, Vec2::new(1.0, 0.0)), Err(Error::NoDraft));
    }

    #[test]
    fn selecting_elsewhere_on_the_stage_destroys_the_draft() {
        let mut st = stage();
        st.add(rect("a", 0.0)).unwrap();
        st.add(rect("b", 50.0)).unwrap();
        let mut pen = Pen::new(Tool::Rect);
        pen.select(&mut st, "a").unwrap();
        st.select("b").unwrap();

        assert_eq!(st.selected(), Some("b"));
        assert_eq!(pen.editing(), None);
        assert_eq!(st.surface().len(), 2);
        assert_eq!(st.hit_test(Point::new(5.0, 5.0)).as_deref(), Some("a"));
        assert_eq!(pen.drag_vertex(&mut st, 0, Point::new(1.0, 1.0)), Err(Error::NoDraft));
        // Stage-level unselect while editing has the same effect.
        pen.select(&mut st, "a").unwrap();
        assert_eq!(st.unselect().as_deref(), Some("a"));
        assert!(!pen.has_draft());
        assert_eq!(st.surface().len(), 2);
    }

    #[test]
    fn clearing_the_stage_drops_a_drawing() {
        let mut st = stage();
        let mut pen = Pen::new(Tool::Line);
        pen.begin(&mut st, Point::new(0.0, 0.0)).unwrap();
        pen.add_point(&mut st, Point::new(10.0, 0.0)).unwrap();
        st.clear();
        assert!(!pen.has_draft());
        assert!(st.surface().is_empty());
        assert_eq!(pen.finish(&mut st), Err(Error::NoDraft));
    }

    #[test]
    fn a_second_pen_takes_over_the_draft() {
        let mut st = stage();
        st.add(rect("a", 0.0)).unwrap();
        st.add(rect("b", 50.0)).unwrap();
        let mut first = Pen::new(Tool::Rect);
        let mut second = Pen::new(Tool::Rect);
        first.select(&mut st, "a").unwrap();
        second.select(&mut st, "b").unwrap();
        assert!(!first.has_draft());
        assert_eq!(second.editing(), Some("b"));
        assert_eq!(st.surface().len(), 3);
        assert_eq!(st.hit_test(Point::new(5.0, 5.0)).as_deref(), Some("a"));
    }
}
