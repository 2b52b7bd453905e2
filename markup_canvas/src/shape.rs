// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive shapes: world coordinates, projected coordinates, bounds, and picking.

use kurbo::{BezPath, Circle, Line, ParamCurveNearest, Point, Rect, Shape as _, Vec2};
use markup_index::Aabb2D;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::render::RenderContext;
use crate::style::{Style, StylePatch};
use crate::transform::AxisTransform;

/// Flattening tolerance for curved outlines, in pixels.
const PATH_TOLERANCE: f64 = 0.1;

/// Geometry family of a [`Shape`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Exactly one coordinate, drawn as a disc of `style.radius`.
    Point,
    /// Exactly two coordinates, an open segment.
    Line,
    /// Exactly two coordinates, opposite corners of an axis-aligned rectangle.
    Rect,
    /// One or more coordinates, a closed ring.
    Polygon,
}

impl ShapeKind {
    fn check_arity(self, n: usize) -> Result<(), String> {
        let ok = match self {
            Self::Point => n == 1,
            Self::Line | Self::Rect => n == 2,
            Self::Polygon => n >= 1,
        };
        if ok {
            Ok(())
        } else {
            Err(format!("{self:?} cannot have {n} coordinates"))
        }
    }
}

/// A single drawable primitive.
///
/// `coordinate` is the authoritative world-space geometry. `dynamic_coordinate` is the same
/// geometry mapped through the most recently pushed [`AxisTransform`]; it is refreshed on every
/// mutation, so the two never disagree. `bbox` covers the projected geometry, including the
/// point radius.
#[derive(Clone, Debug)]
pub struct Shape {
    id: String,
    kind: ShapeKind,
    coordinate: Vec<Point>,
    dynamic: Vec<Point>,
    transform: AxisTransform,
    bbox: Aabb2D<f64>,
    style: Style,
}

impl Shape {
    /// Build a shape, validating the coordinates for `kind`.
    ///
    /// The shape starts projected through the identity transform.
    pub fn new(
        id: impl Into<String>,
        kind: ShapeKind,
        coordinate: Vec<Point>,
        style: Style,
    ) -> Result<Self, Error> {
        let id = id.into();
        validate(&id, kind, &coordinate)?;
        let mut shape = Self {
            id,
            kind,
            dynamic: Vec::with_capacity(coordinate.len()),
            coordinate,
            transform: AxisTransform::IDENTITY,
            bbox: Aabb2D::from_point(0.0, 0.0),
            style: style.sanitized(),
        };
        shape.reproject();
        Ok(shape)
    }

    /// A point marker.
    pub fn point(id: impl Into<String>, at: Point, style: Style) -> Result<Self, Error> {
        Self::new(id, ShapeKind::Point, vec![at], style)
    }

    /// A segment from `a` to `b`.
    pub fn line(id: impl Into<String>, a: Point, b: Point, style: Style) -> Result<Self, Error> {
        Self::new(id, ShapeKind::Line, vec![a, b], style)
    }

    /// An axis-aligned rectangle spanned by two opposite corners.
    pub fn rect(id: impl Into<String>, a: Point, b: Point, style: Style) -> Result<Self, Error> {
        Self::new(id, ShapeKind::Rect, vec![a, b], style)
    }

    /// A closed polygon.
    pub fn polygon(
        id: impl Into<String>,
        points: Vec<Point>,
        style: Style,
    ) -> Result<Self, Error> {
        Self::new(id, ShapeKind::Polygon, points, style)
    }

    /// Same shape under another id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Identifier, unique among the siblings of a group.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Geometry family.
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// World-space coordinates.
    pub fn coordinate(&self) -> &[Point] {
        &self.coordinate
    }

    /// Screen-space coordinates under the last projected transform.
    pub fn dynamic_coordinate(&self) -> &[Point] {
        &self.dynamic
    }

    /// Screen-space bounds.
    pub fn bbox(&self) -> Aabb2D<f64> {
        self.bbox
    }

    /// Screen-space bounds as a kurbo rect.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.bbox.min_x, self.bbox.min_y, self.bbox.max_x, self.bbox.max_y)
    }

    /// Current style.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// The transform the dynamic coordinates were computed with.
    pub fn transform(&self) -> &AxisTransform {
        &self.transform
    }

    /// Distance beyond the bounds at which [`is_under_cursor`](Self::is_under_cursor) may
    /// still report a hit.
    pub fn hit_slop(&self, threshold: f64) -> f64 {
        threshold.max(0.0) + self.style.stroke_width
    }

    /// Bounds grown by the hit slop; what the spatial index stores.
    pub fn index_box(&self, threshold: f64) -> Aabb2D<f64> {
        self.bbox.inflate(self.hit_slop(threshold))
    }

    /// Recompute screen geometry for a new transform.
    pub fn project(&mut self, transform: &AxisTransform) {
        self.transform = *transform;
        self.reproject();
    }

    /// Replace every world coordinate.
    ///
    /// On error the shape is left unchanged.
    pub fn set_coordinates(&mut self, coordinate: Vec<Point>) -> Result<(), Error> {
        validate(&self.id, self.kind, &coordinate)?;
        self.coordinate = coordinate;
        self.reproject();
        Ok(())
    }

    /// Move a single vertex.
    pub fn set_coordinate(&mut self, index: usize, p: Point) -> Result<(), Error> {
        if !p.is_finite() {
            return Err(Error::geometry(&self.id, format!("coordinate {index} is not finite")));
        }
        let len = self.coordinate.len();
        let Some(slot) = self.coordinate.get_mut(index) else {
            return Err(Error::geometry(
                &self.id,
                format!("vertex {index} out of range for {len} coordinates"),
            ));
        };
        *slot = p;
        self.reproject();
        Ok(())
    }

    /// Translate in world space.
    pub fn translate(&mut self, delta: Vec2) {
        if !delta.is_finite() {
            log::warn!("ignoring non-finite translation of `{}`", self.id);
            return;
        }
        for p in &mut self.coordinate {
            *p += delta;
        }
        self.reproject();
    }

    /// Replace the style.
    pub fn set_style(&mut self, style: Style) {
        self.style = style.sanitized();
        self.reproject();
    }

    /// Shallow-merge `patch` into the style.
    pub fn update_style(&mut self, patch: &StylePatch) {
        self.set_style(self.style.merge(patch));
    }

    /// Precise pick test against a screen-space point.
    ///
    /// Segments and polygon edges hit within `threshold + stroke_width / 2`; points hit within
    /// `threshold + radius + stroke_width` of their center; rectangles hit on containment
    /// (boundary included); polygons also hit anywhere inside.
    pub fn is_under_cursor(&self, p: Point, threshold: f64) -> bool {
        let threshold = threshold.max(0.0);
        let half = self.style.stroke_width / 2.0;
        let d = &self.dynamic;
        match self.kind {
            ShapeKind::Point => {
                (p - d[0]).hypot() < threshold + self.style.radius + self.style.stroke_width
            }
            ShapeKind::Line => segment_distance(p, d[0], d[1]) < threshold + half,
            ShapeKind::Rect => {
                let r = Aabb2D::from_points([(d[0].x, d[0].y), (d[1].x, d[1].y)]);
                r.is_some_and(|r| r.contains_point(p.x, p.y))
            }
            ShapeKind::Polygon => {
                if d.len() == 1 {
                    return (p - d[0]).hypot() < threshold + half;
                }
                let near_edge = d
                    .iter()
                    .zip(d.iter().cycle().skip(1))
                    .any(|(a, b)| segment_distance(p, *a, *b) < threshold + half);
                near_edge || (d.len() >= 3 && self.path().contains(p))
            }
        }
    }

    /// Screen-space outline.
    pub fn path(&self) -> BezPath {
        let d = &self.dynamic;
        match self.kind {
            ShapeKind::Point => Circle::new(d[0], self.style.radius).to_path(PATH_TOLERANCE),
            ShapeKind::Line => {
                let mut path = BezPath::new();
                path.move_to(d[0]);
                path.line_to(d[1]);
                path
            }
            ShapeKind::Rect => Rect::from_points(d[0], d[1]).to_path(PATH_TOLERANCE),
            ShapeKind::Polygon => {
                let mut path = BezPath::new();
                path.move_to(d[0]);
                for p in &d[1..] {
                    path.line_to(*p);
                }
                path.close_path();
                path
            }
        }
    }

    /// Paint into `ctx` using the current style.
    pub fn render(&self, ctx: &mut dyn RenderContext) {
        let style = &self.style;
        let path = self.path();
        let stroke = style.stroke.multiply_alpha(style.opacity);
        let fill = style.fill.map(|c| c.multiply_alpha(style.opacity));
        let outline = style.stroke_width > 0.0;
        match self.kind {
            ShapeKind::Point => {
                ctx.fill(&path, fill.unwrap_or(stroke));
                if fill.is_some() && outline {
                    ctx.stroke(&path, stroke, style.stroke_width);
                }
            }
            ShapeKind::Line => {
                if outline {
                    ctx.stroke(&path, stroke, style.stroke_width);
                }
            }
            ShapeKind::Rect | ShapeKind::Polygon => {
                if let Some(fill) = fill {
                    ctx.fill(&path, fill);
                }
                if outline {
                    ctx.stroke(&path, stroke, style.stroke_width);
                }
            }
        }
    }

    fn reproject(&mut self) {
        let t = self.transform;
        self.dynamic.clear();
        self.dynamic.extend(self.coordinate.iter().map(|p| t.to_screen(*p)));
        let bbox = Aabb2D::from_points(self.dynamic.iter().map(|p| (p.x, p.y)))
            .unwrap_or(Aabb2D::from_point(0.0, 0.0));
        self.bbox = match self.kind {
            ShapeKind::Point => bbox.inflate(self.style.radius),
            _ => bbox,
        };
    }
}

fn validate(id: &str, kind: ShapeKind, coordinate: &[Point]) -> Result<(), Error> {
    if coordinate.is_empty() {
        return Err(Error::geometry(id, "no coordinates"));
    }
    kind.check_arity(coordinate.len())
        .map_err(|reason| Error::geometry(id, reason))?;
    if let Some(i) = coordinate.iter().position(|p| !p.is_finite()) {
        return Err(Error::geometry(id, format!("coordinate {i} is not finite")));
    }
    Ok(())
}

/// Euclidean distance from `p` to the closed segment `a..b`.
pub(crate) fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    Line::new(a, b).nearest(p, 1e-9).distance_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DisplayList, DrawCommand};
    use crate::style::Color;

    fn seg() -> Shape {
        Shape::line("l", Point::new(0.0, 0.0), Point::new(10.0, 0.0), Style::default()).unwrap()
    }

    #[test]
    fn line_hit_within_threshold() {
        let s = seg();
        assert!(s.is_under_cursor(Point::new(5.0, 1.0), 2.0));
        assert!(!s.is_under_cursor(Point::new(5.0, 5.0), 2.0));
    }

    #[test]
    fn line_threshold_boundary() {
        let s = seg();
        // threshold 2 plus half of the default stroke width 2.
        let edge = 3.0;
        assert!(s.is_under_cursor(Point::new(5.0, edge - 1e-6), 2.0));
        assert!(!s.is_under_cursor(Point::new(5.0, edge + 1e-6), 2.0));
        // Past the endpoint the distance is to the endpoint, not the infinite line.
        assert!(!s.is_under_cursor(Point::new(14.0, 0.0), 2.0));
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let (a, b) = (Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(segment_distance(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(segment_distance(Point::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(segment_distance(Point::new(-3.0, -4.0), a, b), 5.0);
        // A zero-length segment measures to its only point.
        assert_eq!(segment_distance(Point::new(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn point_hit_after_zoom() {
        let mut p = Shape::point("p", Point::new(10.0, 10.0), Style::default()).unwrap();
        let mut t = AxisTransform::default();
        t.set_scale(2.0);
        p.project(&t);
        assert_eq!(p.dynamic_coordinate(), &[Point::new(20.0, 20.0)]);
        assert!(p.is_under_cursor(Point::new(21.0, 21.0), 2.0));
        assert!(!p.is_under_cursor(Point::new(30.0, 30.0), 2.0));
        assert_eq!(p.bbox(), Aabb2D::new(17.0, 17.0, 23.0, 23.0));
    }

    #[test]
    fn rect_hits_on_containment() {
        let r = Shape::rect("r", Point::new(10.0, 10.0), Point::new(0.0, 0.0), Style::default())
            .unwrap();
        assert!(r.is_under_cursor(Point::new(5.0, 5.0), 0.0));
        assert!(r.is_under_cursor(Point::new(10.0, 0.0), 0.0));
        assert!(!r.is_under_cursor(Point::new(11.0, 5.0), 0.0));
    }

    #[test]
    fn polygon_hits_inside_and_near_closing_edge() {
        let tri = Shape::polygon(
            "t",
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)],
            Style::default(),
        )
        .unwrap();
        assert!(tri.is_under_cursor(Point::new(2.0, 2.0), 0.0));
        // Near the closing edge (0,10)->(0,0), outside the interior.
        assert!(tri.is_under_cursor(Point::new(-1.5, 5.0), 1.0));
        assert!(!tri.is_under_cursor(Point::new(8.0, 8.0), 1.0));
    }

    #[test]
    fn arity_and_finiteness_are_enforced() {
        let s = Style::default();
        assert!(Shape::new("a", ShapeKind::Line, vec![Point::ZERO], s).is_err());
        assert!(Shape::new("b", ShapeKind::Polygon, vec![], s).is_err());
        assert!(Shape::new("c", ShapeKind::Point, vec![Point::new(f64::NAN, 0.0)], s).is_err());
        let err = Shape::new("d", ShapeKind::Rect, vec![Point::ZERO; 3], s).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { ref id, .. } if id == "d"));
    }

    #[test]
    fn failed_edit_leaves_shape_untouched() {
        let mut s = seg();
        assert!(s.set_coordinates(vec![Point::ZERO]).is_err());
        assert!(s.set_coordinate(5, Point::ZERO).is_err());
        assert_eq!(s.coordinate(), &[Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
    }

    #[test]
    fn edits_keep_projection_in_sync() {
        let mut s = seg();
        let mut t = AxisTransform::default();
        t.pan(Vec2::new(100.0, 0.0));
        s.project(&t);
        s.set_coordinate(1, Point::new(20.0, 0.0)).unwrap();
        assert_eq!(s.dynamic_coordinate()[1], Point::new(120.0, 0.0));
        s.translate(Vec2::new(0.0, 5.0));
        assert_eq!(s.bbox(), Aabb2D::new(100.0, 5.0, 120.0, 5.0));
    }

    #[test]
    fn index_box_covers_every_hit() {
        let s = seg();
        let b = s.index_box(2.0);
        assert!(b.contains_point(5.0, 2.99));
        assert!(b.contains_point(-2.99, 0.0));
    }

    #[test]
    fn render_uses_fill_then_stroke() {
        let style = Style {
            fill: Some(Color::WHITE),
            stroke: Color::rgb(255, 0, 0),
            opacity: 0.5,
            ..Style::default()
        };
        let r = Shape::rect("r", Point::ZERO, Point::new(4.0, 4.0), style).unwrap();
        let mut dl = DisplayList::new();
        r.render(&mut dl);
        assert_eq!(dl.len(), 2);
        assert!(matches!(dl.commands[0], DrawCommand::Fill { color, .. } if color.a == 128));
        assert!(matches!(dl.commands[1], DrawCommand::Stroke { width, .. } if width == 2.0));
    }
}
