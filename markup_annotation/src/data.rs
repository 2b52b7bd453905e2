// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed annotation payloads and the serializable record.

use kurbo::{Point, Vec2};
use markup_canvas::{Drawable, Group, Shape, Style};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Geometry (or text) of an annotation, in world coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationData {
    /// A single point.
    Point {
        /// World x.
        x: f64,
        /// World y.
        y: f64,
    },
    /// An open polyline of at least two distinct points, drawn as a group of segments.
    Line {
        /// Vertices in order.
        points: Vec<Point>,
    },
    /// An axis-aligned rectangle with positive size.
    Rect {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width, greater than zero.
        width: f64,
        /// Height, greater than zero.
        height: f64,
    },
    /// A closed polygon of at least three points.
    Polygon {
        /// Vertices in order; the closing edge is implicit.
        points: Vec<Point>,
    },
    /// Whole-sample tags. No geometry.
    Tag {
        /// Tag values.
        values: Vec<String>,
    },
    /// Free text. No geometry.
    Text {
        /// The text.
        value: String,
    },
}

impl AnnotationData {
    /// Lowercase variant name, as used in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point { .. } => "point",
            Self::Line { .. } => "line",
            Self::Rect { .. } => "rect",
            Self::Polygon { .. } => "polygon",
            Self::Tag { .. } => "tag",
            Self::Text { .. } => "text",
        }
    }

    /// Whether this variant is drawn on the canvas.
    pub fn is_spatial(&self) -> bool {
        !matches!(self, Self::Tag { .. } | Self::Text { .. })
    }

    /// Rectangle spanned by two corners, normalized to positive size.
    pub fn rect_from_corners(a: Point, b: Point) -> Self {
        Self::Rect {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Check the geometry is drawable and meaningful.
    pub fn validate(&self, id: &str) -> Result<(), Error> {
        let bad = |reason: &str| {
            Err(Error::Canvas(markup_canvas::Error::InvalidGeometry {
                id: id.to_owned(),
                reason: reason.to_owned(),
            }))
        };
        if !self.vertices().iter().all(|p| p.is_finite()) {
            return bad("coordinates must be finite");
        }
        match self {
            Self::Point { .. } | Self::Tag { .. } | Self::Text { .. } => Ok(()),
            Self::Line { points } => {
                if points.len() < 2 {
                    bad("a line needs at least two points")
                } else if points.iter().all(|p| *p == points[0]) {
                    bad("a line needs two distinct points")
                } else {
                    Ok(())
                }
            }
            Self::Rect { width, height, .. } => {
                if *width > 0.0 && *height > 0.0 {
                    Ok(())
                } else {
                    bad("a rectangle needs a positive width and height")
                }
            }
            Self::Polygon { points } => {
                if points.len() < 3 {
                    bad("a polygon needs at least three points")
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Editable vertices. Rectangles report their four corners clockwise from top-left.
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            Self::Point { x, y } => vec![Point::new(*x, *y)],
            Self::Line { points } | Self::Polygon { points } => points.clone(),
            Self::Rect {
                x,
                y,
                width,
                height,
            } => vec![
                Point::new(*x, *y),
                Point::new(x + width, *y),
                Point::new(x + width, y + height),
                Point::new(*x, y + height),
            ],
            Self::Tag { .. } | Self::Text { .. } => Vec::new(),
        }
    }

    /// Move vertex `index` to `p`. Dragging a rectangle corner keeps the opposite corner.
    ///
    /// Returns `false` if the index is out of range or the variant has no geometry.
    pub fn set_vertex(&mut self, index: usize, p: Point) -> bool {
        match self {
            Self::Point { x, y } if index == 0 => {
                *x = p.x;
                *y = p.y;
                true
            }
            Self::Line { points } | Self::Polygon { points } => match points.get_mut(index) {
                Some(slot) => {
                    *slot = p;
                    true
                }
                None => false,
            },
            Self::Rect { .. } if index < 4 => {
                let opposite = self.vertices()[(index + 2) % 4];
                *self = Self::rect_from_corners(p, opposite);
                true
            }
            _ => false,
        }
    }

    /// Translate every vertex.
    pub fn translate(&mut self, d: Vec2) {
        match self {
            Self::Point { x, y } | Self::Rect { x, y, .. } => {
                *x += d.x;
                *y += d.y;
            }
            Self::Line { points } | Self::Polygon { points } => {
                for p in points {
                    *p += d;
                }
            }
            Self::Tag { .. } | Self::Text { .. } => {}
        }
    }

    /// Build the drawable for this geometry, or `None` for tags and text.
    ///
    /// Lines become a group with one segment shape per edge, named `{id}-seg-{i}`.
    pub fn to_drawable(&self, id: &str, style: Style) -> Result<Option<Drawable>, Error> {
        let drawable: Drawable = match self {
            Self::Point { x, y } => Shape::point(id, Point::new(*x, *y), style)?.into(),
            Self::Rect {
                x,
                y,
                width,
                height,
            } => Shape::rect(
                id,
                Point::new(*x, *y),
                Point::new(x + width, y + height),
                style,
            )?
            .into(),
            Self::Polygon { points } => Shape::polygon(id, points.clone(), style)?.into(),
            Self::Line { points } => Group::new(id, segments(id, points, style)?)?.into(),
            Self::Tag { .. } | Self::Text { .. } => return Ok(None),
        };
        Ok(Some(drawable))
    }

    /// Push this geometry into an existing drawable of the same shape, in place.
    ///
    /// Only segments whose endpoints moved are touched, so group listeners see one
    /// `ShapeChanged` per edited edge. Fails if the vertex count no longer matches.
    pub fn sync(&self, drawable: &mut Drawable) -> Result<(), Error> {
        match (self, drawable) {
            (Self::Line { points }, Drawable::Group(group)) => {
                if group.len() + 1 != points.len() {
                    return Err(mismatch(group.id()));
                }
                let ids: Vec<String> = group.iter().map(|s| s.id().to_owned()).collect();
                for (seg_id, pair) in ids.iter().zip(points.windows(2)) {
                    let current = group.get(seg_id).map(|s| s.coordinate().to_vec());
                    if current.as_deref() == Some(pair) {
                        continue;
                    }
                    if let Some(result) = group.update(seg_id, |s| s.set_coordinates(pair.to_vec()))
                    {
                        result?;
                    }
                }
                Ok(())
            }
            (Self::Line { .. }, other) => Err(mismatch(other.id())),
            (data, Drawable::Shape(shape)) => {
                let coords = match data {
                    Self::Rect {
                        x,
                        y,
                        width,
                        height,
                    } => vec![Point::new(*x, *y), Point::new(x + width, y + height)],
                    other => other.vertices(),
                };
                if coords.is_empty() {
                    return Err(mismatch(shape.id()));
                }
                shape.set_coordinates(coords)?;
                Ok(())
            }
            (_, other) => Err(mismatch(other.id())),
        }
    }
}

fn segments(id: &str, points: &[Point], style: Style) -> Result<Vec<Shape>, Error> {
    points
        .windows(2)
        .enumerate()
        .map(|(i, w)| Shape::line(format!("{id}-seg-{i}"), w[0], w[1], style).map_err(Error::from))
        .collect()
}

fn mismatch(id: &str) -> Error {
    Error::Canvas(markup_canvas::Error::InvalidGeometry {
        id: id.to_owned(),
        reason: "drawable does not match the annotation geometry".to_owned(),
    })
}

/// Serializable snapshot of one annotation: id, label, and world-space data.
///
/// The data fields are flattened next to `id` and `label`, with `type` naming the variant:
/// `{"id": "a1", "label": "car", "type": "point", "x": 1.0, "y": 2.0}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Unique id on the stage.
    pub id: String,
    /// Label value, resolved through the label schema for color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Geometry or text.
    #[serde(flatten)]
    pub data: AnnotationData,
}

impl AnnotationRecord {
    /// A record with a label.
    pub fn new(id: impl Into<String>, label: impl Into<String>, data: AnnotationData) -> Self {
        Self {
            id: id.into(),
            label: Some(label.into()),
            data,
        }
    }

    /// A record without a label.
    pub fn unlabeled(id: impl Into<String>, data: AnnotationData) -> Self {
        Self {
            id: id.into(),
            label: None,
            data,
        }
    }
}
