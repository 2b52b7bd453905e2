// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup Canvas: a kurbo-native surface for interactive 2D annotation.
//!
//! - [`AxisTransform`]: uniform pan/zoom mapping between world and screen space.
//! - [`Shape`]: a point, segment, rectangle, or polygon with world coordinates, cached screen
//!   coordinates, bounds, a [`Style`], and a precise pick test.
//! - [`Group`]: an ordered, non-empty set of shapes with a unioned bounding box and an
//!   [`EventBus`] of [`GroupEvent`]s.
//! - [`Surface`]: owns top-level [`Drawable`]s, keeps a [`markup_index`] R-tree of their
//!   screen-space boxes, orders them by insertion, and answers hit queries topmost-first.
//! - [`RenderContext`]: the drawing seam; [`DisplayList`] records commands for retained
//!   renderers and tests.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Point;
//! use markup_canvas::{AxisTransform, Shape, Style, Surface};
//!
//! let mut surface = Surface::new(AxisTransform::default());
//! let line = Shape::line("l", Point::new(0.0, 0.0), Point::new(10.0, 0.0), Style::default())?;
//! let id = surface.insert(line)?;
//!
//! assert_eq!(surface.hit_test(Point::new(5.0, 1.0)), Some(id));
//! assert_eq!(surface.hit_test(Point::new(5.0, 5.0)), None);
//!
//! // Zooming reprojects immediately; picking happens in screen space.
//! surface.zoom_at(Point::ZERO, 2.0);
//! assert_eq!(surface.hit_test(Point::new(18.0, 1.0)), Some(id));
//! # Ok::<(), markup_canvas::Error>(())
//! ```
//!
//! The surface is single-threaded: nothing here is `Send`, and group listeners run
//! synchronously.

pub mod bus;
pub mod error;
pub mod group;
pub mod render;
pub mod shape;
pub mod style;
pub mod surface;
pub mod transform;
pub mod types;

pub use bus::{EventBus, Subscription};
pub use error::Error;
pub use group::{Group, GroupEvent};
pub use render::{DisplayList, DrawCommand, RenderContext};
pub use shape::{Shape, ShapeKind};
pub use style::{Color, ParseColorError, Style, StylePatch};
pub use surface::{DEFAULT_HIT_THRESHOLD, Damage, Drawable, Surface};
pub use transform::AxisTransform;
pub use types::{DrawableFlags, DrawableId};
