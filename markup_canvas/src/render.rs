// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing backend seam.

use kurbo::BezPath;

use crate::style::Color;

/// A 2D drawing context that shapes paint into.
///
/// Paths arrive in screen space; the surface has already applied its transform.
/// Colors already carry the shape's opacity.
pub trait RenderContext {
    /// Fill the interior of `path`.
    fn fill(&mut self, path: &BezPath, color: Color);

    /// Stroke the outline of `path` with a line of `width` pixels.
    fn stroke(&mut self, path: &BezPath, color: Color, width: f64);
}

/// A recorded drawing command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// See [`RenderContext::fill`].
    Fill {
        /// Path to fill.
        path: BezPath,
        /// Fill color.
        color: Color,
    },
    /// See [`RenderContext::stroke`].
    Stroke {
        /// Path to stroke.
        path: BezPath,
        /// Stroke color.
        color: Color,
        /// Line width in pixels.
        width: f64,
    },
}

/// A [`RenderContext`] that records commands in paint order.
///
/// Useful for retained renderers and for tests.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    /// Commands in the order they were issued.
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl RenderContext for DisplayList {
    fn fill(&mut self, path: &BezPath, color: Color) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            color,
        });
    }

    fn stroke(&mut self, path: &BezPath, color: Color, width: f64) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            color,
            width,
        });
    }
}
