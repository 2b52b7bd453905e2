// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Events published on a stage's bus.

use kurbo::Point;
use markup_canvas::AxisTransform;

/// What happened on a [`Stage`](crate::Stage).
///
/// Ids are annotation ids; look the annotation up on the stage for its data.
#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    /// Pan or zoom changed the view.
    TransformChanged(AxisTransform),
    /// The pointer moved. Published before any hover change it causes.
    PointerMove {
        /// Position in screen space.
        screen: Point,
        /// Position in world space.
        world: Point,
    },
    /// The hovered annotation changed. At most one annotation is hovered at a time.
    HoverChanged {
        /// Previously hovered annotation.
        previous: Option<String>,
        /// Newly hovered annotation.
        current: Option<String>,
    },
    /// The selected annotation changed.
    SelectionChanged {
        /// Previously selected annotation.
        previous: Option<String>,
        /// Newly selected annotation.
        current: Option<String>,
    },
    /// An annotation was added.
    AnnotationAdded(String),
    /// An annotation was removed.
    AnnotationRemoved(String),
    /// An annotation's label or data changed.
    AnnotationChanged(String),
}
