// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage configuration.

use markup_canvas::{AxisTransform, Color, Style, StylePatch};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::label::StyleTiers;

/// Tunables for a [`Stage`](crate::Stage). Every field has a default, so a host can load a
/// partial JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Pick distance in screen pixels.
    pub distance_threshold: f64,
    /// Lowest zoom factor.
    pub min_scale: f64,
    /// Highest zoom factor.
    pub max_scale: f64,
    /// Stroke color for unknown or missing labels.
    pub default_color: Color,
    /// Radius of point markers in pixels.
    pub point_radius: f64,
    /// Outline width in pixels.
    pub stroke_width: f64,
    /// Applied on top of the base style while hovered.
    pub hovered_style: StylePatch,
    /// Applied on top of everything else while selected.
    pub selected_style: StylePatch,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 2.0,
            min_scale: 0.1,
            max_scale: 20.0,
            default_color: Color::BLACK,
            point_radius: 3.0,
            stroke_width: 2.0,
            hovered_style: StylePatch {
                stroke_width: Some(3.0),
                ..StylePatch::default()
            },
            selected_style: StylePatch {
                stroke_width: Some(3.0),
                fill: Some(Color::rgba(30, 144, 255, 64)),
                ..StylePatch::default()
            },
        }
    }
}

impl StageConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// A fresh transform with this configuration's zoom bounds.
    pub fn transform(&self) -> AxisTransform {
        AxisTransform::with_limits(self.min_scale, self.max_scale)
    }

    /// Base style and interaction tiers derived from this configuration.
    pub fn tiers(&self) -> StyleTiers {
        StyleTiers {
            base: Style {
                stroke: self.default_color,
                fill: None,
                stroke_width: self.stroke_width,
                radius: self.point_radius,
                opacity: 1.0,
            },
            hovered: self.hovered_style,
            selected: self.selected_style,
        }
    }
}
