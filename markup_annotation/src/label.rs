// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label schema lookup and interaction-aware style resolution.

use std::collections::HashMap;

use markup_canvas::{Color, Style, StylePatch};
use serde::{Deserialize, Serialize};

/// One entry of a label schema, as the host configures it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDefinition {
    /// Stable key, if the host uses one distinct from `value`.
    #[serde(default)]
    pub key: String,
    /// The value annotations refer to.
    pub value: String,
    /// Hex color. Unparseable colors fall back to the resolver default.
    pub color: String,
    /// Attribute names the host requires for this label. Not validated here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

impl LabelDefinition {
    /// A definition with no attributes, keyed by its value.
    pub fn new(value: impl Into<String>, color: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            key: value.clone(),
            value,
            color: color.into(),
            attributes: Vec::new(),
        }
    }
}

/// Base style plus the interaction overlays.
///
/// Precedence is selected over hovered over base: a selected annotation that is also
/// hovered shows the selected overlay on top of the hovered one.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StyleTiers {
    /// Style when idle. Its stroke is replaced by the label color.
    pub base: Style,
    /// Overlay while hovered.
    pub hovered: StylePatch,
    /// Overlay while selected.
    pub selected: StylePatch,
}

impl StyleTiers {
    /// The active style for the given label color and interaction state.
    pub fn resolve(&self, stroke: Color, hovered: bool, selected: bool) -> Style {
        let mut style = Style {
            stroke,
            ..self.base
        };
        if hovered {
            style.apply(&self.hovered);
        }
        if selected {
            style.apply(&self.selected);
        }
        style
    }
}

/// Maps label values to colors and interaction styles.
///
/// Lookups never fail: an unknown or missing label resolves to the default color so a bad
/// annotation still renders.
#[derive(Clone, Debug)]
pub struct LabelStyleResolver {
    labels: Vec<LabelDefinition>,
    by_value: HashMap<String, usize>,
    colors: Vec<Option<Color>>,
    default_color: Color,
    tiers: StyleTiers,
}

impl Default for LabelStyleResolver {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LabelStyleResolver {
    /// Build from a label schema. Later duplicates of a value are ignored.
    pub fn new(labels: Vec<LabelDefinition>) -> Self {
        let mut resolver = Self {
            labels: Vec::new(),
            by_value: HashMap::new(),
            colors: Vec::new(),
            default_color: Color::BLACK,
            tiers: StyleTiers::default(),
        };
        resolver.set_labels(labels);
        resolver
    }

    /// Use `color` for unknown and missing labels.
    #[must_use]
    pub fn with_default_color(mut self, color: Color) -> Self {
        self.default_color = color;
        self
    }

    /// Use these style tiers in [`style_for`](Self::style_for).
    #[must_use]
    pub fn with_tiers(mut self, tiers: StyleTiers) -> Self {
        self.tiers = tiers;
        self
    }

    /// Replace the schema, keeping the default color and tiers.
    pub fn set_labels(&mut self, labels: Vec<LabelDefinition>) {
        self.by_value.clear();
        self.colors.clear();
        for (i, def) in labels.iter().enumerate() {
            if self.by_value.contains_key(&def.value) {
                log::warn!("duplicate label value `{}` ignored", def.value);
                continue;
            }
            self.by_value.insert(def.value.clone(), i);
        }
        self.colors = labels
            .iter()
            .map(|def| match def.color.parse() {
                Ok(c) => Some(c),
                Err(e) => {
                    log::warn!("label `{}`: {e}, using default color", def.value);
                    None
                }
            })
            .collect();
        self.labels = labels;
    }

    /// The schema, in configuration order.
    pub fn labels(&self) -> &[LabelDefinition] {
        &self.labels
    }

    /// Color for unknown and missing labels.
    pub fn default_color(&self) -> Color {
        self.default_color
    }

    /// Interaction style tiers.
    pub fn tiers(&self) -> &StyleTiers {
        &self.tiers
    }

    /// Schema entry for `value`. A missing value logs a warning and yields `None`.
    pub fn get_label_by_value(&self, value: Option<&str>) -> Option<&LabelDefinition> {
        let Some(value) = value else {
            log::warn!("label lookup without a value");
            return None;
        };
        self.by_value.get(value).map(|&i| &self.labels[i])
    }

    /// Color for `label`, or the default color if it is unknown or missing.
    pub fn get_label_color(&self, label: Option<&str>) -> Color {
        let Some(label) = label else {
            return self.default_color;
        };
        match self.by_value.get(label) {
            Some(&i) => self
                .colors
                .get(i)
                .copied()
                .flatten()
                .unwrap_or(self.default_color),
            None => {
                log::warn!("unknown label `{label}`, using default color");
                self.default_color
            }
        }
    }

    /// The render style for an annotation with `label` in the given interaction state.
    pub fn style_for(&self, label: Option<&str>, hovered: bool, selected: bool) -> Style {
        self.tiers
            .resolve(self.get_label_color(label), hovered, selected)
    }
}
