// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colors and stroke/fill styles.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An 8-bit RGBA color.
///
/// Serializes as a hex string (`#rrggbb`, or `#rrggbbaa` when not opaque). Parsing also
/// accepts the short forms `#rgb` and `#rgba`; the leading `#` is optional.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha, `255` is opaque.
    pub a: u8,
}

/// A string that is not a hex color.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid color `{0}`")]
pub struct ParseColorError(pub String);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Color from components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Scale alpha by `opacity` (clamped to `[0, 1]`).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is clamped to 0..=255 before the cast"
    )]
    pub fn multiply_alpha(self, opacity: f64) -> Self {
        let o = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        self.with_alpha((f64::from(self.a) * o).round() as u8)
    }

    /// Parse a hex color.
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let err = || ParseColorError(s.to_owned());
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map_err(|_| err());
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        match hex.len() {
            3 | 4 => {
                let mut c = [0_u8, 0, 0, 255];
                for (i, slot) in c.iter_mut().enumerate().take(hex.len()) {
                    *slot = nibble(i)? * 17;
                }
                Ok(Self::rgba(c[0], c[1], c[2], c[3]))
            }
            6 | 8 => {
                let a = if hex.len() == 8 { byte(6)? } else { 255 };
                Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, a))
            }
            _ => Err(err()),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// Visual style of a shape.
///
/// `radius` only applies to points. Stroke width and radius are in screen pixels and do not
/// scale with zoom.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Outline color.
    pub stroke: Color,
    /// Interior color; `None` leaves closed shapes unfilled.
    pub fill: Option<Color>,
    /// Outline width.
    pub stroke_width: f64,
    /// Point marker radius.
    pub radius: f64,
    /// Multiplies the alpha of both stroke and fill.
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Color::BLACK,
            fill: None,
            stroke_width: 2.0,
            radius: 3.0,
            opacity: 1.0,
        }
    }
}

impl Style {
    /// Copy of `self` with every field set in `patch` overridden.
    #[must_use]
    pub fn merge(&self, patch: &StylePatch) -> Self {
        let mut out = *self;
        out.apply(patch);
        out
    }

    /// Override the fields set in `patch`.
    pub fn apply(&mut self, patch: &StylePatch) {
        if let Some(c) = patch.stroke {
            self.stroke = c;
        }
        if let Some(c) = patch.fill {
            self.fill = Some(c);
        }
        if let Some(w) = patch.stroke_width {
            self.stroke_width = w;
        }
        if let Some(r) = patch.radius {
            self.radius = r;
        }
        if let Some(o) = patch.opacity {
            self.opacity = o;
        }
    }

    /// Same style with non-finite or negative sizes replaced by the defaults.
    pub(crate) fn sanitized(mut self) -> Self {
        let d = Self::default();
        if !(self.stroke_width.is_finite() && self.stroke_width >= 0.0) {
            log::warn!("invalid stroke width {}, using {}", self.stroke_width, d.stroke_width);
            self.stroke_width = d.stroke_width;
        }
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            log::warn!("invalid radius {}, using {}", self.radius, d.radius);
            self.radius = d.radius;
        }
        if !self.opacity.is_finite() {
            self.opacity = d.opacity;
        }
        self
    }
}

/// A partial [`Style`]: unset fields leave the base untouched.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePatch {
    /// Outline color override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    /// Fill override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    /// Outline width override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Point radius override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Opacity override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl StylePatch {
    /// Patch that only sets the stroke color.
    pub fn stroke(color: Color) -> Self {
        Self {
            stroke: Some(color),
            ..Self::default()
        }
    }

    /// Combine two patches; fields set in `other` win.
    #[must_use]
    pub fn then(self, other: &Self) -> Self {
        Self {
            stroke: other.stroke.or(self.stroke),
            fill: other.fill.or(self.fill),
            stroke_width: other.stroke_width.or(self.stroke_width),
            radius: other.radius.or(self.radius),
            opacity: other.opacity.or(self.opacity),
        }
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!("#000".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!(Color::from_hex("#f00").unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(Color::from_hex("0f08").unwrap(), Color::rgba(0, 255, 0, 136));
        assert_eq!(Color::from_hex("#1e90ff").unwrap(), Color::rgb(30, 144, 255));
        assert_eq!(
            Color::from_hex("#1e90ff80").unwrap(),
            Color::rgba(30, 144, 255, 128)
        );
        for bad in ["", "#", "#12", "#12345", "#gggggg", "#ééé"] {
            assert!(Color::from_hex(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn display_is_lowercase_hex() {
        assert_eq!(Color::rgb(30, 144, 255).to_string(), "#1e90ff");
        assert_eq!(Color::rgba(0, 0, 0, 0).to_string(), "#00000000");
    }

    #[test]
    fn color_serde_uses_strings() {
        let json = serde_json::to_string(&Color::rgb(255, 0, 0)).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let c: Color = serde_json::from_str("\"#0f0\"").unwrap();
        assert_eq!(c, Color::rgb(0, 255, 0));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }

    #[test]
    fn patch_overrides_only_set_fields() {
        let base = Style::default();
        let patch = StylePatch {
            stroke_width: Some(5.0),
            fill: Some(Color::WHITE),
            ..StylePatch::default()
        };
        let merged = base.merge(&patch);
        assert_eq!(merged.stroke, base.stroke);
        assert_eq!(merged.stroke_width, 5.0);
        assert_eq!(merged.fill, Some(Color::WHITE));
        assert_eq!(merged.radius, base.radius);
    }

    #[test]
    fn later_patch_wins() {
        let a = StylePatch::stroke(Color::WHITE);
        let b = StylePatch::stroke(Color::BLACK);
        assert_eq!(a.then(&b).stroke, Some(Color::BLACK));
        assert!(StylePatch::default().is_empty());
    }

    #[test]
    fn opacity_scales_alpha() {
        assert_eq!(Color::WHITE.multiply_alpha(0.5).a, 128);
        assert_eq!(Color::WHITE.multiply_alpha(3.0).a, 255);
    }

    #[test]
    fn sanitize_replaces_bad_sizes() {
        let s = Style {
            stroke_width: f64::NAN,
            radius: -1.0,
            ..Style::default()
        }
        .sanitized();
        assert_eq!(s.stroke_width, 2.0);
        assert_eq!(s.radius, 3.0);
    }
}
