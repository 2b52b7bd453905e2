// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pan/zoom transform between world and screen coordinates.

use kurbo::{Affine, Point, Vec2};

/// Default lower zoom bound.
pub const DEFAULT_MIN_SCALE: f64 = 0.1;
/// Default upper zoom bound.
pub const DEFAULT_MAX_SCALE: f64 = 20.0;

/// A uniform scale followed by a translation: `screen = world * scale + offset`.
///
/// The scale is always clamped to `[min_scale, max_scale]`. Mutators return `true` when the
/// transform actually changed, so callers can skip reprojection and notifications on no-ops.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisTransform {
    offset: Vec2,
    scale: f64,
    min_scale: f64,
    max_scale: f64,
}

impl Default for AxisTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AxisTransform {
    /// Unit scale, zero offset, default zoom bounds.
    pub const IDENTITY: Self = Self {
        offset: Vec2::ZERO,
        scale: 1.0,
        min_scale: DEFAULT_MIN_SCALE,
        max_scale: DEFAULT_MAX_SCALE,
    };

    /// Identity transform with custom zoom bounds.
    ///
    /// Bounds are sanitized: non-finite or non-positive values fall back to the defaults,
    /// and swapped bounds are reordered. Unit scale is clamped into the bounds.
    pub fn with_limits(min_scale: f64, max_scale: f64) -> Self {
        let sane = |v: f64, fallback: f64| {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                log::warn!("ignoring invalid zoom bound {v}, using {fallback}");
                fallback
            }
        };
        let a = sane(min_scale, DEFAULT_MIN_SCALE);
        let b = sane(max_scale, DEFAULT_MAX_SCALE);
        let (min_scale, max_scale) = if a <= b { (a, b) } else { (b, a) };
        Self {
            offset: Vec2::ZERO,
            scale: 1.0_f64.clamp(min_scale, max_scale),
            min_scale,
            max_scale,
        }
    }

    /// Current scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current translation in screen units.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// `(min_scale, max_scale)`.
    pub fn limits(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    /// Map a world point to screen space.
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.offset.x, p.y * self.scale + self.offset.y)
    }

    /// Map a screen point back to world space.
    pub fn to_world(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset.x) / self.scale,
            (p.y - self.offset.y) / self.scale,
        )
    }

    /// Map a screen-space displacement (for example a drag delta) to world space.
    pub fn to_world_vec(&self, v: Vec2) -> Vec2 {
        v / self.scale
    }

    /// Map a world-space displacement to screen space.
    pub fn to_screen_vec(&self, v: Vec2) -> Vec2 {
        v * self.scale
    }

    /// The transform as a kurbo [`Affine`], for renderers that want to push it down.
    pub fn affine(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Translate by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) -> bool {
        if !delta.is_finite() || delta == Vec2::ZERO {
            return false;
        }
        self.offset += delta;
        true
    }

    /// Multiply the scale by `factor`, keeping the world point under `focal` (screen space)
    /// fixed on screen.
    ///
    /// The resulting scale is clamped; zooming past a bound stops at the bound.
    pub fn zoom_at(&mut self, focal: Point, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 || !focal.is_finite() {
            log::warn!("ignoring zoom by {factor} at {focal:?}");
            return false;
        }
        let anchor = self.to_world(focal);
        let scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if scale == self.scale {
            return false;
        }
        self.scale = scale;
        self.offset = focal.to_vec2() - anchor.to_vec2() * scale;
        true
    }

    /// Set the scale directly, keeping the world origin fixed on screen.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("ignoring scale {scale}");
            return false;
        }
        self.zoom_at(Point::new(self.offset.x, self.offset.y), scale / self.scale)
    }

    /// Replace offset and scale at once. The scale is clamped.
    pub fn set(&mut self, offset: Vec2, scale: f64) -> bool {
        if !offset.is_finite() || !scale.is_finite() || scale <= 0.0 {
            log::warn!("ignoring transform offset={offset:?} scale={scale}");
            return false;
        }
        let scale = scale.clamp(self.min_scale, self.max_scale);
        if offset == self.offset && scale == self.scale {
            return false;
        }
        self.offset = offset;
        self.scale = scale;
        true
    }

    /// Back to unit scale and zero offset; bounds are kept.
    pub fn reset(&mut self) -> bool {
        let scale = 1.0_f64.clamp(self.min_scale, self.max_scale);
        self.set(Vec2::ZERO, scale)
    }
}
