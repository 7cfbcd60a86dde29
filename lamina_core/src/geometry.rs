// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer pixel geometry and colors.

use kurbo::Rect;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Coordinates this close to a whole pixel are treated as exact.
const SNAP_EPSILON: f64 = 1e-6;

/// A size in whole pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Size {
    /// Creates a new size.
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero or negative.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// An axis-aligned rectangle in whole pixels, top-left origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl IntRect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Creates a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle at the origin with the given size.
    #[inline]
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Right edge (exclusive), saturating at `i32::MAX`.
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive), saturating at `i32::MAX`.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Returns the smallest rectangle containing both `self` and `other`.
    ///
    /// Empty rectangles do not contribute.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Returns the overlap of `self` and `other`, or [`EMPTY`](Self::EMPTY).
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            Self::EMPTY
        } else {
            Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
        }
    }

    /// Converts a float rectangle to whole pixels, rounding outward.
    ///
    /// Edges within a rounding error of a pixel boundary snap to it.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "screen coordinates are far inside i32 range; `as` saturates otherwise"
    )]
    pub fn from_kurbo_outward(rect: Rect) -> Self {
        if !rect.is_finite() || rect.is_zero_area() {
            return Self::EMPTY;
        }
        let snap = |v: f64| {
            let r = v.round();
            if (v - r).abs() < SNAP_EPSILON { r } else { v }
        };
        let r = rect.abs();
        let r = Rect::new(snap(r.x0), snap(r.y0), snap(r.x1), snap(r.y1)).expand();
        let x0 = r.x0 as i32;
        let y0 = r.y0 as i32;
        let x1 = r.x1 as i32;
        let y1 = r.y1 as i32;
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

/// A straight-alpha RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a color with alpha.
    #[inline]
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from a `0xRRGGBB` value.
    #[must_use]
    pub fn from_rgb_u32(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// Returns `true` if the alpha channel is fully opaque.
    #[inline]
    #[must_use]
    pub fn is_opaque(self) -> bool {
        self.a >= 1.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_ignores_empty() {
        let a = IntRect::new(10, 10, 5, 5);
        assert_eq!(a.union(IntRect::EMPTY), a);
        assert_eq!(IntRect::EMPTY.union(a), a);
        assert_eq!(
            a.union(IntRect::new(0, 12, 2, 10)),
            IntRect::new(0, 10, 15, 12)
        );
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(20, 20, 5, 5);
        assert!(a.intersect(b).is_empty());
        assert_eq!(
            a.intersect(IntRect::new(5, -5, 10, 10)),
            IntRect::new(5, 0, 5, 5)
        );
    }

    #[test]
    fn edges_saturate_near_i32_max() {
        let far = IntRect::new(i32::MAX - 5, i32::MAX - 2, 10, 10);
        assert_eq!(far.right(), i32::MAX);
        assert_eq!(far.bottom(), i32::MAX);
        assert!(far.intersect(IntRect::new(0, 0, 100, 100)).is_empty());
        assert_eq!(
            far.intersect(IntRect::new(i32::MAX - 10, i32::MAX - 10, 8, 20)),
            IntRect::new(i32::MAX - 5, i32::MAX - 2, 3, 2)
        );
        let wide = IntRect::new(i32::MIN, 0, 10, 10).union(far);
        assert_eq!(wide.x, i32::MIN);
        assert_eq!(wide.width, i32::MAX);
    }

    #[test]
    fn outward_rounding() {
        let r = IntRect::from_kurbo_outward(Rect::new(0.5, 1.2, 10.1, 20.9));
        assert_eq!(r, IntRect::new(0, 1, 11, 20));
        assert_eq!(
            IntRect::from_kurbo_outward(Rect::new(3.0, 3.0, 3.0, 9.0)),
            IntRect::EMPTY
        );
    }

    #[test]
    fn color_from_u32() {
        let c = Color::from_rgb_u32(0xff_80_00);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert!(c.is_opaque());
        assert!(!Color::rgba(0.0, 0.0, 0.0, 0.5).is_opaque());
    }
}
