// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal column-major 4×4 transform.
//!
//! Each actor's model-view maps the unit square onto its on-stage quad. This
//! type covers what the layering and draw passes need (identity, multiply,
//! translation, scale, the tilt perspective, point mapping) without pulling
//! in a full linear-algebra crate.

use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the memory layout
/// GPU APIs expect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Perspective foreshortening applied before the tilt rotation.
    ///
    /// A translate by 0.5 in Y, a simple perspective, and a translate back, so
    /// the foreshortening is centered vertically on the quad.
    const TILT_PERSPECTIVE: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, -0.2, 0.0, -0.4],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Y axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        #[cfg(feature = "std")]
        let (s, c) = radians.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates the tilt transform for a tilt amount in `0.0..=1.0`.
    ///
    /// A tilt of 1.0 swings the quad a quarter turn around its left edge.
    /// Tilts at or below 0.001 yield the identity.
    #[must_use]
    pub fn from_tilt(tilt: f64) -> Self {
        if tilt <= 0.001 {
            return Self::IDENTITY;
        }
        Self::TILT_PERSPECTIVE * Self::from_rotation_y(tilt * core::f64::consts::FRAC_PI_2)
    }

    /// Returns `true` when the transform only translates and scales in X/Y.
    ///
    /// Tilted or rotated transforms are not axis-aligned.
    #[must_use]
    pub fn is_axis_aligned(&self) -> bool {
        let c = &self.cols;
        c[0][1] == 0.0
            && c[0][2] == 0.0
            && c[0][3] == 0.0
            && c[1][0] == 0.0
            && c[1][2] == 0.0
            && c[1][3] == 0.0
            && c[2] == [0.0, 0.0, 1.0, 0.0]
            && c[3][3] == 1.0
    }

    /// Maps a point in the z = 0 plane, applying the perspective divide.
    #[must_use]
    pub fn map_point(&self, p: Point) -> Point {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[3][1];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[3][3];
        if w == 0.0 || w == 1.0 {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }

    /// Returns the bounding box of `rect` after mapping its corners.
    #[must_use]
    pub fn map_rect_bbox(&self, rect: Rect) -> Rect {
        let corners = [
            self.map_point(Point::new(rect.x0, rect.y0)),
            self.map_point(Point::new(rect.x1, rect.y0)),
            self.map_point(Point::new(rect.x0, rect.y1)),
            self.map_point(Point::new(rect.x1, rect.y1)),
        ];
        let mut out = Rect::from_points(corners[0], corners[1]);
        out = out.union_pt(corners[2]);
        out.union_pt(corners[3])
    }

    /// Returns the matrix as sixteen column-major `f32` values.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "GPU uniforms are single precision"
    )]
    pub fn to_cols_f32(&self) -> [f32; 16] {
        let mut out = [0.0_f32; 16];
        for (i, col) in self.cols.iter().enumerate() {
            for (j, v) in col.iter().enumerate() {
                out[i * 4 + j] = *v as f32;
            }
        }
        out
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    #[cfg(not(feature = "std"))]
    use kurbo::common::FloatFuncs as _;

    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn scale_then_translate_maps_unit_square() {
        let m = Transform3d::from_translation(10.0, 20.0, 0.0)
            * Transform3d::from_scale(100.0, 50.0, 1.0);
        assert!(m.is_axis_aligned());
        let bbox = m.map_rect_bbox(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(bbox, Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn small_tilt_is_identity() {
        assert_eq!(Transform3d::from_tilt(0.0), Transform3d::IDENTITY);
        assert_eq!(Transform3d::from_tilt(0.0005), Transform3d::IDENTITY);
    }

    #[test]
    fn tilt_foreshortens_right_edge() {
        let t = Transform3d::from_tilt(0.5);
        assert!(!t.is_axis_aligned());
        // The left edge stays put.
        assert!(approx(t.map_point(Point::new(0.0, 0.0)), Point::ORIGIN));
        // The right edge shrinks by cos(θ) / (0.4·sin(θ) + 1).
        let theta = 0.5 * core::f64::consts::FRAC_PI_2;
        let expected = theta.cos() / (0.4 * theta.sin() + 1.0);
        let right = t.map_point(Point::new(1.0, 0.5));
        assert!((right.x - expected).abs() < EPS, "got {right:?}");
        // Foreshortening is centered vertically.
        assert!((right.y - 0.5).abs() < EPS, "got {right:?}");
    }

    #[test]
    fn f32_columns_follow_layout() {
        let m = Transform3d::from_translation(5.0, 6.0, 7.0);
        let cols = m.to_cols_f32();
        assert_eq!(&cols[12..16], &[5.0, 6.0, 7.0, 1.0]);
        assert_eq!(cols[0], 1.0);
    }

    #[test]
    fn nan_is_not_finite() {
        let mut t = Transform3d::IDENTITY;
        assert!(t.is_finite());
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
    }
}
