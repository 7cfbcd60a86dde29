// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.
//!
//! Damage arrives from the windowing system and leaves the layering pass in
//! stage pixels with a top-left origin. GPU presentation APIs address the
//! surface from the bottom-left, so partial presents are flipped with
//! [`flip_to_bottom_left`] just before they reach the backend.

use lamina_core::geometry::{IntRect, Size};

/// A region of the output that needs re-rendering, in top-left stage pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DamageRegion {
    /// The entire output needs redrawing.
    #[default]
    Full,
    /// Only this rectangle needs redrawing.
    Rect(IntRect),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Wraps a damage rectangle, mapping an empty one to [`None`](Self::None).
    #[must_use]
    pub fn from_rect(rect: IntRect) -> Self {
        if rect.is_empty() {
            Self::None
        } else {
            Self::Rect(rect)
        }
    }

    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Converts to the backend's present region for a stage of `stage` size.
    ///
    /// A rectangle covering the whole stage is presented in full. Returns
    /// `None` when nothing needs presenting.
    #[must_use]
    pub fn to_present(&self, stage: Size) -> Option<PresentRegion> {
        match *self {
            Self::Full => Some(PresentRegion::Full),
            Self::None => None,
            Self::Rect(rect) => {
                let clipped = rect.intersect(IntRect::from_size(stage));
                if clipped.is_empty() {
                    None
                } else if clipped == IntRect::from_size(stage) {
                    Some(PresentRegion::Full)
                } else {
                    Some(PresentRegion::Partial(flip_to_bottom_left(
                        clipped,
                        stage.height,
                    )))
                }
            }
        }
    }
}

/// The part of the surface a present covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentRegion {
    /// Swap the whole surface.
    Full,
    /// Copy only this rectangle, in bottom-left surface coordinates.
    Partial(IntRect),
}

/// Converts a top-left-origin rectangle to bottom-left-origin coordinates on
/// a surface `stage_height` pixels tall.
///
/// `x`, `width`, and `height` are unchanged;
/// `y' = stage_height - (y + height)`. Applying it twice yields the input.
#[must_use]
pub fn flip_to_bottom_left(rect: IntRect, stage_height: i32) -> IntRect {
    IntRect::new(
        rect.x,
        stage_height - (rect.y + rect.height),
        rect.width,
        rect.height,
    )
}
