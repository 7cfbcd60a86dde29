// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the draw items of one frame.

use alloc::vec::Vec;

use lamina_core::geometry::{Color, IntRect, Size};
use lamina_core::scene::{ActorId, TextureId};

/// Fill used for texture-pixmap actors whose texture could not be created.
pub const PLACEHOLDER_COLOR: Color = Color::rgb(0.2, 0.2, 0.2);

/// What a render item paints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemContent {
    /// A solid color.
    Color(Color),
    /// A texture, sampled over the unit square.
    Texture {
        /// The texture to sample.
        texture: TextureId,
        /// Whether the texture's alpha channel must be honored.
        has_alpha: bool,
    },
    /// A solid stand-in for content that failed to load.
    Placeholder,
}

/// A single draw command in the render plan.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The actor this item originates from.
    pub actor: ActorId,
    /// What to paint.
    pub content: ItemContent,
    /// Maps the unit square to stage pixels (column-major 4x4).
    pub model_view: [f32; 16],
    /// Depth value for the depth test; larger is nearer.
    pub depth: f32,
    /// Effective opacity (0.0–1.0, accumulated from ancestors).
    pub opacity: f32,
    /// Dimming at the quad's left and right edges. Color channels are
    /// scaled by `1.0 - dim`, interpolated across the quad; alpha is kept.
    pub dim: [f32; 2],
    /// On-stage bounds in stage pixels (top-left origin).
    pub screen_bounds: IntRect,
}

/// The draw items for a single frame.
///
/// Opaque items are drawn first, front to back, with depth writes on so
/// the GPU can reject hidden fragments early. Translucent items follow,
/// back to front, blended over what is already there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    /// Size of the output surface.
    pub viewport: Size,
    /// Color to clear to first, or `None` when an opaque actor covers the
    /// whole stage.
    pub clear_color: Option<Color>,
    /// Restricts drawing to this rectangle in the backend's bottom-left
    /// coordinates. `None` draws the whole frame.
    pub scissor: Option<IntRect>,
    /// Opaque items, front to back.
    pub opaque: Vec<RenderItem>,
    /// Translucent items, back to front.
    pub translucent: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty plan for an output of the given size.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.clear_color = None;
        self.scissor = None;
        self.opaque.clear();
        self.translucent.clear();
    }

    /// Returns the total number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.opaque.len() + self.translucent.len()
    }

    /// Returns `true` if the plan draws nothing but (maybe) a clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.translucent.is_empty()
    }

    /// Iterates over all items in the order they are drawn.
    pub fn items(&self) -> impl Iterator<Item = &RenderItem> {
        self.opaque.iter().chain(self.translucent.iter())
    }
}
