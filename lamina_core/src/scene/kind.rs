// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Actor kinds and per-kind content.

use crate::geometry::IntRect;

use super::id::{PixmapHandle, TextureId};

/// What an actor is.
///
/// The set is closed: passes over the tree `match` on the kind instead of
/// dispatching through trait objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorKind {
    /// The root of the tree, bound to the output surface.
    Stage,
    /// A grouping node with ordered children.
    Container,
    /// A solid-color rectangle.
    ColoredBox,
    /// A quad showing a shared texture from the resource cache.
    Image,
    /// A quad showing a client pixel buffer through a GPU texture.
    TexturePixmap,
}

impl ActorKind {
    /// Returns `true` for kinds that hold children.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Stage | Self::Container)
    }

    /// Returns `true` for kinds that paint something.
    #[inline]
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        !self.is_container()
    }

    /// Returns `true` for kinds that [`Scene::clone_actor`] accepts.
    ///
    /// [`Scene::clone_actor`]: super::Scene::clone_actor
    #[inline]
    #[must_use]
    pub const fn is_cloneable(self) -> bool {
        matches!(self, Self::ColoredBox | Self::Image)
    }

    /// Short label used in debug dumps.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stage => "StageActor",
            Self::Container => "ContainerActor",
            Self::ColoredBox => "ColoredBoxActor",
            Self::Image => "ImageActor",
            Self::TexturePixmap => "TexturePixmapActor",
        }
    }
}

/// A texture shown by an [`ActorKind::Image`] actor.
///
/// The texture is owned by the compositor's resource cache, so clones of the
/// actor share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageContent {
    /// The shared texture.
    pub texture: TextureId,
    /// Whether the image has an alpha channel.
    pub has_alpha: bool,
}

/// Binding state of an [`ActorKind::TexturePixmap`] actor.
///
/// ```text
/// Unbound ──bind──► Bound(invalid) ──draw──► Bound(valid)
///    ▲                    ▲                      │
///    │                    └────── resized ───────┤
///    └──────────────────── unbind ───────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixmapState {
    /// The bound pixel buffer, if any.
    pub handle: Option<PixmapHandle>,
    /// Whether the buffer carries an alpha channel.
    pub has_alpha: bool,
    /// The GPU texture currently showing the buffer.
    pub texture: Option<TextureId>,
    /// The texture must be recreated before the next draw.
    pub invalid: bool,
    /// The buffer's pixels changed; the texture contents must be refreshed.
    pub stale: bool,
    /// Texture creation failed; the actor draws as a placeholder.
    pub failed: bool,
    /// Accumulated damage in local coordinates, clipped to the actor bounds.
    pub damage: IntRect,
}

impl PixmapState {
    /// Returns `true` when a buffer is bound.
    #[inline]
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns `true` when the buffer has no alpha channel.
    #[inline]
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        !self.has_alpha
    }
}

/// Integer-valued animatable fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntField {
    /// Horizontal position.
    X,
    /// Vertical position.
    Y,
}

/// Float-valued animatable fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatField {
    /// Horizontal scale factor.
    ScaleX,
    /// Vertical scale factor.
    ScaleY,
    /// Opacity in `0.0..=1.0`.
    Opacity,
    /// Perspective tilt in `0.0..=1.0`.
    Tilt,
    /// Dimming at the left edge in `0.0..=1.0`.
    DimLeft,
    /// Dimming at the right edge in `0.0..=1.0`.
    DimRight,
}

/// One stop of a multi-step move.
///
/// The actor reaches `(x, y)` `delay_ms` milliseconds after the previous
/// stop, or after the move starts for the first stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveKeyframe {
    /// Horizontal position relative to the parent.
    pub x: i32,
    /// Vertical position relative to the parent.
    pub y: i32,
    /// Time from the previous stop. Must be positive.
    pub delay_ms: u32,
}

/// Left-edge dimming of an actor shown dimmed.
pub const DIMMED_OPACITY_LEFT: f32 = 0.2;
/// Right-edge dimming of an actor shown dimmed.
pub const DIMMED_OPACITY_RIGHT: f32 = 0.6;
