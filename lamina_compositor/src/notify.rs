// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inbound notifications and outbound composition callbacks.

use lamina_core::geometry::{IntRect, Size};
use lamina_core::scene::ActorId;

/// An event from the windowing system.
///
/// Notifications can race with actor destruction; those naming a destroyed
/// actor are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// The client drew new contents into the actor's pixel buffer.
    PixmapContentsChanged {
        /// The texture-pixmap actor showing the buffer.
        actor: ActorId,
    },
    /// The actor's pixel buffer was reallocated at a new size.
    PixmapResized {
        /// The texture-pixmap actor showing the buffer.
        actor: ActorId,
        /// The new buffer size.
        size: Size,
    },
    /// Part of the actor's pixel buffer changed.
    Damage {
        /// The texture-pixmap actor showing the buffer.
        actor: ActorId,
        /// The changed rectangle in buffer pixels (top-left origin).
        rect: IntRect,
    },
    /// The output surface changed size.
    OutputResized(Size),
}

/// Observes frame-level composition changes.
pub trait CompositionListener {
    /// Called after a draw in which the front-most, stage-covering, opaque
    /// client window changed. `None` means no window covers the stage.
    fn top_fullscreen_actor_changed(&mut self, actor: Option<ActorId>);
}
