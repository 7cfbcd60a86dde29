// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The actor tree.
//!
//! An *actor* is a node in the compositing tree. Each actor has:
//!
//! - An identity ([`ActorId`]), a generational handle that becomes stale when
//!   the actor is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. Children are kept back to front.
//! - **Attributes** set by callers: position, size, scale, opacity, tilt,
//!   edge dimming, visibility, name, color, and visibility groups. Everything
//!   numeric except size can be animated.
//! - **Content** for leaves: a color, a shared image texture, or a bound
//!   pixel buffer ([`PixmapState`]).
//! - **Layering results** ([`LayerInfo`]) written by the
//!   [`LayerVisitor`](crate::layer::LayerVisitor): depth, effective opacity,
//!   opacity and culling flags, model-view transform, and on-stage bounds.
//!
//! Actors are stored in struct-of-arrays layout inside a [`Scene`], which
//! also owns the stage, the redraw scheduler, and the clock.
//!
//! # Dirty tracking
//!
//! Every change to a rendered attribute marks the scene dirty through the
//! [`DrawScheduler`](crate::scheduler::DrawScheduler). Per-actor work for the
//! next draw is tracked in the channels of [`dirty`](crate::dirty).

mod id;
mod kind;
mod mutate;
mod pixmap;
mod store;
mod traverse;

pub use id::{INVALID, ActorId, PixmapHandle, TextureId};
pub use kind::{
    ActorKind, DIMMED_OPACITY_LEFT, DIMMED_OPACITY_RIGHT, FloatField, ImageContent, IntField,
    MoveKeyframe, PixmapState,
};
pub use pixmap::TextureWork;
pub use store::{LayerInfo, Scene, SceneConfig};
pub use traverse::Children;
