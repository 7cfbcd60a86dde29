// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plans, damage regions, and the draw-backend contract for lamina.
//!
//! This crate sits between [`lamina_core`]'s layering pass and a GPU
//! backend. It defines:
//!
//! - [`RenderPlan`]: the draw items of one frame, split into an opaque pass
//!   (front to back) and a translucent pass (back to front)
//! - [`DrawVisitor`]: builds a plan from a layered scene
//! - [`DamageRegion`] and [`PresentRegion`]: partial-update bookkeeping and
//!   the flip to the backend's bottom-left coordinates
//! - [`DrawBackend`]: what the compositor needs from the GPU layer
//! - [`ResourceCache`]: shared decorative textures
//! - [`HeadlessBackend`]: a recording backend for tests and offscreen use

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod backend;
mod damage;
mod draw;
mod headless;
mod plan;
mod resource;

pub use backend::{BackendCapabilities, BackendError, DrawBackend};
pub use damage::{DamageRegion, PresentRegion, flip_to_bottom_left};
pub use draw::DrawVisitor;
pub use headless::{BackendCall, HeadlessBackend};
pub use plan::{ItemContent, PLACEHOLDER_COLOR, RenderItem, RenderPlan};
pub use resource::ResourceCache;
