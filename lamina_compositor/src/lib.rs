// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositing window manager core: scene, draw loop, and host glue.
//!
//! [`Compositor`] ties a [`Scene`](lamina_core::scene::Scene) to a
//! [`DrawBackend`](lamina_render::DrawBackend). The host:
//!
//! - mutates the scene through [`Compositor::scene_mut`] in response to
//!   window-management events,
//! - forwards windowing-system events as [`Notification`]s,
//! - calls [`Compositor::draw`] whenever the redraw timer it handed to the
//!   compositor fires.
//!
//! An idle scene suspends that timer, so a static desktop costs no CPU.
//!
//! ## Features
//!
//! - `trace`: forwards draw-loop events to a
//!   [`TraceSink`](lamina_core::trace::TraceSink) passed to
//!   [`Compositor::draw_traced`].
//! - `trace-rich`: also reports damage rectangles and texture lifecycle
//!   events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod clock;
mod compositor;
mod notify;

pub use clock::MonotonicClock;
pub use compositor::{Compositor, CompositorConfig};
pub use notify::{CompositionListener, Notification};
