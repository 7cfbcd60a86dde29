// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Actor scene graph, animation, and layering for a compositing window
//! manager.
//!
//! `lamina_core` holds everything the compositor decides without touching
//! the GPU. It is `no_std` compatible (with `alloc`) and stores actors in
//! struct-of-arrays layout behind generational handles.
//!
//! # Architecture
//!
//! ```text
//!   callers ──► Scene mutation API ──► DrawScheduler (arms RedrawTimer)
//!                                            │
//!                 ┌──────────────────────────┘ timer tick
//!                 ▼
//!   Scene::advance_animations() ──► texture work ──► LayerVisitor::visit()
//!                                                          │
//!                                                          ▼
//!                                   LayerOutcome + LayerInfo per actor
//! ```
//!
//! **[`scene`]**: the actor tree, its mutation API, and pixmap binding state.
//!
//! **[`animation`]**: [`Animation<T>`](animation::Animation), a time-driven
//! interpolator for one scalar field with a cosine ease.
//!
//! **[`layer`]**: the layering pass assigning depth, opacity, culling, and
//! damage.
//!
//! **[`scheduler`]**: the adaptive redraw scheduler and the
//! [`RedrawTimer`](scheduler::RedrawTimer) seam to the host event loop.
//!
//! **[`dirty`]**: per-actor dirty channels via `understory_dirty`.
//!
//! **[`clock`]** and **[`time`]**: monotonic time and a manual test clock.
//!
//! **[`transform`]**: 4×4 transforms, including the perspective tilt.
//!
//! **[`geometry`]**: integer rectangles, sizes, and colors.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! draw-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates damage-rect
//!   and texture events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animation;
pub mod clock;
pub mod dirty;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod scene;
pub mod scheduler;
pub mod time;
pub mod trace;
pub mod transform;
