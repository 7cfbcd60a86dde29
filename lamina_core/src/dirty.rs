// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The scene keeps per-actor dirty marks (via [`understory_dirty`]) for the
//! work that has to happen at the next draw. Scene-wide "needs redraw" state
//! lives in the [`DrawScheduler`](crate::scheduler::DrawScheduler) instead.
//!
//! - [`CONTENT`] is local-only and marked on texture-pixmap actors whose
//!   texture must be recreated or whose pixels changed. The draw pass drains
//!   it to decide which textures to refresh.
//! - [`TOPOLOGY`] is marked on structural changes (attach, detach, reorder,
//!   create, destroy). Draining it decides whether the paint order must be
//!   rebuilt.

use understory_dirty::Channel;

/// Pixmap binding or pixels changed.
pub const CONTENT: Channel = Channel::new(0);

/// Tree topology changed; triggers a paint-order rebuild.
pub const TOPOLOGY: Channel = Channel::new(1);
