// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the draw loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! draw-loop instrumentation calls at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] is a convenience helper that collects phase
//! timestamps during a draw and produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`DamageRect`] and
//!   [`TextureEvent`] events plus the corresponding `TraceSink` methods.

use crate::geometry::IntRect;
use crate::scheduler::SchedulerState;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a draw is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Advancing animations.
    Animate,
    /// Releasing, creating, and updating pixmap textures.
    Refresh,
    /// The layering pass (depth, opacity, culling, damage).
    Layer,
    /// Building the render plan and handing it to the backend.
    Render,
    /// Presenting the frame.
    Present,
}

impl PhaseKind {
    /// All phases, in draw order.
    pub const ALL: [Self; 5] = [
        Self::Animate,
        Self::Refresh,
        Self::Layer,
        Self::Render,
        Self::Present,
    ];

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Animate => "animate",
            Self::Refresh => "refresh",
            Self::Layer => "layer",
            Self::Render => "render",
            Self::Present => "present",
        }
    }
}

/// How a draw ended up reaching the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PresentKind {
    /// Nothing was rendered (clean frame or empty damage).
    #[default]
    Skipped,
    /// The whole frame was redrawn and presented.
    Full,
    /// Only the damaged region was redrawn and presented.
    Partial,
}

/// What happened to a pixmap texture.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureEventKind {
    /// A texture was created for a newly bound or resized buffer.
    Created,
    /// An existing texture's pixels were refreshed.
    Updated,
    /// Texture creation failed; the actor draws a placeholder.
    Failed,
    /// A texture was destroyed.
    Released,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a draw begins.
#[derive(Clone, Copy, Debug)]
pub struct DrawBeginEvent {
    /// Monotonic draw counter.
    pub frame_index: u64,
    /// Host time at the start of the draw.
    pub now: HostTime,
    /// Whether a full redraw was requested.
    pub dirty: bool,
    /// Whether damaged contents were waiting.
    pub partially_dirty: bool,
    /// In-flight animations at the start of the draw.
    pub num_animations: u32,
}

/// Marks the beginning of a draw phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Draw counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a draw phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Draw counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted after the frame was presented (or skipped).
#[derive(Clone, Copy, Debug)]
pub struct PresentEvent {
    /// Draw counter.
    pub frame_index: u64,
    /// Host time of the present.
    pub timestamp: HostTime,
    /// How the frame was presented.
    pub kind: PresentKind,
    /// Presented region in stage pixels (top-left origin); the whole stage
    /// for full presents.
    pub region: IntRect,
}

/// Emitted when the redraw scheduler changes regime.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerEvent {
    /// Host time of the transition.
    pub timestamp: HostTime,
    /// Regime before the transition.
    pub from: SchedulerState,
    /// Regime after the transition.
    pub to: SchedulerState,
    /// In-flight animations after the transition.
    pub num_animations: u32,
}

/// Per-draw summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSummary {
    /// Draw counter.
    pub frame_index: u64,
    /// Host time at the start of the draw.
    pub now: HostTime,
    /// Actors in the stage tree.
    pub actor_count: u32,
    /// Leaves skipped by culling.
    pub culled: u32,
    /// In-flight animations after the draw.
    pub num_animations: u32,
    /// How the frame was presented.
    pub present: PresentKind,
    /// Animate phase duration in nanoseconds (0 if not measured).
    pub animate_ns: u64,
    /// Refresh phase duration in nanoseconds (0 if not measured).
    pub refresh_ns: u64,
    /// Layer phase duration in nanoseconds (0 if not measured).
    pub layer_ns: u64,
    /// Render phase duration in nanoseconds (0 if not measured).
    pub render_ns: u64,
    /// Present phase duration in nanoseconds (0 if not measured).
    pub present_ns: u64,
}

/// An axis-aligned damage rectangle in stage pixels.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

#[cfg(feature = "trace-rich")]
impl From<IntRect> for DamageRect {
    fn from(r: IntRect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width.max(0).unsigned_abs(),
            height: r.height.max(0).unsigned_abs(),
        }
    }
}

/// A texture lifecycle record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct TextureEvent {
    /// Slot index of the actor, or `u32::MAX` for deferred releases.
    pub actor_index: u32,
    /// The texture involved.
    pub texture: u64,
    /// What happened.
    pub kind: TextureEventKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the draw loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a draw begins.
    fn on_draw_begin(&mut self, e: &DrawBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a draw phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a draw phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after the frame was presented or skipped.
    fn on_present(&mut self, e: &PresentEvent) {
        _ = e;
    }

    /// Called when the redraw scheduler changes regime.
    fn on_scheduler(&mut self, e: &SchedulerEvent) {
        _ = e;
    }

    /// Called with a per-draw summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the frame's damage rectangles (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        _ = (frame_index, rects);
    }

    /// Called with the frame's texture lifecycle events (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_texture_events(&mut self, frame_index: u64, events: &[TextureEvent]) {
        _ = (frame_index, events);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`DrawBeginEvent`].
    #[inline]
    pub fn draw_begin(&mut self, e: &DrawBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_draw_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PresentEvent`].
    #[inline]
    pub fn present(&mut self, e: &PresentEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_present(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SchedulerEvent`].
    #[inline]
    pub fn scheduler(&mut self, e: &SchedulerEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_scheduler(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, rects);
        }
    }

    /// Emits texture lifecycle events (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn texture_events(&mut self, frame_index: u64, events: &[TextureEvent]) {
        if let Some(s) = &mut self.sink {
            s.on_texture_events(frame_index, events);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a draw and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    begin: DrawBeginEvent,
    phase_starts: [Option<HostTime>; 5],
    phase_ends: [Option<HostTime>; 5],
    actor_count: u32,
    culled: u32,
    num_animations: u32,
    present: PresentKind,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given draw.
    #[must_use]
    pub fn new(begin: &DrawBeginEvent) -> Self {
        Self {
            begin: *begin,
            phase_starts: [None; 5],
            phase_ends: [None; 5],
            actor_count: 0,
            culled: 0,
            num_animations: begin.num_animations,
            present: PresentKind::Skipped,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Records the scene counts observed by the draw.
    pub fn set_counts(&mut self, actor_count: u32, culled: u32, num_animations: u32) {
        self.actor_count = actor_count;
        self.culled = culled;
        self.num_animations = num_animations;
    }

    /// Records how the frame was presented.
    pub fn set_present(&mut self, present: PresentKind) {
        self.present = present;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.begin.frame_index,
            now: self.begin.now,
            actor_count: self.actor_count,
            culled: self.culled,
            num_animations: self.num_animations,
            present: self.present,
            animate_ns: self.phase_duration(PhaseKind::Animate),
            refresh_ns: self.phase_duration(PhaseKind::Refresh),
            layer_ns: self.phase_duration(PhaseKind::Layer),
            render_ns: self.phase_duration(PhaseKind::Render),
            present_ns: self.phase_duration(PhaseKind::Present),
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).nanos(),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Animate => 0,
        PhaseKind::Refresh => 1,
        PhaseKind::Layer => 2,
        PhaseKind::Render => 3,
        PhaseKind::Present => 4,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
