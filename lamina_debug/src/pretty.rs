// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in microseconds.

use std::io::Write;

use lamina_core::time::HostTime;
use lamina_core::trace::{
    DamageRect, DrawBeginEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, PresentEvent,
    SchedulerEvent, TextureEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn us(t: HostTime) -> f64 {
    nanos_to_us(t.nanos())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_draw_begin(&mut self, e: &DrawBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[draw] frame={} now={:.1}µs dirty={} partial={} animations={}",
            e.frame_index,
            us(e.now),
            e.dirty,
            e.partially_dirty,
            e.num_animations,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            us(e.timestamp),
        );
    }

    fn on_present(&mut self, e: &PresentEvent) {
        let r = e.region;
        let _ = writeln!(
            self.writer,
            "[present] frame={} {:?} ({}, {}) {}x{}",
            e.frame_index, e.kind, r.x, r.y, r.width, r.height,
        );
    }

    fn on_scheduler(&mut self, e: &SchedulerEvent) {
        let _ = writeln!(
            self.writer,
            "[scheduler] {:?} -> {:?} at {:.1}µs animations={}",
            e.from,
            e.to,
            us(e.timestamp),
            e.num_animations,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} actors={} culled={} animations={} present={:?} \
             animate={:.1}µs refresh={:.1}µs layer={:.1}µs render={:.1}µs present={:.1}µs",
            s.frame_index,
            s.actor_count,
            s.culled,
            s.num_animations,
            s.present,
            nanos_to_us(s.animate_ns),
            nanos_to_us(s.refresh_ns),
            nanos_to_us(s.layer_ns),
            nanos_to_us(s.render_ns),
            nanos_to_us(s.present_ns),
        );
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} rects={}",
            rects.len(),
        );
    }

    fn on_texture_events(&mut self, frame_index: u64, events: &[TextureEvent]) {
        for e in events {
            let _ = writeln!(
                self.writer,
                "[texture] frame={frame_index} actor={} texture={} {:?}",
                e.actor_index, e.texture, e.kind,
            );
        }
    }
}
