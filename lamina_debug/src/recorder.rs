// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each led by a one-byte tag. [`decode`]
//! reads them back as an iterator of [`RecordedEvent`].
//!
//! Rich events ([`on_damage_rects`](TraceSink::on_damage_rects),
//! [`on_texture_events`](TraceSink::on_texture_events)) are stored as a count
//! followed by the records.

use lamina_core::geometry::IntRect;
use lamina_core::scheduler::SchedulerState;
use lamina_core::time::HostTime;
use lamina_core::trace::{
    DamageRect, DrawBeginEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    PresentEvent, PresentKind, SchedulerEvent, TextureEvent, TextureEventKind, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_DRAW_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_PRESENT: u8 = 4;
const TAG_SCHEDULER: u8 = 5;
const TAG_FRAME_SUMMARY: u8 = 6;
const TAG_DAMAGE_RECTS: u8 = 7;
const TAG_TEXTURE_EVENTS: u8 = 8;

const DAMAGE_RECT_BYTES: usize = 16;
const TEXTURE_EVENT_BYTES: usize = 13;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_count(&mut self, len: usize) {
        self.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Animate => 0,
            PhaseKind::Refresh => 1,
            PhaseKind::Layer => 2,
            PhaseKind::Render => 3,
            PhaseKind::Present => 4,
        });
    }

    fn write_present_kind(&mut self, k: PresentKind) {
        self.write_u8(match k {
            PresentKind::Skipped => 0,
            PresentKind::Full => 1,
            PresentKind::Partial => 2,
        });
    }

    fn write_state(&mut self, s: SchedulerState) {
        self.write_u8(match s {
            SchedulerState::Idle => 0,
            SchedulerState::DirtyStatic => 1,
            SchedulerState::Animating => 2,
        });
    }

    fn write_texture_kind(&mut self, k: TextureEventKind) {
        self.write_u8(match k {
            TextureEventKind::Created => 0,
            TextureEventKind::Updated => 1,
            TextureEventKind::Failed => 2,
            TextureEventKind::Released => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_draw_begin(&mut self, e: &DrawBeginEvent) {
        self.write_u8(TAG_DRAW_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.nanos());
        self.write_bool(e.dirty);
        self.write_bool(e.partially_dirty);
        self.write_u32(e.num_animations);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_present(&mut self, e: &PresentEvent) {
        self.write_u8(TAG_PRESENT);
        self.write_u64(e.frame_index);
        self.write_u64(e.timestamp.nanos());
        self.write_present_kind(e.kind);
        self.write_i32(e.region.x);
        self.write_i32(e.region.y);
        self.write_i32(e.region.width);
        self.write_i32(e.region.height);
    }

    fn on_scheduler(&mut self, e: &SchedulerEvent) {
        self.write_u8(TAG_SCHEDULER);
        self.write_u64(e.timestamp.nanos());
        self.write_state(e.from);
        self.write_state(e.to);
        self.write_u32(e.num_animations);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.now.nanos());
        self.write_u32(s.actor_count);
        self.write_u32(s.culled);
        self.write_u32(s.num_animations);
        self.write_present_kind(s.present);
        self.write_u64(s.animate_ns);
        self.write_u64(s.refresh_ns);
        self.write_u64(s.layer_ns);
        self.write_u64(s.render_ns);
        self.write_u64(s.present_ns);
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.write_u8(TAG_DAMAGE_RECTS);
        self.write_u64(frame_index);
        self.write_count(rects.len());
        for r in rects {
            self.write_i32(r.x);
            self.write_i32(r.y);
            self.write_u32(r.width);
            self.write_u32(r.height);
        }
    }

    fn on_texture_events(&mut self, frame_index: u64, events: &[TextureEvent]) {
        self.write_u8(TAG_TEXTURE_EVENTS);
        self.write_u64(frame_index);
        self.write_count(events.len());
        for e in events {
            self.write_u32(e.actor_index);
            self.write_u64(e.texture);
            self.write_texture_kind(e.kind);
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`DrawBeginEvent`].
    DrawBegin(DrawBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`PresentEvent`].
    Present(PresentEvent),
    /// A [`SchedulerEvent`].
    Scheduler(SchedulerEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// Damage rectangles for a frame.
    DamageRects {
        /// Draw counter.
        frame_index: u64,
        /// The rectangles.
        rects: Vec<DamageRect>,
    },
    /// Texture lifecycle records for a frame.
    TextureEvents {
        /// Draw counter.
        frame_index: u64,
        /// The records.
        events: Vec<TextureEvent>,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        if self.remaining() < N {
            return None;
        }
        let v = self.data[self.pos..self.pos + N].try_into().ok()?;
        self.pos += N;
        Some(v)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Animate,
            1 => PhaseKind::Refresh,
            2 => PhaseKind::Layer,
            3 => PhaseKind::Render,
            _ => PhaseKind::Present,
        })
    }

    fn read_present_kind(&mut self) -> Option<PresentKind> {
        Some(match self.read_u8()? {
            0 => PresentKind::Skipped,
            1 => PresentKind::Full,
            _ => PresentKind::Partial,
        })
    }

    fn read_state(&mut self) -> Option<SchedulerState> {
        Some(match self.read_u8()? {
            0 => SchedulerState::Idle,
            1 => SchedulerState::DirtyStatic,
            _ => SchedulerState::Animating,
        })
    }

    fn read_texture_kind(&mut self) -> Option<TextureEventKind> {
        Some(match self.read_u8()? {
            0 => TextureEventKind::Created,
            1 => TextureEventKind::Updated,
            2 => TextureEventKind::Failed,
            _ => TextureEventKind::Released,
        })
    }

    /// Reads a record count, refusing counts the remaining bytes cannot hold.
    fn read_count(&mut self, record_bytes: usize) -> Option<usize> {
        let count = usize::try_from(self.read_u32()?).ok()?;
        (count.checked_mul(record_bytes)? <= self.remaining()).then_some(count)
    }

    fn decode_draw_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DrawBegin(DrawBeginEvent {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            dirty: self.read_bool()?,
            partially_dirty: self.read_bool()?,
            num_animations: self.read_u32()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_present(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Present(PresentEvent {
            frame_index: self.read_u64()?,
            timestamp: self.read_time()?,
            kind: self.read_present_kind()?,
            region: IntRect::new(
                self.read_i32()?,
                self.read_i32()?,
                self.read_i32()?,
                self.read_i32()?,
            ),
        }))
    }

    fn decode_scheduler(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Scheduler(SchedulerEvent {
            timestamp: self.read_time()?,
            from: self.read_state()?,
            to: self.read_state()?,
            num_animations: self.read_u32()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            actor_count: self.read_u32()?,
            culled: self.read_u32()?,
            num_animations: self.read_u32()?,
            present: self.read_present_kind()?,
            animate_ns: self.read_u64()?,
            refresh_ns: self.read_u64()?,
            layer_ns: self.read_u64()?,
            render_ns: self.read_u64()?,
            present_ns: self.read_u64()?,
        }))
    }

    fn decode_damage_rects(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_count(DAMAGE_RECT_BYTES)?;
        let mut rects = Vec::with_capacity(count);
        for _ in 0..count {
            rects.push(DamageRect {
                x: self.read_i32()?,
                y: self.read_i32()?,
                width: self.read_u32()?,
                height: self.read_u32()?,
            });
        }
        Some(RecordedEvent::DamageRects { frame_index, rects })
    }

    fn decode_texture_events(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_count(TEXTURE_EVENT_BYTES)?;
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            events.push(TextureEvent {
                actor_index: self.read_u32()?,
                texture: self.read_u64()?,
                kind: self.read_texture_kind()?,
            });
        }
        Some(RecordedEvent::TextureEvents {
            frame_index,
            events,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_DRAW_BEGIN => self.decode_draw_begin(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_PRESENT => self.decode_present(),
            TAG_SCHEDULER => self.decode_scheduler(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_DAMAGE_RECTS => self.decode_damage_rects(),
            TAG_TEXTURE_EVENTS => self.decode_texture_events(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
