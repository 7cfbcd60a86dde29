// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use lamina_core::time::HostTime;
use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Draw phases become duration slices; everything else is an instant event.
///
/// Rich events carry no timestamp of their own and are placed at the start
/// of the draw they belong to.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut draw_start = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::DrawBegin(e) => {
                draw_start = us(e.now);
                events.push(json!({
                    "ph": "i",
                    "name": "DrawBegin",
                    "cat": "Frame",
                    "ts": draw_start,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "dirty": e.dirty,
                        "partially_dirty": e.partially_dirty,
                        "num_animations": e.num_animations,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Frame",
                    "ts": us(e.timestamp),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Frame",
                    "ts": us(e.timestamp),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::Present(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Present",
                    "cat": "Frame",
                    "ts": us(e.timestamp),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "kind": format!("{:?}", e.kind),
                        "region": [e.region.x, e.region.y, e.region.width, e.region.height],
                    }
                }));
            }
            RecordedEvent::Scheduler(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Scheduler",
                    "cat": "Scheduler",
                    "ts": us(e.timestamp),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "from": format!("{:?}", e.from),
                        "to": format!("{:?}", e.to),
                        "num_animations": e.num_animations,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": us(s.now),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "actor_count": s.actor_count,
                        "culled": s.culled,
                        "num_animations": s.num_animations,
                        "present": format!("{:?}", s.present),
                        "animate_us": nanos_to_us(s.animate_ns),
                        "refresh_us": nanos_to_us(s.refresh_ns),
                        "layer_us": nanos_to_us(s.layer_ns),
                        "render_us": nanos_to_us(s.render_ns),
                        "present_us": nanos_to_us(s.present_ns),
                    }
                }));
            }
            RecordedEvent::DamageRects { frame_index, rects } => {
                let rects: Vec<Value> = rects
                    .iter()
                    .map(|r| json!([r.x, r.y, r.width, r.height]))
                    .collect();
                events.push(json!({
                    "ph": "i",
                    "name": "DamageRects",
                    "cat": "Rich",
                    "ts": draw_start,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "rects": rects,
                    }
                }));
            }
            RecordedEvent::TextureEvents {
                frame_index,
                events: textures,
            } => {
                let textures: Vec<Value> = textures
                    .iter()
                    .map(|t| {
                        json!({
                            "actor": t.actor_index,
                            "texture": t.texture,
                            "kind": format!("{:?}", t.kind),
                        })
                    })
                    .collect();
                events.push(json!({
                    "ph": "i",
                    "name": "TextureEvents",
                    "cat": "Rich",
                    "ts": draw_start,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "events": textures,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn us(t: HostTime) -> f64 {
    nanos_to_us(t.nanos())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}
