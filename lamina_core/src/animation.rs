// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-based interpolation of a single scalar field.
//!
//! An [`Animation`] moves one field from a start value to an end value over a
//! time window, following a raised-cosine ease curve:
//!
//! ```text
//! ease(t) = (1 − cos(π·t)) / 2        t ∈ [0, 1]
//! ```
//!
//! The curve starts and ends with zero slope, so chained animations that
//! splice onto the field's current value do not jerk. Integer fields round to
//! the nearest value and always land exactly on the end value.
//!
//! Multi-step moves append further [`Keyframe`]s; every segment between two
//! keyframes follows the same curve.

use alloc::vec::Vec;
use core::f64::consts::PI;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::time::{Duration, HostTime};

/// A scalar type that an [`Animation`] can interpolate.
pub trait Animatable: Copy + PartialEq {
    /// Returns `start + progress * (end - start)`, rounded as the type
    /// requires.
    fn interpolate(start: Self, end: Self, progress: f64) -> Self;
}

impl Animatable for f32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "animated float fields are single precision"
    )]
    fn interpolate(start: Self, end: Self, progress: f64) -> Self {
        let start = f64::from(start);
        (start + progress * (f64::from(end) - start)) as Self
    }
}

impl Animatable for i32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "interpolated value lies between two i32 endpoints"
    )]
    fn interpolate(start: Self, end: Self, progress: f64) -> Self {
        let start = f64::from(start);
        (start + progress * (f64::from(end) - start)).round() as Self
    }
}

/// The raised-cosine ease curve, with `t` clamped to `[0, 1]`.
#[must_use]
pub fn ease(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    (1.0 - (PI * t).cos()) / 2.0
}

/// One value an [`Animation`] passes through, and when.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<T> {
    /// The field's value at `time`.
    pub value: T,
    /// When the field reaches `value`.
    pub time: HostTime,
}

/// Interpolates one field through a sequence of keyframes.
///
/// The common case is a single segment from a start to an end value. More
/// keyframes can be appended with [`append_keyframe`](Self::append_keyframe);
/// each segment is eased on its own, so the field comes to rest briefly at
/// every keyframe.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation<T> {
    start: Keyframe<T>,
    end: Keyframe<T>,
    // Keyframes strictly between `start` and `end`, in time order.
    middle: Vec<Keyframe<T>>,
}

impl<T: Animatable> Animation<T> {
    /// Creates an animation from `start_value` at `start_time` to `end_value`
    /// at `end_time`.
    #[must_use]
    pub fn new(start_value: T, end_value: T, start_time: HostTime, end_time: HostTime) -> Self {
        Self {
            start: Keyframe {
                value: start_value,
                time: start_time,
            },
            end: Keyframe {
                value: end_value,
                time: end_time.max(start_time),
            },
            middle: Vec::new(),
        }
    }

    /// Creates an animation that holds `value` from `time` on, ready for
    /// [`append_keyframe`](Self::append_keyframe).
    #[must_use]
    pub fn starting_at(value: T, time: HostTime) -> Self {
        Self::new(value, value, time, time)
    }

    /// Adds a keyframe `delay` after the current last one.
    ///
    /// The animation now ends at `value`.
    pub fn append_keyframe(&mut self, value: T, delay: Duration) {
        if self.end.time > self.start.time {
            self.middle.push(self.end);
        }
        self.end = Keyframe {
            value,
            time: self.end.time.saturating_add(delay),
        };
    }

    /// Writes the value for `now` into `field` and returns `true` once the
    /// end time has been reached.
    ///
    /// At or after the end time `field` is set to exactly the end value.
    /// Evaluating at the same `now` twice writes the same value.
    pub fn eval(&self, now: HostTime, field: &mut T) -> bool {
        if now >= self.end.time {
            *field = self.end.value;
            return true;
        }
        if now <= self.start.time {
            *field = self.start.value;
            return false;
        }
        // `prev.time < now <= next.time`, so the segment is never empty.
        let mut prev = self.start;
        let mut next = self.end;
        for &keyframe in &self.middle {
            if now <= keyframe.time {
                next = keyframe;
                break;
            }
            prev = keyframe;
        }
        let span = next.time.saturating_duration_since(prev.time).nanos() as f64;
        let elapsed = now.saturating_duration_since(prev.time).nanos() as f64;
        let progress = ease(elapsed / span);
        *field = T::interpolate(prev.value, next.value, progress);
        false
    }

    /// Re-bases the animation in place as a single segment.
    ///
    /// `current` becomes the new start value so the field continues from
    /// wherever it is right now. Appended keyframes are dropped.
    pub fn reset(&mut self, current: T, end_value: T, start_time: HostTime, end_time: HostTime) {
        self.start = Keyframe {
            value: current,
            time: start_time,
        };
        self.end = Keyframe {
            value: end_value,
            time: end_time.max(start_time),
        };
        self.middle.clear();
    }

    /// Returns the value the animation ends at.
    #[must_use]
    pub fn end_value(&self) -> T {
        self.end.value
    }

    /// Returns the start value.
    #[must_use]
    pub fn start_value(&self) -> T {
        self.start.value
    }

    /// Returns when the animation completes.
    #[must_use]
    pub fn end_time(&self) -> HostTime {
        self.end.time
    }

    /// Returns when the animation began.
    #[must_use]
    pub fn start_time(&self) -> HostTime {
        self.start.time
    }

    /// Returns every keyframe, from the start to the end.
    pub fn keyframes(&self) -> impl Iterator<Item = Keyframe<T>> + '_ {
        core::iter::once(self.start)
            .chain(self.middle.iter().copied())
            .chain((self.end.time > self.start.time).then_some(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> HostTime {
        HostTime::from_millis(v)
    }

    #[test]
    fn ease_endpoints_and_midpoint() {
        assert_eq!(ease(0.0), 0.0);
        assert!((ease(1.0) - 1.0).abs() < 1e-12);
        assert!((ease(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(ease(-3.0), 0.0);
        assert!((ease(7.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn int_animation_follows_curve() {
        let anim = Animation::new(0_i32, 100, ms(0), ms(100));
        let mut v = -1;
        assert!(!anim.eval(ms(0), &mut v));
        assert_eq!(v, 0);
        assert!(!anim.eval(ms(50), &mut v));
        assert_eq!(v, 50);
        assert!(!anim.eval(ms(25), &mut v));
        // (1 - cos(π/4)) / 2 * 100 = 14.64…
        assert_eq!(v, 15);
        assert!(anim.eval(ms(100), &mut v));
        assert_eq!(v, 100);
    }

    #[test]
    fn int_animation_lands_exactly() {
        let anim = Animation::new(3_i32, -7, ms(10), ms(11));
        let mut v = 3;
        assert!(anim.eval(ms(500), &mut v));
        assert_eq!(v, -7);
    }

    #[test]
    fn float_animation_is_monotonic() {
        let anim = Animation::new(0.0_f32, 1.0, ms(0), ms(200));
        let mut last = 0.0_f32;
        for t in 0..=200 {
            let mut v = 0.0;
            anim.eval(ms(t), &mut v);
            assert!(v >= last, "value went backwards at {t}ms: {v} < {last}");
            last = v;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn eval_is_idempotent() {
        let anim = Animation::new(10.0_f32, 20.0, ms(0), ms(100));
        let mut a = 0.0;
        let mut b = 0.0;
        anim.eval(ms(37), &mut a);
        anim.eval(ms(37), &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn reset_splices_from_current_value() {
        let mut anim = Animation::new(0_i32, 100, ms(0), ms(100));
        let mut v = 0;
        anim.eval(ms(50), &mut v);
        assert_eq!(v, 50);

        anim.reset(v, 0, ms(50), ms(150));
        assert_eq!(anim.start_value(), 50);
        assert_eq!(anim.end_value(), 0);

        // No discontinuity at the splice point.
        anim.eval(ms(50), &mut v);
        assert_eq!(v, 50);
        anim.eval(ms(100), &mut v);
        assert_eq!(v, 25);
        assert!(anim.eval(ms(150), &mut v));
        assert_eq!(v, 0);
    }

    #[test]
    fn keyframes_ease_each_segment() {
        let mut anim = Animation::starting_at(0_i32, ms(0));
        anim.append_keyframe(100, Duration::from_millis(100));
        anim.append_keyframe(100, Duration::from_millis(50));
        anim.append_keyframe(-100, Duration::from_millis(200));
        assert_eq!(anim.end_time(), ms(350));
        assert_eq!(anim.end_value(), -100);

        let mut v = 0;
        assert!(!anim.eval(ms(50), &mut v));
        assert_eq!(v, 50);
        assert!(!anim.eval(ms(100), &mut v));
        assert_eq!(v, 100, "keyframes are hit exactly");
        assert!(!anim.eval(ms(125), &mut v));
        assert_eq!(v, 100);
        assert!(!anim.eval(ms(250), &mut v));
        assert_eq!(v, 0);
        assert!(anim.eval(ms(350), &mut v));
        assert_eq!(v, -100);

        let times: Vec<HostTime> = anim.keyframes().map(|k| k.time).collect();
        assert_eq!(times, [ms(0), ms(100), ms(150), ms(350)]);
    }

    #[test]
    fn reset_drops_appended_keyframes() {
        let mut anim = Animation::starting_at(0.0_f32, ms(0));
        anim.append_keyframe(1.0, Duration::from_millis(10));
        anim.append_keyframe(0.0, Duration::from_millis(10));
        anim.reset(0.5, 2.0, ms(5), ms(15));
        assert_eq!(anim.keyframes().count(), 2);
        let mut v = 0.0;
        anim.eval(ms(10), &mut v);
        assert!((v - 1.25).abs() < 1e-6);
    }

    #[test]
    fn animation_without_keyframes_holds_its_value() {
        let anim = Animation::starting_at(7_i32, ms(20));
        let mut v = 0;
        assert!(anim.eval(ms(20), &mut v));
        assert_eq!(v, 7);
        assert_eq!(anim.keyframes().count(), 1);
    }

    #[test]
    fn zero_length_window_completes_immediately() {
        let anim = Animation::new(1.0_f32, 2.0, ms(5), ms(5));
        let mut v = 1.0;
        assert!(anim.eval(ms(5), &mut v));
        assert_eq!(v, 2.0);
    }
}
