// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive redraw scheduling.
//!
//! The [`DrawScheduler`] decides when the host event loop must call the
//! compositor's draw entry point. It owns exactly one [`RedrawTimer`] for its
//! whole lifetime and moves between three states:
//!
//! ```text
//!                set_dirty / set_partially_dirty
//!     ┌──────┐ ──────────────────────────────────► ┌─────────────┐
//!     │ Idle │                                     │ DirtyStatic │
//!     └──────┘ ◄────────── finish_draw ─────────── └─────────────┘
//!        ▲                                              │
//!        │ finish_draw with no animations   increment_animations
//!        │                                              ▼
//!        │                                       ┌───────────┐
//!        └────────────────────────────────────── │ Animating │
//!                                                └───────────┘
//! ```
//!
//! While armed, the timer fires on a fixed period (16 ms by default). When it
//! is armed shortly after a draw, the first tick is delayed so consecutive
//! draws stay one period apart; a draw that happened more than a period ago
//! lets the next one run immediately. An idle scene keeps the timer
//! suspended and costs no CPU.

use alloc::boxed::Box;
use core::fmt;

use crate::time::{Duration, HostTime};

/// The event-loop timer that drives redraws.
///
/// The host implements this over its own event loop. Each tick should call
/// the compositor's draw entry point.
pub trait RedrawTimer {
    /// Starts (or restarts) periodic ticks: first after `initial_delay`, then
    /// every `period`.
    fn arm(&mut self, initial_delay: Duration, period: Duration);

    /// Stops ticking until the next [`arm`](Self::arm).
    fn suspend(&mut self);

    /// Releases the timer for good. Called once when the scheduler drops.
    fn cancel(&mut self) {}
}

/// A [`RedrawTimer`] that never fires.
///
/// Useful when the host calls draw manually (tests, offscreen rendering).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTimer;

impl RedrawTimer for NullTimer {
    fn arm(&mut self, _initial_delay: Duration, _period: Duration) {}

    fn suspend(&mut self) {}
}

/// Configuration for the [`DrawScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Period between redraws while the scene is dirty or animating.
    pub draw_interval: Duration,
}

impl SchedulerConfig {
    /// Default redraw period in milliseconds (about 60 Hz).
    pub const DEFAULT_DRAW_INTERVAL_MS: u64 = 16;
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            draw_interval: Duration::from_millis(Self::DEFAULT_DRAW_INTERVAL_MS),
        }
    }
}

/// Which redraw regime the scheduler is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Nothing to draw; the timer is suspended.
    Idle,
    /// Something changed; the timer is armed for one more draw.
    DirtyStatic,
    /// Animations are running; the timer fires every period.
    Animating,
}

/// Tracks dirtiness and in-flight animations, arming or suspending the
/// redraw timer to match.
pub struct DrawScheduler {
    config: SchedulerConfig,
    timer: Box<dyn RedrawTimer>,
    enabled: bool,
    dirty: bool,
    partially_dirty: bool,
    num_animations: u32,
    last_draw: Option<HostTime>,
}

impl fmt::Debug for DrawScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawScheduler")
            .field("config", &self.config)
            .field("enabled", &self.enabled)
            .field("dirty", &self.dirty)
            .field("partially_dirty", &self.partially_dirty)
            .field("num_animations", &self.num_animations)
            .field("last_draw", &self.last_draw)
            .finish_non_exhaustive()
    }
}

impl DrawScheduler {
    /// Creates a scheduler that owns `timer`.
    ///
    /// The scheduler starts dirty with the timer armed so that the first
    /// frame gets drawn.
    #[must_use]
    pub fn new(config: SchedulerConfig, timer: Box<dyn RedrawTimer>, now: HostTime) -> Self {
        let mut scheduler = Self {
            config,
            timer,
            enabled: false,
            dirty: false,
            partially_dirty: false,
            num_animations: 0,
            last_draw: None,
        };
        scheduler.set_dirty(now);
        scheduler
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Marks the whole frame as needing a redraw.
    pub fn set_dirty(&mut self, now: HostTime) {
        self.dirty = true;
        self.enable(now);
    }

    /// Marks damaged pixel contents as needing a redraw.
    ///
    /// A frame that is only partially dirty may be redrawn within its damage
    /// region.
    pub fn set_partially_dirty(&mut self, now: HostTime) {
        self.partially_dirty = true;
        self.enable(now);
    }

    /// Records that an animation started.
    pub fn increment_animations(&mut self, now: HostTime) {
        self.num_animations += 1;
        self.enable(now);
    }

    /// Records that an animation finished or was cancelled.
    ///
    /// The timer keeps running until the draw that observes the count
    /// reaching zero.
    pub fn decrement_animations(&mut self) {
        debug_assert!(self.num_animations > 0, "animation count underflow");
        self.num_animations = self.num_animations.saturating_sub(1);
    }

    /// Records a completed draw at `now`.
    ///
    /// Clears both dirty flags, and suspends the timer if no animations
    /// remain.
    pub fn finish_draw(&mut self, now: HostTime) {
        self.dirty = false;
        self.partially_dirty = false;
        self.last_draw = Some(now);
        if self.num_animations == 0 {
            self.disable();
        }
    }

    /// Returns `true` if the whole frame needs redrawing.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` if damaged contents are waiting to be drawn.
    #[must_use]
    pub fn is_partially_dirty(&self) -> bool {
        self.partially_dirty
    }

    /// Returns the number of in-flight animations.
    #[must_use]
    pub fn num_animations(&self) -> u32 {
        self.num_animations
    }

    /// Returns `true` while the redraw timer is armed.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns when the last draw completed.
    #[must_use]
    pub fn last_draw(&self) -> Option<HostTime> {
        self.last_draw
    }

    /// Returns the current redraw regime.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.num_animations > 0 {
            SchedulerState::Animating
        } else if self.enabled {
            SchedulerState::DirtyStatic
        } else {
            SchedulerState::Idle
        }
    }

    fn enable(&mut self, now: HostTime) {
        if self.enabled {
            return;
        }
        let period = self.config.draw_interval;
        let initial_delay = match self.last_draw {
            Some(last) => period.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        };
        self.timer.arm(initial_delay, period);
        self.enabled = true;
    }

    fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.timer.suspend();
        self.enabled = false;
    }
}

impl Drop for DrawScheduler {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum TimerCall {
        Arm(Duration, Duration),
        Suspend,
        Cancel,
    }

    #[derive(Clone, Default)]
    struct RecordingTimer(Rc<RefCell<Vec<TimerCall>>>);

    impl RedrawTimer for RecordingTimer {
        fn arm(&mut self, initial_delay: Duration, period: Duration) {
            self.0
                .borrow_mut()
                .push(TimerCall::Arm(initial_delay, period));
        }

        fn suspend(&mut self) {
            self.0.borrow_mut().push(TimerCall::Suspend);
        }

        fn cancel(&mut self) {
            self.0.borrow_mut().push(TimerCall::Cancel);
        }
    }

    const PERIOD: Duration = Duration(16_000_000);

    fn ms(v: u64) -> HostTime {
        HostTime::from_millis(v)
    }

    fn scheduler() -> (DrawScheduler, Rc<RefCell<Vec<TimerCall>>>) {
        let timer = RecordingTimer::default();
        let calls = timer.0.clone();
        let s = DrawScheduler::new(SchedulerConfig::default(), Box::new(timer), ms(0));
        (s, calls)
    }

    #[test]
    fn starts_dirty_and_armed() {
        let (s, calls) = scheduler();
        assert!(s.is_dirty());
        assert!(s.is_enabled());
        assert_eq!(s.state(), SchedulerState::DirtyStatic);
        assert_eq!(*calls.borrow(), [TimerCall::Arm(Duration::ZERO, PERIOD)]);
    }

    #[test]
    fn static_change_draws_once_then_idles() {
        let (mut s, calls) = scheduler();
        s.finish_draw(ms(1));
        assert_eq!(s.state(), SchedulerState::Idle);
        assert!(!s.is_dirty());

        s.set_dirty(ms(5));
        assert_eq!(s.state(), SchedulerState::DirtyStatic);
        s.finish_draw(ms(17));
        assert_eq!(s.state(), SchedulerState::Idle);

        assert_eq!(
            *calls.borrow(),
            [
                TimerCall::Arm(Duration::ZERO, PERIOD),
                TimerCall::Suspend,
                // 4 ms since the last draw, so wait out the rest of the period.
                TimerCall::Arm(Duration::from_millis(12), PERIOD),
                TimerCall::Suspend,
            ]
        );
    }

    #[test]
    fn stale_last_draw_arms_immediately() {
        let (mut s, calls) = scheduler();
        s.finish_draw(ms(0));
        s.set_dirty(ms(100));
        assert_eq!(
            calls.borrow().last(),
            Some(&TimerCall::Arm(Duration::ZERO, PERIOD))
        );
    }

    #[test]
    fn repeated_dirty_marks_arm_once() {
        let (mut s, calls) = scheduler();
        s.set_dirty(ms(1));
        s.set_partially_dirty(ms(2));
        s.increment_animations(ms(3));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn animating_keeps_timer_until_count_drains() {
        let (mut s, _calls) = scheduler();
        s.finish_draw(ms(0));
        s.increment_animations(ms(1));
        s.increment_animations(ms(1));
        assert_eq!(s.state(), SchedulerState::Animating);

        s.finish_draw(ms(16));
        assert!(s.is_enabled());
        s.decrement_animations();
        s.finish_draw(ms(32));
        assert_eq!(s.state(), SchedulerState::Animating);

        s.decrement_animations();
        // Still armed until the draw that sees zero.
        assert!(s.is_enabled());
        s.finish_draw(ms(48));
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.num_animations(), 0);
    }

    #[test]
    fn partially_dirty_is_tracked_separately() {
        let (mut s, _calls) = scheduler();
        s.finish_draw(ms(0));
        s.set_partially_dirty(ms(1));
        assert!(s.is_partially_dirty());
        assert!(!s.is_dirty());
        assert!(s.is_enabled());
        s.finish_draw(ms(2));
        assert!(!s.is_partially_dirty());
    }

    #[test]
    fn drop_cancels_timer() {
        let (s, calls) = scheduler();
        drop(s);
        assert_eq!(calls.borrow().last(), Some(&TimerCall::Cancel));
    }
}
