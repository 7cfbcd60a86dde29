// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute mutation, animation, reordering, and cloning.
//!
//! Animatable setters take a duration in milliseconds. A zero duration sets
//! the field immediately and cancels any animation on it; a positive one
//! starts an animation from the field's current value, or re-bases the one
//! already running so the field never jumps.

use alloc::vec::Vec;

use crate::animation::{Animatable, Animation};
use crate::error::SceneError;
use crate::geometry::{Color, Size};
use crate::scheduler::DrawScheduler;
use crate::time::{Duration, HostTime};

use super::id::{INVALID, ActorId};
use super::kind::{
    ActorKind, DIMMED_OPACITY_LEFT, DIMMED_OPACITY_RIGHT, FloatField, IntField, MoveKeyframe,
};
use super::store::{STAGE, Scene, check_size};

/// Applies a new target to one animatable field.
fn splice<T: Animatable>(
    slot: &mut Option<Animation<T>>,
    value: &mut T,
    target: T,
    duration_ms: u32,
    now: HostTime,
    scheduler: &mut DrawScheduler,
) {
    if slot.is_none() && *value == target {
        return;
    }
    if duration_ms > 0 {
        let end = now.saturating_add(Duration::from_millis(u64::from(duration_ms)));
        match slot {
            Some(animation) => {
                // Bring the field up to date so the new animation starts
                // exactly where the old one is now.
                animation.eval(now, value);
                animation.reset(*value, target, now, end);
            }
            None => {
                *slot = Some(Animation::new(*value, target, now, end));
                scheduler.increment_animations(now);
            }
        }
    } else {
        if slot.take().is_some() {
            scheduler.decrement_animations();
        }
        *value = target;
    }
    scheduler.set_dirty(now);
}

/// Replaces a field's animation with one that runs through `stops`.
fn install_keyframes<T: Animatable>(
    slot: &mut Option<Animation<T>>,
    value: &mut T,
    stops: impl Iterator<Item = (T, u32)>,
    now: HostTime,
    scheduler: &mut DrawScheduler,
) {
    if let Some(running) = slot.as_ref() {
        running.eval(now, value);
    }
    let mut animation = Animation::starting_at(*value, now);
    for (target, delay_ms) in stops {
        animation.append_keyframe(target, Duration::from_millis(u64::from(delay_ms)));
    }
    if slot.replace(animation).is_none() {
        scheduler.increment_animations(now);
    }
}

/// Advances one field, dropping its animation once it has finished.
fn step<T: Animatable>(
    slot: &mut Option<Animation<T>>,
    value: &mut T,
    now: HostTime,
    scheduler: &mut DrawScheduler,
) {
    if slot.as_ref().is_some_and(|animation| animation.eval(now, value)) {
        *slot = None;
        scheduler.decrement_animations();
    }
}

fn check_unit(value: f32, what: &'static str) -> Result<(), SceneError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SceneError::InvalidArgument(what))
    }
}

impl Scene {
    // -- Animatable attributes --

    /// Animates an integer field toward `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn animate_int(
        &mut self,
        id: ActorId,
        field: IntField,
        target: i32,
        duration_ms: u32,
    ) -> Result<(), SceneError> {
        let i = self.check(id)? as usize;
        let now = self.clock.now();
        let animations = &mut self.animations[i];
        let (slot, value) = match field {
            IntField::X => (&mut animations.x, &mut self.x[i]),
            IntField::Y => (&mut animations.y, &mut self.y[i]),
        };
        splice(slot, value, target, duration_ms, now, &mut self.scheduler);
        Ok(())
    }

    /// Animates a float field toward `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle, and
    /// [`SceneError::InvalidArgument`] for non-finite targets, negative
    /// scales, or opacity and tilt outside `0.0..=1.0`.
    pub fn animate_float(
        &mut self,
        id: ActorId,
        field: FloatField,
        target: f32,
        duration_ms: u32,
    ) -> Result<(), SceneError> {
        let i = self.check(id)? as usize;
        match field {
            FloatField::ScaleX | FloatField::ScaleY => {
                if !target.is_finite() || target < 0.0 {
                    return Err(SceneError::InvalidArgument(
                        "scale must be finite and non-negative",
                    ));
                }
            }
            FloatField::Opacity => check_unit(target, "opacity must be within 0.0..=1.0")?,
            FloatField::Tilt => check_unit(target, "tilt must be within 0.0..=1.0")?,
            FloatField::DimLeft | FloatField::DimRight => {
                check_unit(target, "dimming must be within 0.0..=1.0")?;
            }
        }
        let now = self.clock.now();
        let animations = &mut self.animations[i];
        let (slot, value) = match field {
            FloatField::ScaleX => (&mut animations.scale_x, &mut self.scale_x[i]),
            FloatField::ScaleY => (&mut animations.scale_y, &mut self.scale_y[i]),
            FloatField::Opacity => (&mut animations.opacity, &mut self.opacity[i]),
            FloatField::Tilt => (&mut animations.tilt, &mut self.tilt[i]),
            FloatField::DimLeft => (&mut animations.dim_left, &mut self.dim_left[i]),
            FloatField::DimRight => (&mut animations.dim_right, &mut self.dim_right[i]),
        };
        splice(slot, value, target, duration_ms, now, &mut self.scheduler);
        Ok(())
    }

    /// Moves an actor to `(x, y)` relative to its parent.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn move_to(
        &mut self,
        id: ActorId,
        x: i32,
        y: i32,
        duration_ms: u32,
    ) -> Result<(), SceneError> {
        self.animate_int(id, IntField::X, x, duration_ms)?;
        self.animate_int(id, IntField::Y, y, duration_ms)
    }

    /// Moves an actor horizontally.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn move_x(&mut self, id: ActorId, x: i32, duration_ms: u32) -> Result<(), SceneError> {
        self.animate_int(id, IntField::X, x, duration_ms)
    }

    /// Moves an actor vertically.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn move_y(&mut self, id: ActorId, y: i32, duration_ms: u32) -> Result<(), SceneError> {
        self.animate_int(id, IntField::Y, y, duration_ms)
    }

    /// Scales an actor.
    ///
    /// Both factors are validated before either field changes.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for a negative or non-finite
    /// factor.
    pub fn set_scale(
        &mut self,
        id: ActorId,
        sx: f32,
        sy: f32,
        duration_ms: u32,
    ) -> Result<(), SceneError> {
        if !(sx.is_finite() && sy.is_finite() && sx >= 0.0 && sy >= 0.0) {
            return Err(SceneError::InvalidArgument(
                "scale must be finite and non-negative",
            ));
        }
        self.animate_float(id, FloatField::ScaleX, sx, duration_ms)?;
        self.animate_float(id, FloatField::ScaleY, sy, duration_ms)
    }

    /// Sets an actor's own opacity.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] outside `0.0..=1.0`.
    pub fn set_opacity(
        &mut self,
        id: ActorId,
        opacity: f32,
        duration_ms: u32,
    ) -> Result<(), SceneError> {
        self.animate_float(id, FloatField::Opacity, opacity, duration_ms)
    }

    /// Sets an actor's perspective tilt.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] outside `0.0..=1.0`.
    pub fn set_tilt(&mut self, id: ActorId, tilt: f32, duration_ms: u32) -> Result<(), SceneError> {
        self.animate_float(id, FloatField::Tilt, tilt, duration_ms)
    }

    /// Dims an actor with a gradient that darkens toward its right edge, or
    /// clears the dimming.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn show_dimmed(
        &mut self,
        id: ActorId,
        dimmed: bool,
        duration_ms: u32,
    ) -> Result<(), SceneError> {
        let (left, right) = if dimmed {
            (DIMMED_OPACITY_LEFT, DIMMED_OPACITY_RIGHT)
        } else {
            (0.0, 0.0)
        };
        self.animate_float(id, FloatField::DimLeft, left, duration_ms)?;
        self.animate_float(id, FloatField::DimRight, right, duration_ms)
    }

    /// Moves an actor through a series of stops.
    ///
    /// The move starts from the actor's current position and replaces any
    /// movement already in flight. Each stop is reached with its own ease.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle, and
    /// [`SceneError::InvalidArgument`] for an empty list or a zero delay.
    pub fn set_move_keyframes(
        &mut self,
        id: ActorId,
        keyframes: &[MoveKeyframe],
    ) -> Result<(), SceneError> {
        let i = self.check(id)? as usize;
        if keyframes.is_empty() {
            return Err(SceneError::InvalidArgument("a move needs at least one keyframe"));
        }
        if keyframes.iter().any(|k| k.delay_ms == 0) {
            return Err(SceneError::InvalidArgument("keyframe delays must be positive"));
        }
        let now = self.clock.now();
        let animations = &mut self.animations[i];
        let s = &mut self.scheduler;
        let xs = keyframes.iter().map(|k| (k.x, k.delay_ms));
        install_keyframes(&mut animations.x, &mut self.x[i], xs, now, s);
        let ys = keyframes.iter().map(|k| (k.y, k.delay_ms));
        install_keyframes(&mut animations.y, &mut self.y[i], ys, now, s);
        self.scheduler.set_dirty(now);
        Ok(())
    }

    /// Advances every in-flight animation to the clock's current time.
    ///
    /// Finished animations snap their field to the end value and are
    /// dropped. Also refreshes the paint order and the stage-tree actor
    /// count used by the layering pass. Returns `true` if any actor was
    /// animating.
    pub fn advance_animations(&mut self) -> bool {
        self.update_traversal();
        self.actor_count = self.traversal_order.len();
        if self.scheduler.num_animations() == 0 {
            return false;
        }

        let now = self.clock.now();
        let mut animated = false;
        for i in 0..self.len as usize {
            let a = &mut self.animations[i];
            if a.count() == 0 {
                continue;
            }
            animated = true;
            let s = &mut self.scheduler;
            step(&mut a.x, &mut self.x[i], now, s);
            step(&mut a.y, &mut self.y[i], now, s);
            step(&mut a.scale_x, &mut self.scale_x[i], now, s);
            step(&mut a.scale_y, &mut self.scale_y[i], now, s);
            step(&mut a.opacity, &mut self.opacity[i], now, s);
            step(&mut a.tilt, &mut self.tilt[i], now, s);
            step(&mut a.dim_left, &mut self.dim_left[i], now, s);
            step(&mut a.dim_right, &mut self.dim_right[i], now, s);
        }
        if animated {
            self.scheduler.set_dirty(now);
        }
        animated
    }

    /// Returns the end value of a running integer animation.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn int_animation_target(&self, id: ActorId, field: IntField) -> Option<i32> {
        self.validate(id);
        let a = &self.animations[id.idx as usize];
        match field {
            IntField::X => a.x.as_ref(),
            IntField::Y => a.y.as_ref(),
        }
        .map(Animation::end_value)
    }

    /// Returns the end value of a running float animation.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn float_animation_target(&self, id: ActorId, field: FloatField) -> Option<f32> {
        self.validate(id);
        let a = &self.animations[id.idx as usize];
        match field {
            FloatField::ScaleX => a.scale_x.as_ref(),
            FloatField::ScaleY => a.scale_y.as_ref(),
            FloatField::Opacity => a.opacity.as_ref(),
            FloatField::Tilt => a.tilt.as_ref(),
            FloatField::DimLeft => a.dim_left.as_ref(),
            FloatField::DimRight => a.dim_right.as_ref(),
        }
        .map(Animation::end_value)
    }

    // -- Immediate attributes --

    /// Shows or hides an actor.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn set_visibility(&mut self, id: ActorId, shown: bool) -> Result<(), SceneError> {
        let i = self.check(id)? as usize;
        if self.shown[i] != shown {
            self.shown[i] = shown;
            self.set_dirty();
        }
        Ok(())
    }

    /// Shows an actor.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn show(&mut self, id: ActorId) -> Result<(), SceneError> {
        self.set_visibility(id, true)
    }

    /// Hides an actor.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn hide(&mut self, id: ActorId) -> Result<(), SceneError> {
        self.set_visibility(id, false)
    }

    /// Sets an actor's unscaled size.
    ///
    /// Containers are always 1×1; other sizes are ignored with a warning.
    /// Resizing the stage resizes the output surface.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for a negative size.
    pub fn set_size(&mut self, id: ActorId, size: Size) -> Result<(), SceneError> {
        let idx = self.check(id)?;
        check_size(size)?;
        let i = idx as usize;
        let size = match self.kind[i] {
            ActorKind::Container => {
                if size != Size::new(1, 1) {
                    tracing::warn!(?id, ?size, "containers are always 1x1; ignoring resize");
                }
                Size::new(1, 1)
            }
            _ => size,
        };
        if self.width[i] == size.width && self.height[i] == size.height {
            return Ok(());
        }
        self.width[i] = size.width;
        self.height[i] = size.height;
        if idx == STAGE {
            self.stage_was_resized = true;
        }
        self.set_dirty();
        Ok(())
    }

    /// Sets an actor's debug name.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn set_name(&mut self, id: ActorId, name: &str) -> Result<(), SceneError> {
        let i = self.check(id)? as usize;
        self.name[i].clear();
        self.name[i].push_str(name);
        Ok(())
    }

    /// Sets the fill of a colored box, or the stage clear color.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for other kinds or non-finite
    /// components.
    pub fn set_color(&mut self, id: ActorId, color: Color) -> Result<(), SceneError> {
        let idx = self.check(id)?;
        let i = idx as usize;
        if !matches!(self.kind[i], ActorKind::ColoredBox | ActorKind::Stage) {
            return Err(SceneError::InvalidArgument("actor kind has no color"));
        }
        if ![color.r, color.g, color.b, color.a]
            .iter()
            .all(|c| c.is_finite())
        {
            return Err(SceneError::InvalidArgument("color must be finite"));
        }
        if self.color[i] == color {
            return Ok(());
        }
        self.color[i] = color;
        if idx == STAGE {
            self.stage_color_changed = true;
        }
        self.set_dirty();
        Ok(())
    }

    // -- Visibility groups --

    /// Adds an actor to a visibility group.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn add_to_visibility_group(&mut self, id: ActorId, group: u32) -> Result<(), SceneError> {
        let i = self.check(id)? as usize;
        if !self.visibility_groups[i].contains(&group) {
            self.visibility_groups[i].push(group);
            if !self.active_groups.is_empty() {
                self.set_dirty();
            }
        }
        Ok(())
    }

    /// Removes an actor from a visibility group.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn remove_from_visibility_group(
        &mut self,
        id: ActorId,
        group: u32,
    ) -> Result<(), SceneError> {
        let i = self.check(id)? as usize;
        let groups = &mut self.visibility_groups[i];
        if let Some(pos) = groups.iter().position(|&g| g == group) {
            groups.swap_remove(pos);
            if !self.active_groups.is_empty() {
                self.set_dirty();
            }
        }
        Ok(())
    }

    /// Restricts visibility to actors in one of `groups`.
    ///
    /// An empty set makes every actor eligible again. The stage is always
    /// visible.
    pub fn set_active_visibility_groups(&mut self, groups: &[u32]) {
        let mut next: Vec<u32> = groups.to_vec();
        next.sort_unstable();
        next.dedup();
        if next != self.active_groups {
            self.active_groups = next;
            self.set_dirty();
        }
    }

    // -- Stacking order --

    /// Moves `id` directly above its sibling `other`.
    ///
    /// Ignored when `id` is detached, when `other` is `id`, or when `other`
    /// is not a sibling.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] if either handle is stale.
    pub fn raise(&mut self, id: ActorId, other: ActorId) -> Result<(), SceneError> {
        let (c, s) = match self.siblings_for_restack(id, other)? {
            Some(pair) => pair,
            None => return Ok(()),
        };
        if self.prev_sibling[c as usize] == s {
            return Ok(());
        }
        self.unlink_from_parent(c);
        self.link_after(s, c);
        self.finish_restack(c);
        Ok(())
    }

    /// Moves `id` directly below its sibling `other`.
    ///
    /// Ignored when `id` is detached, when `other` is `id`, or when `other`
    /// is not a sibling.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] if either handle is stale.
    pub fn lower(&mut self, id: ActorId, other: ActorId) -> Result<(), SceneError> {
        let (c, s) = match self.siblings_for_restack(id, other)? {
            Some(pair) => pair,
            None => return Ok(()),
        };
        if self.next_sibling[c as usize] == s {
            return Ok(());
        }
        self.unlink_from_parent(c);
        self.link_before(s, c);
        self.finish_restack(c);
        Ok(())
    }

    /// Moves `id` above all of its siblings.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn raise_to_top(&mut self, id: ActorId) -> Result<(), SceneError> {
        let c = self.check(id)?;
        let p = self.parent[c as usize];
        if p == INVALID || self.next_sibling[c as usize] == INVALID {
            return Ok(());
        }
        self.unlink_from_parent(c);
        self.link_last(p, c);
        self.finish_restack(c);
        Ok(())
    }

    /// Moves `id` below all of its siblings.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn lower_to_bottom(&mut self, id: ActorId) -> Result<(), SceneError> {
        let c = self.check(id)?;
        let p = self.parent[c as usize];
        if p == INVALID || self.prev_sibling[c as usize] == INVALID {
            return Ok(());
        }
        self.unlink_from_parent(c);
        self.link_first(p, c);
        self.finish_restack(c);
        Ok(())
    }

    fn siblings_for_restack(
        &self,
        id: ActorId,
        other: ActorId,
    ) -> Result<Option<(u32, u32)>, SceneError> {
        let c = self.check(id)?;
        let s = self.check(other)?;
        let p = self.parent[c as usize];
        if p == INVALID || c == s {
            return Ok(None);
        }
        if self.parent[s as usize] != p {
            tracing::warn!(?id, ?other, "ignoring restack relative to a non-sibling");
            return Ok(None);
        }
        Ok(Some((c, s)))
    }

    fn finish_restack(&mut self, c: u32) {
        let p = self.parent[c as usize];
        self.dirty.mark(p, crate::dirty::TOPOLOGY);
        self.set_dirty();
    }

    // -- Cloning --

    /// Creates a detached copy of a colored box or image.
    ///
    /// The clone takes the actor's current attribute values. Animations,
    /// children, and visibility-group membership are not copied.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotCloneable`] for the stage, containers, and
    /// texture-pixmap actors.
    pub fn clone_actor(&mut self, id: ActorId) -> Result<ActorId, SceneError> {
        let src = self.check(id)? as usize;
        let kind = self.kind[src];
        if !kind.is_cloneable() {
            return Err(SceneError::NotCloneable(id));
        }
        let clone = self.alloc_actor(kind);
        let dst = clone.idx as usize;
        self.name[dst] = self.name[src].clone();
        self.x[dst] = self.x[src];
        self.y[dst] = self.y[src];
        self.width[dst] = self.width[src];
        self.height[dst] = self.height[src];
        self.scale_x[dst] = self.scale_x[src];
        self.scale_y[dst] = self.scale_y[src];
        self.opacity[dst] = self.opacity[src];
        self.tilt[dst] = self.tilt[src];
        self.dim_left[dst] = self.dim_left[src];
        self.dim_right[dst] = self.dim_right[src];
        self.shown[dst] = self.shown[src];
        self.color[dst] = self.color[src];
        self.image[dst] = self.image[src];
        Ok(clone)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;

    use super::*;
    use crate::clock::ManualClock;
    use crate::scene::{ImageContent, SceneConfig, TextureId};
    use crate::scheduler::NullTimer;

    fn scene() -> (Scene, ManualClock) {
        let clock = ManualClock::default();
        let scene = Scene::new(
            SceneConfig {
                stage_size: Size::new(800, 600),
                ..SceneConfig::default()
            },
            Box::new(clock.clone()),
            Box::new(NullTimer),
        );
        (scene, clock)
    }

    fn settle(s: &mut Scene) {
        let now = s.now();
        s.scheduler_mut().finish_draw(now);
    }

    #[test]
    fn immediate_move_sets_and_marks_dirty() {
        let (mut s, _clock) = scene();
        let a = s.create_container();
        settle(&mut s);
        s.move_to(a, 10, 20, 0).unwrap();
        assert_eq!(s.position(a), (10, 20));
        assert!(s.is_dirty());
        assert_eq!(s.num_animations(), 0);
    }

    #[test]
    fn animating_to_current_value_is_a_noop() {
        let (mut s, _clock) = scene();
        let a = s.create_container();
        settle(&mut s);
        s.move_to(a, 0, 0, 100).unwrap();
        assert!(!s.is_dirty());
        assert_eq!(s.num_animations(), 0);
    }

    #[test]
    fn each_animated_field_counts_once() {
        let (mut s, _clock) = scene();
        let a = s.create_container();
        s.move_to(a, 10, 20, 100).unwrap();
        assert_eq!(s.num_animations(), 2);
        // Re-targeting an animated field re-bases instead of adding.
        s.move_x(a, 50, 100).unwrap();
        assert_eq!(s.num_animations(), 2);
        assert_eq!(s.int_animation_target(a, IntField::X), Some(50));
    }

    #[test]
    fn animation_lands_exactly_and_drains_count() {
        let (mut s, clock) = scene();
        let a = s.create_container();
        s.move_x(a, 100, 100).unwrap();

        clock.advance_millis(50);
        assert!(s.advance_animations());
        assert_eq!(s.position(a).0, 50);
        assert_eq!(s.num_animations(), 1);

        clock.advance_millis(60);
        s.advance_animations();
        assert_eq!(s.position(a).0, 100);
        assert_eq!(s.num_animations(), 0);
        assert_eq!(s.int_animation_target(a, IntField::X), None);
    }

    #[test]
    fn splice_continues_from_current_value() {
        let (mut s, clock) = scene();
        let a = s.create_container();
        s.set_opacity(a, 0.0, 100).unwrap();
        clock.advance_millis(50);
        s.advance_animations();
        let mid = s.opacity(a);
        assert!((mid - 0.5).abs() < 1e-4);

        // Re-target later in the same frame without an intervening advance.
        clock.advance_millis(10);
        let expected = {
            let anim = Animation::new(1.0_f32, 0.0, HostTime(0), HostTime::from_millis(100));
            let mut v = 0.0;
            anim.eval(HostTime::from_millis(60), &mut v);
            v
        };
        s.set_opacity(a, 1.0, 100).unwrap();
        assert!((s.opacity(a) - expected).abs() < 1e-6);
        s.advance_animations();
        assert!((s.opacity(a) - expected).abs() < 1e-6);
        assert_eq!(s.num_animations(), 1);
    }

    #[test]
    fn zero_duration_cancels_running_animation() {
        let (mut s, clock) = scene();
        let a = s.create_container();
        s.set_tilt(a, 1.0, 200).unwrap();
        clock.advance_millis(20);
        s.set_tilt(a, 0.25, 0).unwrap();
        assert_eq!(s.tilt(a), 0.25);
        assert_eq!(s.num_animations(), 0);
    }

    #[test]
    fn destroy_cancels_animations() {
        let (mut s, _clock) = scene();
        let a = s.create_container();
        s.move_to(a, 5, 5, 100).unwrap();
        s.set_opacity(a, 0.5, 100).unwrap();
        assert_eq!(s.num_animations(), 3);
        s.destroy_actor(a).unwrap();
        assert_eq!(s.num_animations(), 0);
    }

    #[test]
    fn show_dimmed_animates_both_edges() {
        let (mut s, clock) = scene();
        let a = s.create_container();
        assert!(!s.is_dimmed(a));
        s.show_dimmed(a, true, 100).unwrap();
        assert_eq!(s.num_animations(), 2);
        assert_eq!(
            s.float_animation_target(a, FloatField::DimRight),
            Some(DIMMED_OPACITY_RIGHT)
        );

        clock.advance_millis(100);
        s.advance_animations();
        assert_eq!(s.dimmed_opacity(a), (DIMMED_OPACITY_LEFT, DIMMED_OPACITY_RIGHT));
        assert!(s.is_dimmed(a));
        assert_eq!(s.num_animations(), 0);

        s.show_dimmed(a, false, 0).unwrap();
        assert_eq!(s.dimmed_opacity(a), (0.0, 0.0));
        assert!(!s.is_dimmed(a));
        assert!(matches!(
            s.animate_float(a, FloatField::DimLeft, 1.5, 0),
            Err(SceneError::InvalidArgument(_))
        ));
    }

    #[test]
    fn move_keyframes_pass_through_each_stop() {
        let (mut s, clock) = scene();
        let a = s.create_container();
        s.move_x(a, 500, 1000).unwrap();
        s.set_move_keyframes(
            a,
            &[
                MoveKeyframe { x: 100, y: 0, delay_ms: 100 },
                MoveKeyframe { x: 100, y: 50, delay_ms: 100 },
            ],
        )
        .unwrap();
        // The running x animation is replaced, not added to.
        assert_eq!(s.num_animations(), 2);
        assert_eq!(s.int_animation_target(a, IntField::X), Some(100));
        assert_eq!(s.int_animation_target(a, IntField::Y), Some(50));

        clock.advance_millis(100);
        s.advance_animations();
        assert_eq!(s.position(a), (100, 0));
        clock.advance_millis(50);
        s.advance_animations();
        assert_eq!(s.position(a), (100, 25));
        clock.advance_millis(50);
        s.advance_animations();
        assert_eq!(s.position(a), (100, 50));
        assert_eq!(s.num_animations(), 0);
    }

    #[test]
    fn move_keyframes_need_positive_delays() {
        let (mut s, _clock) = scene();
        let a = s.create_container();
        s.move_to(a, 7, 8, 0).unwrap();
        assert!(matches!(
            s.set_move_keyframes(a, &[MoveKeyframe { x: 1, y: 1, delay_ms: 0 }]),
            Err(SceneError::InvalidArgument(_))
        ));
        assert!(matches!(
            s.set_move_keyframes(a, &[]),
            Err(SceneError::InvalidArgument(_))
        ));
        assert_eq!(s.position(a), (7, 8));
        assert_eq!(s.num_animations(), 0);
    }

    #[test]
    fn out_of_range_values_are_rejected_without_change() {
        let (mut s, _clock) = scene();
        let a = s.create_container();
        assert!(matches!(
            s.set_opacity(a, 1.5, 0),
            Err(SceneError::InvalidArgument(_))
        ));
        assert!(matches!(
            s.set_tilt(a, f32::NAN, 0),
            Err(SceneError::InvalidArgument(_))
        ));
        assert!(matches!(
            s.set_scale(a, 2.0, -1.0, 0),
            Err(SceneError::InvalidArgument(_))
        ));
        assert_eq!(s.opacity(a), 1.0);
        assert_eq!(s.scale(a), (1.0, 1.0));
    }

    #[test]
    fn container_size_is_fixed() {
        let (mut s, _clock) = scene();
        let group = s.create_container();
        s.set_size(group, Size::new(300, 200)).unwrap();
        assert_eq!(s.size(group), Size::new(1, 1));
    }

    #[test]
    fn stage_resize_sets_flag() {
        let (mut s, _clock) = scene();
        let stage = s.stage();
        s.clear_stage_flags();
        s.set_size(stage, Size::new(1024, 768)).unwrap();
        assert!(s.stage_was_resized());
        assert_eq!(s.stage_size(), Size::new(1024, 768));
    }

    #[test]
    fn set_color_only_on_boxes_and_stage() {
        let (mut s, _clock) = scene();
        let stage = s.stage();
        let group = s.create_container();
        s.clear_stage_flags();
        s.set_color(stage, Color::WHITE).unwrap();
        assert!(s.stage_color_changed());
        assert!(matches!(
            s.set_color(group, Color::WHITE),
            Err(SceneError::InvalidArgument(_))
        ));
    }

    #[test]
    fn raise_and_lower_reorder_siblings() {
        let (mut s, _clock) = scene();
        let stage = s.stage();
        let a = s.create_container();
        let b = s.create_container();
        let c = s.create_container();
        for id in [a, b, c] {
            s.add_child(stage, id).unwrap();
        }

        s.raise_to_top(a).unwrap();
        assert_eq!(s.children(stage).collect::<Vec<_>>(), vec![b, c, a]);
        s.lower_to_bottom(c).unwrap();
        assert_eq!(s.children(stage).collect::<Vec<_>>(), vec![c, b, a]);
        s.raise(c, b).unwrap();
        assert_eq!(s.children(stage).collect::<Vec<_>>(), vec![b, c, a]);
        s.lower(a, b).unwrap();
        assert_eq!(s.children(stage).collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn restack_relative_to_non_sibling_is_ignored() {
        let (mut s, _clock) = scene();
        let stage = s.stage();
        let group = s.create_container();
        let a = s.create_container();
        let b = s.create_container();
        s.add_child(stage, group).unwrap();
        s.add_child(stage, a).unwrap();
        s.add_child(group, b).unwrap();

        s.raise(a, b).unwrap();
        s.raise(a, a).unwrap();
        assert_eq!(s.children(stage).collect::<Vec<_>>(), vec![group, a]);

        let loose = s.create_container();
        s.raise_to_top(loose).unwrap();
        assert_eq!(s.parent(loose), None);
    }

    #[test]
    fn clone_copies_scalars_only() {
        let (mut s, _clock) = scene();
        let image = ImageContent {
            texture: TextureId(7),
            has_alpha: false,
        };
        let a = s.create_image(image, Size::new(4, 8)).unwrap();
        s.move_to(a, 3, 4, 0).unwrap();
        s.set_opacity(a, 0.5, 100).unwrap();
        s.add_to_visibility_group(a, 2).unwrap();

        let b = s.clone_actor(a).unwrap();
        assert_eq!(s.position(b), (3, 4));
        assert_eq!(s.size(b), Size::new(4, 8));
        assert_eq!(s.image(b), Some(image));
        assert_eq!(s.parent(b), None);
        assert!(s.visibility_groups(b).is_empty());
        assert_eq!(s.float_animation_target(b, FloatField::Opacity), None);

        let pixmap = s.create_texture_pixmap();
        assert_eq!(s.clone_actor(pixmap), Err(SceneError::NotCloneable(pixmap)));
        let stage = s.stage();
        assert_eq!(s.clone_actor(stage), Err(SceneError::NotCloneable(stage)));
    }

    #[test]
    fn visibility_groups_filter_actors() {
        let (mut s, _clock) = scene();
        let a = s.create_container();
        let b = s.create_container();
        s.add_to_visibility_group(a, 1).unwrap();

        s.set_active_visibility_groups(&[1]);
        assert!(s.is_visible(a));
        assert!(!s.is_visible(b));
        let stage = s.stage();
        assert!(s.is_visible(stage));

        s.remove_from_visibility_group(a, 1).unwrap();
        assert!(!s.is_visible(a));
        s.set_active_visibility_groups(&[]);
        assert!(s.is_visible(a));
        assert!(s.is_visible(b));
    }

    #[test]
    fn hidden_and_transparent_actors_are_invisible() {
        let (mut s, _clock) = scene();
        let a = s.create_container();
        s.hide(a).unwrap();
        assert!(!s.is_visible(a));
        s.show(a).unwrap();
        s.set_opacity(a, 0.0005, 0).unwrap();
        assert!(!s.is_visible(a));
    }
}
