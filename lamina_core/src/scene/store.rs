// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays actor storage with allocation, topology, and getters.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use understory_dirty::{CycleHandling, DirtyTracker};

use crate::animation::Animation;
use crate::clock::Clock;
use crate::dirty;
use crate::error::SceneError;
use crate::geometry::{Color, IntRect, Size};
use crate::scheduler::{DrawScheduler, RedrawTimer, SchedulerConfig};
use crate::time::HostTime;
use crate::transform::Transform3d;

use super::id::{INVALID, ActorId, TextureId};
use super::kind::{ActorKind, ImageContent, PixmapState};
use super::traverse::Children;

/// Configuration for a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    /// Initial size of the output surface.
    pub stage_size: Size,
    /// Color the stage is cleared to.
    pub stage_color: Color,
    /// Redraw timing.
    pub scheduler: SchedulerConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            stage_size: Size::new(1, 1),
            stage_color: Color::BLACK,
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Per-actor results written by the layering pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerInfo {
    /// Depth in paint order; larger is nearer the viewer.
    pub depth: f32,
    /// Product of the actor's and its ancestors' opacities.
    pub effective_opacity: f32,
    /// Whether the actor hides everything behind it within its bounds.
    pub is_opaque: bool,
    /// Whether the actor is skipped by the draw pass.
    pub culled: bool,
    /// Maps the unit square onto the actor's quad in stage pixels.
    pub model_view: Transform3d,
    /// Dimming at the quad's left and right edges.
    pub dim: [f32; 2],
    /// On-stage bounds, clipped to the stage.
    pub screen_bounds: IntRect,
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self {
            depth: 0.0,
            effective_opacity: 1.0,
            is_opaque: false,
            culled: false,
            model_view: Transform3d::IDENTITY,
            dim: [0.0; 2],
            screen_bounds: IntRect::EMPTY,
        }
    }
}

/// In-flight animations of one actor, at most one per field.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct FieldAnimations {
    pub(crate) x: Option<Animation<i32>>,
    pub(crate) y: Option<Animation<i32>>,
    pub(crate) scale_x: Option<Animation<f32>>,
    pub(crate) scale_y: Option<Animation<f32>>,
    pub(crate) opacity: Option<Animation<f32>>,
    pub(crate) tilt: Option<Animation<f32>>,
    pub(crate) dim_left: Option<Animation<f32>>,
    pub(crate) dim_right: Option<Animation<f32>>,
}

impl FieldAnimations {
    pub(crate) fn count(&self) -> u32 {
        u32::from(self.x.is_some())
            + u32::from(self.y.is_some())
            + u32::from(self.scale_x.is_some())
            + u32::from(self.scale_y.is_some())
            + u32::from(self.opacity.is_some())
            + u32::from(self.tilt.is_some())
            + u32::from(self.dim_left.is_some())
            + u32::from(self.dim_right.is_some())
    }
}

/// The actor tree.
///
/// Actors are addressed by [`ActorId`] handles. Internally, each actor
/// occupies a slot in parallel arrays. Destroyed actors are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// The scene owns the stage (slot 0), the [`DrawScheduler`] that arms the
/// redraw timer, and the [`Clock`] animations read. Every mutation of a
/// rendered attribute marks the scene dirty immediately; starting or
/// cancelling an animation adjusts the in-flight animation count.
///
/// Children are kept back-to-front: the first child is painted first
/// (furthest away), the last child is nearest the viewer.
pub struct Scene {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties (set by callers) --
    pub(crate) kind: Vec<ActorKind>,
    pub(crate) name: Vec<String>,
    pub(crate) x: Vec<i32>,
    pub(crate) y: Vec<i32>,
    pub(crate) width: Vec<i32>,
    pub(crate) height: Vec<i32>,
    pub(crate) scale_x: Vec<f32>,
    pub(crate) scale_y: Vec<f32>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) tilt: Vec<f32>,
    pub(crate) dim_left: Vec<f32>,
    pub(crate) dim_right: Vec<f32>,
    pub(crate) shown: Vec<bool>,
    pub(crate) color: Vec<Color>,
    pub(crate) visibility_groups: Vec<Vec<u32>>,

    // -- Content --
    pub(crate) image: Vec<Option<ImageContent>>,
    pub(crate) pixmap: Vec<PixmapState>,

    // -- Computed (written by the layering pass) --
    pub(crate) layer: Vec<LayerInfo>,

    // -- Animation --
    pub(crate) animations: Vec<FieldAnimations>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,

    // -- Stage and scene-wide state --
    pub(crate) stage_was_resized: bool,
    pub(crate) stage_color_changed: bool,
    pub(crate) active_groups: Vec<u32>,
    pub(crate) released_textures: Vec<TextureId>,
    pub(crate) actor_count: usize,

    // -- Time and scheduling --
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) scheduler: DrawScheduler,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("actor_count", &self.actor_count)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

/// Slot index of the stage.
pub(crate) const STAGE: u32 = 0;

impl Scene {
    /// Creates a scene containing only the stage.
    ///
    /// The scene takes ownership of the time source and the redraw timer.
    /// The timer is armed right away so the first frame gets drawn.
    #[must_use]
    pub fn new(config: SceneConfig, clock: Box<dyn Clock>, timer: Box<dyn RedrawTimer>) -> Self {
        let now = clock.now();
        let mut scene = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            name: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            width: Vec::new(),
            height: Vec::new(),
            scale_x: Vec::new(),
            scale_y: Vec::new(),
            opacity: Vec::new(),
            tilt: Vec::new(),
            dim_left: Vec::new(),
            dim_right: Vec::new(),
            shown: Vec::new(),
            color: Vec::new(),
            visibility_groups: Vec::new(),
            image: Vec::new(),
            pixmap: Vec::new(),
            layer: Vec::new(),
            animations: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            stage_was_resized: true,
            stage_color_changed: true,
            active_groups: Vec::new(),
            released_textures: Vec::new(),
            actor_count: 0,
            clock,
            scheduler: DrawScheduler::new(config.scheduler, timer, now),
        };
        let stage = scene.alloc_actor(ActorKind::Stage);
        debug_assert_eq!(stage.idx, STAGE, "stage must occupy slot 0");
        let size = Size::new(config.stage_size.width.max(1), config.stage_size.height.max(1));
        scene.width[STAGE as usize] = size.width;
        scene.height[STAGE as usize] = size.height;
        scene.color[STAGE as usize] = config.stage_color;
        scene.name[STAGE as usize] = String::from("stage");
        scene
    }

    // -- Allocation API --

    /// Returns the stage handle.
    #[must_use]
    pub fn stage(&self) -> ActorId {
        ActorId {
            idx: STAGE,
            generation: self.generation[STAGE as usize],
        }
    }

    /// Creates a detached, empty container.
    pub fn create_container(&mut self) -> ActorId {
        self.alloc_actor(ActorKind::Container)
    }

    /// Creates a detached solid-color rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for a negative size.
    pub fn create_colored_box(&mut self, size: Size, color: Color) -> Result<ActorId, SceneError> {
        check_size(size)?;
        let id = self.alloc_actor(ActorKind::ColoredBox);
        let i = id.idx as usize;
        self.width[i] = size.width;
        self.height[i] = size.height;
        self.color[i] = color;
        Ok(id)
    }

    /// Creates a detached quad showing a shared texture.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for a negative size.
    pub fn create_image(
        &mut self,
        content: ImageContent,
        size: Size,
    ) -> Result<ActorId, SceneError> {
        check_size(size)?;
        let id = self.alloc_actor(ActorKind::Image);
        let i = id.idx as usize;
        self.width[i] = size.width;
        self.height[i] = size.height;
        self.image[i] = Some(content);
        Ok(id)
    }

    /// Re-points image actors after their shared textures were re-created.
    ///
    /// Each `(old, new)` pair moves every image actor showing `old` to `new`;
    /// a `None` replacement leaves those actors without content, so they draw
    /// as placeholders. Pairs are applied in one pass, so a new texture that
    /// reuses another pair's old id is not remapped twice. Returns the number
    /// of actors changed.
    pub fn remap_image_textures(
        &mut self,
        remapped: &[(TextureId, Option<ImageContent>)],
    ) -> usize {
        let mut changed = 0;
        for image in &mut self.image {
            let Some(current) = *image else { continue };
            if let Some((_, replacement)) = remapped.iter().find(|(old, _)| *old == current.texture)
            {
                *image = *replacement;
                changed += 1;
            }
        }
        if changed > 0 {
            self.set_dirty();
        }
        changed
    }

    /// Creates a detached, unbound texture-pixmap actor.
    pub fn create_texture_pixmap(&mut self) -> ActorId {
        self.alloc_actor(ActorKind::TexturePixmap)
    }

    /// Destroys an actor, freeing its slot for reuse.
    ///
    /// The actor is detached from its parent, its in-flight animations are
    /// cancelled, and its GPU texture (if any) is queued for release.
    /// Children of a destroyed container become detached; their handles stay
    /// valid. The scene is always marked dirty.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle and
    /// [`SceneError::CannotDestroyStage`] for the stage.
    pub fn destroy_actor(&mut self, id: ActorId) -> Result<(), SceneError> {
        let idx = self.check(id)?;
        if idx == STAGE {
            return Err(SceneError::CannotDestroyStage);
        }
        let i = idx as usize;

        if self.parent[i] != INVALID {
            let p = self.parent[i];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }

        let mut child = self.first_child[i];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.parent[child as usize] = INVALID;
            self.prev_sibling[child as usize] = INVALID;
            self.next_sibling[child as usize] = INVALID;
            child = next;
        }
        self.first_child[i] = INVALID;

        for _ in 0..self.animations[i].count() {
            self.scheduler.decrement_animations();
        }
        self.animations[i] = FieldAnimations::default();

        if let Some(texture) = self.pixmap[i].texture.take() {
            self.released_textures.push(texture);
        }
        self.pixmap[i] = PixmapState::default();
        self.image[i] = None;
        self.visibility_groups[i].clear();
        self.name[i].clear();

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[i] = self.generation[i].wrapping_add(1);

        self.free_list.push(idx);
        self.dirty.mark(STAGE, dirty::TOPOLOGY);
        self.set_dirty();
        Ok(())
    }

    /// Returns whether the given handle refers to a live actor.
    #[must_use]
    pub fn is_alive(&self, id: ActorId) -> bool {
        // Freed slots already carry a generation no handle was issued with.
        id.idx < self.len && self.generation[id.idx as usize] == id.generation
    }

    // -- Topology API --

    /// Attaches `child` as the top-most child of `container`.
    ///
    /// A child that already has a parent is detached from it first.
    ///
    /// # Errors
    ///
    /// Fails without touching the tree if either handle is stale, if
    /// `container` cannot hold children, if `child` is the stage, or if
    /// `container` is `child` or one of its descendants.
    pub fn add_child(&mut self, container: ActorId, child: ActorId) -> Result<(), SceneError> {
        let p = self.check(container)?;
        let c = self.check(child)?;
        if !self.kind[p as usize].is_container() {
            return Err(SceneError::NotAContainer(container));
        }
        if c == STAGE {
            return Err(SceneError::InvalidArgument("the stage cannot be a child"));
        }
        if self.is_ancestor_or_self(c, p) {
            return Err(SceneError::InvalidArgument(
                "cannot attach an actor to itself or its descendant",
            ));
        }

        let old_parent = self.parent[c as usize];
        if old_parent != INVALID {
            self.unlink_from_parent(c);
            self.dirty.mark(old_parent, dirty::TOPOLOGY);
        }
        self.link_last(p, c);
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.set_dirty();
        Ok(())
    }

    /// Detaches `child` from its parent. Detached actors are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleActor`] for a stale handle.
    pub fn remove_from_parent(&mut self, child: ActorId) -> Result<(), SceneError> {
        let c = self.check(child)?;
        let p = self.parent[c as usize];
        if p == INVALID {
            return Ok(());
        }
        self.unlink_from_parent(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.set_dirty();
        Ok(())
    }

    /// Returns the parent of an actor, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: ActorId) -> Option<ActorId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of an actor, back to
    /// front.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: ActorId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns `true` if the actor has at least one child.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn has_children(&self, id: ActorId) -> bool {
        self.validate(id);
        self.first_child[id.idx as usize] != INVALID
    }

    // -- Property getters (read-only) --

    /// Returns the kind of an actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn kind(&self, id: ActorId) -> ActorKind {
        self.validate(id);
        self.kind[id.idx as usize]
    }

    /// Returns the debug name of an actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn name(&self, id: ActorId) -> &str {
        self.validate(id);
        &self.name[id.idx as usize]
    }

    /// Returns the position of an actor relative to its parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn position(&self, id: ActorId) -> (i32, i32) {
        self.validate(id);
        (self.x[id.idx as usize], self.y[id.idx as usize])
    }

    /// Returns the unscaled size of an actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn size(&self, id: ActorId) -> Size {
        self.validate(id);
        Size::new(self.width[id.idx as usize], self.height[id.idx as usize])
    }

    /// Returns the scale factors of an actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn scale(&self, id: ActorId) -> (f32, f32) {
        self.validate(id);
        (self.scale_x[id.idx as usize], self.scale_y[id.idx as usize])
    }

    /// Returns the actor's own opacity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn opacity(&self, id: ActorId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns the actor's tilt.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn tilt(&self, id: ActorId) -> f32 {
        self.validate(id);
        self.tilt[id.idx as usize]
    }

    /// Returns the actor's dimming at its left and right edges.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn dimmed_opacity(&self, id: ActorId) -> (f32, f32) {
        self.validate(id);
        let i = id.idx as usize;
        (self.dim_left[i], self.dim_right[i])
    }

    /// Returns `true` while the actor is (becoming) noticeably dimmed.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn is_dimmed(&self, id: ActorId) -> bool {
        self.dimmed_opacity(id).1 > VISIBLE_OPACITY
    }

    /// Returns the actor's visibility flag.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn is_shown(&self, id: ActorId) -> bool {
        self.validate(id);
        self.shown[id.idx as usize]
    }

    /// Returns `true` if the actor is shown, not (nearly) transparent, and in
    /// an active visibility group.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn is_visible(&self, id: ActorId) -> bool {
        self.validate(id);
        self.is_visible_at(id.idx)
    }

    /// Returns the color of a colored box, or the stage clear color.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn color(&self, id: ActorId) -> Color {
        self.validate(id);
        self.color[id.idx as usize]
    }

    /// Returns the shared texture shown by an image actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn image(&self, id: ActorId) -> Option<ImageContent> {
        self.validate(id);
        self.image[id.idx as usize]
    }

    /// Returns the binding state of a texture-pixmap actor.
    ///
    /// Other kinds report the default (unbound) state.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn pixmap(&self, id: ActorId) -> &PixmapState {
        self.validate(id);
        &self.pixmap[id.idx as usize]
    }

    /// Returns `true` if the actor's texture must be recreated before the
    /// next draw.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn is_pixmap_invalid(&self, id: ActorId) -> bool {
        self.pixmap(id).invalid
    }

    /// Returns the visibility groups the actor belongs to.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn visibility_groups(&self, id: ActorId) -> &[u32] {
        self.validate(id);
        &self.visibility_groups[id.idx as usize]
    }

    /// Returns the layering results for an actor.
    ///
    /// Only meaningful after a layering pass has run.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn layer(&self, id: ActorId) -> &LayerInfo {
        self.validate(id);
        &self.layer[id.idx as usize]
    }

    /// Returns the depth assigned by the last layering pass.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn depth(&self, id: ActorId) -> f32 {
        self.layer(id).depth
    }

    /// Returns whether the last layering pass culled the actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn is_culled(&self, id: ActorId) -> bool {
        self.layer(id).culled
    }

    /// Returns whether the last layering pass found the actor opaque.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn is_opaque(&self, id: ActorId) -> bool {
        self.layer(id).is_opaque
    }

    // -- Scene-wide state --

    /// Returns the size of the output surface.
    #[must_use]
    pub fn stage_size(&self) -> Size {
        Size::new(self.width[STAGE as usize], self.height[STAGE as usize])
    }

    /// Returns the stage clear color.
    #[must_use]
    pub fn stage_color(&self) -> Color {
        self.color[STAGE as usize]
    }

    /// Returns whether the stage was resized since the last draw.
    #[must_use]
    pub fn stage_was_resized(&self) -> bool {
        self.stage_was_resized
    }

    /// Returns whether the stage color changed since the last draw.
    #[must_use]
    pub fn stage_color_changed(&self) -> bool {
        self.stage_color_changed
    }

    /// Clears the stage's resize and color-change flags.
    ///
    /// Called by the draw pass once it has reacted to them.
    pub fn clear_stage_flags(&mut self) {
        self.stage_was_resized = false;
        self.stage_color_changed = false;
    }

    /// Returns the active visibility groups. Empty means every actor is
    /// eligible.
    #[must_use]
    pub fn active_visibility_groups(&self) -> &[u32] {
        &self.active_groups
    }

    /// Returns the number of actors in the stage tree counted by the last
    /// animation pass.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actor_count
    }

    /// Returns the current time from the scene's clock.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.clock.now()
    }

    /// Returns the redraw scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &DrawScheduler {
        &self.scheduler
    }

    /// Returns the redraw scheduler for updates after a draw.
    pub fn scheduler_mut(&mut self) -> &mut DrawScheduler {
        &mut self.scheduler
    }

    /// Returns `true` if the whole frame needs redrawing.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    /// Returns the number of in-flight animations.
    #[must_use]
    pub fn num_animations(&self) -> u32 {
        self.scheduler.num_animations()
    }

    /// Marks the whole frame as needing a redraw.
    pub fn set_dirty(&mut self) {
        let now = self.clock.now();
        self.scheduler.set_dirty(now);
    }

    /// Marks damaged contents as needing a redraw.
    pub fn set_partially_dirty(&mut self) {
        let now = self.clock.now();
        self.scheduler.set_partially_dirty(now);
    }

    // -- Raw-index accessors for the render passes --
    //
    // These accept raw slot indices (as found in `traversal_order()`) rather
    // than `ActorId` handles, skipping generation validation.

    /// Returns the current handle for raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> ActorId {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        ActorId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the kind at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn kind_at(&self, idx: u32) -> ActorKind {
        self.kind[self.slot(idx)]
    }

    /// Returns the layering results at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn layer_at(&self, idx: u32) -> &LayerInfo {
        &self.layer[self.slot(idx)]
    }

    /// Returns the color at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn color_at(&self, idx: u32) -> Color {
        self.color[self.slot(idx)]
    }

    /// Returns the image content at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn image_at(&self, idx: u32) -> Option<ImageContent> {
        self.image[self.slot(idx)]
    }

    /// Returns the pixmap binding at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn pixmap_at(&self, idx: u32) -> &PixmapState {
        &self.pixmap[self.slot(idx)]
    }

    /// Returns the unscaled size at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn size_at(&self, idx: u32) -> Size {
        let i = self.slot(idx);
        Size::new(self.width[i], self.height[i])
    }

    // -- Internal helpers --

    pub(crate) fn is_visible_at(&self, idx: u32) -> bool {
        let i = idx as usize;
        self.shown[i] && self.opacity[i] > VISIBLE_OPACITY && self.in_active_group(idx)
    }

    pub(crate) fn in_active_group(&self, idx: u32) -> bool {
        idx == STAGE
            || self.active_groups.is_empty()
            || self.visibility_groups[idx as usize]
                .iter()
                .any(|g| self.active_groups.contains(g))
    }

    pub(crate) fn alloc_actor(&mut self, kind: ActorKind) -> ActorId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; `destroy_actor` already bumped its generation.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.x[i] = 0;
            self.y[i] = 0;
            self.width[i] = 1;
            self.height[i] = 1;
            self.scale_x[i] = 1.0;
            self.scale_y[i] = 1.0;
            self.opacity[i] = 1.0;
            self.tilt[i] = 0.0;
            self.dim_left[i] = 0.0;
            self.dim_right[i] = 0.0;
            self.shown[i] = true;
            self.color[i] = Color::BLACK;
            self.layer[i] = LayerInfo::default();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.name.push(String::new());
            self.x.push(0);
            self.y.push(0);
            self.width.push(1);
            self.height.push(1);
            self.scale_x.push(1.0);
            self.scale_y.push(1.0);
            self.opacity.push(1.0);
            self.tilt.push(0.0);
            self.dim_left.push(0.0);
            self.dim_right.push(0.0);
            self.shown.push(true);
            self.color.push(Color::BLACK);
            self.visibility_groups.push(Vec::new());
            self.image.push(None);
            self.pixmap.push(PixmapState::default());
            self.layer.push(LayerInfo::default());
            self.animations.push(FieldAnimations::default());
            self.generation.push(0);
            idx
        };

        self.dirty.mark(idx, dirty::TOPOLOGY);

        ActorId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the slot index of a live handle.
    pub(crate) fn check(&self, id: ActorId) -> Result<u32, SceneError> {
        if self.is_alive(id) {
            Ok(id.idx)
        } else {
            Err(SceneError::StaleActor(id))
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: ActorId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ActorId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn slot(&self, idx: u32) -> usize {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        idx as usize
    }

    /// Returns `true` if `ancestor` is `idx` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: u32, mut idx: u32) -> bool {
        while idx != INVALID {
            if idx == ancestor {
                return true;
            }
            idx = self.parent[idx as usize];
        }
        false
    }

    /// Appends `c` as the last (top-most) child of `p`.
    pub(crate) fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Inserts detached `c` as the first (bottom-most) child of `p`.
    pub(crate) fn link_first(&mut self, p: u32, c: u32) {
        let first = self.first_child[p as usize];
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = first;
        if first != INVALID {
            self.prev_sibling[first as usize] = c;
        }
        self.first_child[p as usize] = c;
    }

    /// Inserts detached `c` directly after (above) attached `s`.
    pub(crate) fn link_after(&mut self, s: u32, c: u32) {
        let p = self.parent[s as usize];
        let next = self.next_sibling[s as usize];
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = s;
        self.next_sibling[c as usize] = next;
        if next != INVALID {
            self.prev_sibling[next as usize] = c;
        }
        self.next_sibling[s as usize] = c;
    }

    /// Inserts detached `c` directly before (below) attached `s`.
    pub(crate) fn link_before(&mut self, s: u32, c: u32) {
        let p = self.parent[s as usize];
        let prev = self.prev_sibling[s as usize];
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = prev;
        if prev != INVALID {
            self.next_sibling[prev as usize] = c;
        } else {
            // `s` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    pub(crate) fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

/// Opacity at or below which an actor counts as invisible.
pub(crate) const VISIBLE_OPACITY: f32 = 0.001;

pub(crate) fn check_size(size: Size) -> Result<(), SceneError> {
    if size.width < 0 || size.height < 0 {
        Err(SceneError::InvalidArgument("size must not be negative"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::clock::ManualClock;
    use crate::scheduler::NullTimer;

    fn scene() -> Scene {
        Scene::new(
            SceneConfig {
                stage_size: Size::new(800, 600),
                ..SceneConfig::default()
            },
            Box::new(ManualClock::default()),
            Box::new(NullTimer),
        )
    }

    #[test]
    fn stage_exists_and_is_sized() {
        let s = scene();
        let stage = s.stage();
        assert!(s.is_alive(stage));
        assert_eq!(s.kind(stage), ActorKind::Stage);
        assert_eq!(s.stage_size(), Size::new(800, 600));
        assert_eq!(s.parent(stage), None);
    }

    #[test]
    fn actor_defaults() {
        let mut s = scene();
        let a = s.create_container();
        assert_eq!(s.position(a), (0, 0));
        assert_eq!(s.size(a), Size::new(1, 1));
        assert_eq!(s.scale(a), (1.0, 1.0));
        assert_eq!(s.opacity(a), 1.0);
        assert!(s.is_shown(a));
        assert!(s.is_visible(a));
    }

    #[test]
    fn create_and_destroy() {
        let mut s = scene();
        let id = s.create_container();
        assert!(s.is_alive(id));
        s.destroy_actor(id).unwrap();
        assert!(!s.is_alive(id));
        assert_eq!(s.destroy_actor(id), Err(SceneError::StaleActor(id)));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut s = scene();
        let id1 = s.create_container();
        s.destroy_actor(id1).unwrap();
        let id2 = s.create_container();
        // id2 reuses the same slot but has a different generation.
        assert!(!s.is_alive(id1));
        assert!(s.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_eq!(id2.generation, id1.generation + 1, "one bump per reuse");
        s.destroy_actor(id2).unwrap();
        assert!(!s.is_alive(id1));
        assert!(!s.is_alive(id2));
    }

    #[test]
    #[should_panic(expected = "stale ActorId")]
    fn getter_on_stale_handle_panics() {
        let mut s = scene();
        let id = s.create_container();
        s.destroy_actor(id).unwrap();
        let _ = s.size(id);
    }

    #[test]
    fn image_textures_are_remapped_in_one_pass() {
        let mut s = scene();
        let image = |t| ImageContent {
            texture: TextureId(t),
            has_alpha: false,
        };
        let a = s.create_image(image(1), Size::new(4, 4)).unwrap();
        let b = s.create_image(image(2), Size::new(4, 4)).unwrap();
        let c = s.create_image(image(3), Size::new(4, 4)).unwrap();
        let now = s.now();
        s.scheduler_mut().finish_draw(now);

        let changed = s.remap_image_textures(&[
            (TextureId(1), Some(image(2))),
            (TextureId(2), Some(image(5))),
            (TextureId(3), None),
        ]);
        assert_eq!(changed, 3);
        assert_eq!(s.image(a), Some(image(2)));
        assert_eq!(s.image(b), Some(image(5)));
        assert_eq!(s.image(c), None);
        assert!(s.is_dirty());
        assert_eq!(s.remap_image_textures(&[(TextureId(9), None)]), 0);
    }

    #[test]
    fn stage_cannot_be_destroyed() {
        let mut s = scene();
        let stage = s.stage();
        assert_eq!(s.destroy_actor(stage), Err(SceneError::CannotDestroyStage));
    }

    #[test]
    fn negative_sizes_are_rejected() {
        let mut s = scene();
        let err = s.create_colored_box(Size::new(-1, 4), Color::WHITE);
        assert!(matches!(err, Err(SceneError::InvalidArgument(_))));
    }

    #[test]
    fn add_child_orders_back_to_front() {
        let mut s = scene();
        let stage = s.stage();
        let a = s.create_container();
        let b = s.create_container();
        s.add_child(stage, a).unwrap();
        s.add_child(stage, b).unwrap();

        assert_eq!(s.parent(a), Some(stage));
        let kids: Vec<_> = s.children(stage).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn add_child_reparents() {
        let mut s = scene();
        let stage = s.stage();
        let g1 = s.create_container();
        let g2 = s.create_container();
        let leaf = s.create_texture_pixmap();
        s.add_child(stage, g1).unwrap();
        s.add_child(stage, g2).unwrap();
        s.add_child(g1, leaf).unwrap();
        s.add_child(g2, leaf).unwrap();

        assert_eq!(s.parent(leaf), Some(g2));
        assert!(!s.has_children(g1));
        assert_eq!(s.children(g2).collect::<Vec<_>>(), vec![leaf]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut s = scene();
        let outer = s.create_container();
        let inner = s.create_container();
        s.add_child(outer, inner).unwrap();

        assert!(matches!(
            s.add_child(inner, outer),
            Err(SceneError::InvalidArgument(_))
        ));
        assert!(matches!(
            s.add_child(outer, outer),
            Err(SceneError::InvalidArgument(_))
        ));
        // The tree is unchanged.
        assert_eq!(s.parent(inner), Some(outer));
        assert_eq!(s.parent(outer), None);
    }

    #[test]
    fn non_containers_reject_children() {
        let mut s = scene();
        let leaf = s.create_texture_pixmap();
        let other = s.create_texture_pixmap();
        assert_eq!(
            s.add_child(leaf, other),
            Err(SceneError::NotAContainer(leaf))
        );
        let stage = s.stage();
        let group = s.create_container();
        assert!(matches!(
            s.add_child(group, stage),
            Err(SceneError::InvalidArgument(_))
        ));
    }

    #[test]
    fn destroying_container_orphans_children() {
        let mut s = scene();
        let stage = s.stage();
        let group = s.create_container();
        let a = s.create_texture_pixmap();
        let b = s.create_texture_pixmap();
        s.add_child(stage, group).unwrap();
        s.add_child(group, a).unwrap();
        s.add_child(group, b).unwrap();

        s.destroy_actor(group).unwrap();
        assert!(s.is_alive(a));
        assert_eq!(s.parent(a), None);
        assert_eq!(s.parent(b), None);
        assert!(!s.has_children(stage));
    }

    #[test]
    fn destroy_marks_dirty() {
        let mut s = scene();
        let a = s.create_container();
        let now = s.now();
        s.scheduler_mut().finish_draw(now);
        assert!(!s.is_dirty());
        s.destroy_actor(a).unwrap();
        assert!(s.is_dirty());
    }
}
