// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The draw loop.
//!
//! Every draw runs the same steps in order:
//!
//! 1. **Animate**: advance in-flight animations and count the stage tree.
//! 2. **Refresh**: destroy released textures, then create or update the
//!    textures of changed pixmap actors.
//! 3. **Layer**: depth, opacity, occlusion, and damage.
//! 4. **Render**: build the render plan and hand it to the backend.
//! 5. **Present**: swap the whole buffer or copy the damaged rectangle.
//! 6. **Finish**: clear the dirty flags and suspend the redraw timer when no
//!    animation remains.
//!
//! Steps 3 to 5 only run when something is dirty.

use lamina_core::clock::Clock;
use lamina_core::error::SceneError;
use lamina_core::geometry::{Color, IntRect, Size};
use lamina_core::layer::{LayerOutcome, LayerVisitor};
use lamina_core::scene::{ActorId, ImageContent, PixmapHandle, Scene, SceneConfig, TextureWork};
use lamina_core::scheduler::{RedrawTimer, SchedulerConfig, SchedulerState};
use lamina_core::time::HostTime;
use lamina_core::trace::{
    DrawBeginEvent, FrameSummary, FrameSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    PresentEvent, PresentKind, SchedulerEvent, Tracer,
};
#[cfg(feature = "trace-rich")]
use lamina_core::trace::{DamageRect, TextureEvent, TextureEventKind};
use lamina_render::{
    BackendError, DamageRegion, DrawBackend, DrawVisitor, PresentRegion, ResourceCache,
};

use crate::notify::{CompositionListener, Notification};

/// Configuration for a [`Compositor`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositorConfig {
    /// Redraw timing.
    pub scheduler: SchedulerConfig,
    /// Initial size of the output surface.
    pub stage_size: Size,
    /// Color the output is cleared to.
    pub stage_color: Color,
    /// Whether damage-only frames may be drawn and presented partially when
    /// the backend supports it.
    pub allow_partial_updates: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        let scene = SceneConfig::default();
        Self {
            scheduler: scene.scheduler,
            stage_size: scene.stage_size,
            stage_color: scene.stage_color,
            allow_partial_updates: true,
        }
    }
}

/// Owns the scene, the draw backend, and the shared textures, and turns
/// scene state into frames.
pub struct Compositor<B: DrawBackend> {
    config: CompositorConfig,
    scene: Scene,
    backend: B,
    draw: DrawVisitor,
    resources: ResourceCache,
    listeners: Vec<Box<dyn CompositionListener>>,
    top_fullscreen: Option<ActorId>,
    frame_index: u64,
    last_state: SchedulerState,
    redraw_after_finish: bool,
    shut_down: bool,
    #[cfg(feature = "trace-rich")]
    texture_events: Vec<TextureEvent>,
}

impl<B: DrawBackend + core::fmt::Debug> core::fmt::Debug for Compositor<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Compositor")
            .field("config", &self.config)
            .field("scene", &self.scene)
            .field("backend", &self.backend)
            .field("resources", &self.resources)
            .field("listeners", &self.listeners.len())
            .field("top_fullscreen", &self.top_fullscreen)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl<B: DrawBackend> Compositor<B> {
    /// Creates a compositor drawing through `backend`.
    ///
    /// The scene starts dirty, so the timer is armed for the first frame.
    pub fn new(
        config: CompositorConfig,
        mut backend: B,
        clock: Box<dyn Clock>,
        timer: Box<dyn RedrawTimer>,
    ) -> Self {
        let scene = Scene::new(
            SceneConfig {
                stage_size: config.stage_size,
                stage_color: config.stage_color,
                scheduler: config.scheduler,
            },
            clock,
            timer,
        );
        backend.resize_viewport(scene.stage_size());
        let last_state = scene.scheduler().state();
        Self {
            config,
            scene,
            backend,
            draw: DrawVisitor::new(),
            resources: ResourceCache::new(),
            listeners: Vec::new(),
            top_fullscreen: None,
            frame_index: 0,
            last_state,
            redraw_after_finish: false,
            shut_down: false,
            #[cfg(feature = "trace-rich")]
            texture_events: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Returns the scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Returns the scene for mutation.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Returns the draw backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the draw backend for direct use.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Returns the shared texture cache.
    #[must_use]
    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    /// Returns the number of frames drawn so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Returns the top fullscreen window seen by the last draw.
    #[must_use]
    pub fn top_fullscreen_actor(&self) -> Option<ActorId> {
        self.top_fullscreen
    }

    /// Returns `true` while the redraw timer is armed.
    #[must_use]
    pub fn needs_draw(&self) -> bool {
        self.scene.scheduler().is_enabled()
    }

    /// Registers a listener for composition changes.
    pub fn add_listener(&mut self, listener: Box<dyn CompositionListener>) {
        self.listeners.push(listener);
    }

    /// Returns the shared image named `name`, uploading `pixels` (RGBA8) on
    /// first use.
    ///
    /// Images lost with the graphics context are uploaded again first.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the upload fails.
    pub fn load_image(
        &mut self,
        name: &str,
        size: Size,
        has_alpha: bool,
        pixels: &[u8],
    ) -> Result<ImageContent, BackendError> {
        self.restore_images();
        if self.resources.needs_restore() {
            return Err(BackendError::Lost);
        }
        self.resources
            .load_image(&mut self.backend, name, size, has_alpha, pixels)
    }

    /// Binds a client pixel buffer to a texture-pixmap actor.
    ///
    /// Returns `Ok(false)` without touching the actor when the backend cannot
    /// texture from pixmaps.
    ///
    /// # Errors
    ///
    /// Returns the scene's error for stale handles, other actor kinds, or a
    /// negative size.
    pub fn bind_pixmap(
        &mut self,
        actor: ActorId,
        pixmap: PixmapHandle,
        size: Size,
        has_alpha: bool,
    ) -> Result<bool, SceneError> {
        if !self.backend.capabilities().pixmap_textures {
            tracing::debug!(?actor, ?pixmap, "backend cannot texture from pixmaps");
            return Ok(false);
        }
        self.scene.bind_pixmap(actor, pixmap, size, has_alpha)?;
        Ok(true)
    }

    /// Applies an event from the windowing system.
    ///
    /// Events for destroyed actors, and events the actor cannot take, are
    /// logged and dropped.
    pub fn handle_notification(&mut self, notification: Notification) {
        let result = match notification {
            Notification::PixmapContentsChanged { actor } => {
                self.live(actor).and_then(|()| self.scene.mark_pixmap_stale(actor))
            }
            Notification::PixmapResized { actor, size } => self
                .live(actor)
                .and_then(|()| self.scene.resize_pixmap(actor, size)),
            Notification::Damage { actor, rect } => self
                .live(actor)
                .and_then(|()| self.scene.merge_damaged_region(actor, rect)),
            Notification::OutputResized(size) => {
                let stage = self.scene.stage();
                self.scene.set_size(stage, size)
            }
        };
        if let Err(err) = result {
            tracing::debug!(?notification, %err, "notification ignored");
        }
    }

    fn live(&self, actor: ActorId) -> Result<(), SceneError> {
        if self.scene.is_alive(actor) {
            Ok(())
        } else {
            Err(SceneError::StaleActor(actor))
        }
    }

    /// Draws one frame. Call this on every redraw-timer tick.
    pub fn draw(&mut self) -> FrameSummary {
        self.draw_traced(&mut Tracer::none())
    }

    /// Draws one frame, reporting its phases to `tracer`.
    pub fn draw_traced(&mut self, tracer: &mut Tracer<'_>) -> FrameSummary {
        let now = self.scene.now();
        self.note_scheduler_state(tracer, now);

        let frame_index = self.frame_index;
        self.frame_index += 1;
        let scheduler = self.scene.scheduler();
        let begin = DrawBeginEvent {
            frame_index,
            now,
            dirty: scheduler.is_dirty(),
            partially_dirty: scheduler.is_partially_dirty(),
            num_animations: scheduler.num_animations(),
        };
        tracer.draw_begin(&begin);
        let mut summary = FrameSummaryBuilder::new(&begin);

        // -- 1. Animate --
        self.phase_begin(tracer, &mut summary, frame_index, PhaseKind::Animate);
        self.scene.advance_animations();
        self.phase_end(tracer, &mut summary, frame_index, PhaseKind::Animate);

        // -- 2. Refresh --
        self.phase_begin(tracer, &mut summary, frame_index, PhaseKind::Refresh);
        if self.scene.stage_was_resized() {
            self.backend.resize_viewport(self.scene.stage_size());
        }
        self.restore_images();
        self.refresh_textures();
        #[cfg(feature = "trace-rich")]
        if !self.texture_events.is_empty() {
            tracer.texture_events(frame_index, &self.texture_events);
            self.texture_events.clear();
        }
        self.phase_end(tracer, &mut summary, frame_index, PhaseKind::Refresh);

        let scheduler = self.scene.scheduler();
        let dirty = scheduler.is_dirty();
        let partially_dirty = scheduler.is_partially_dirty();
        let mut present = PresentKind::Skipped;
        let mut culled = 0;
        if dirty || partially_dirty {
            let use_partial = self.config.allow_partial_updates
                && self.backend.capabilities().partial_present
                && !dirty
                && partially_dirty;

            // -- 3. Layer --
            self.phase_begin(tracer, &mut summary, frame_index, PhaseKind::Layer);
            let outcome =
                LayerVisitor::new(self.scene.actor_count(), use_partial).visit(&mut self.scene);
            culled = outcome.culled;
            self.phase_end(tracer, &mut summary, frame_index, PhaseKind::Layer);

            #[cfg(feature = "trace-rich")]
            if use_partial && !outcome.damage.is_empty() {
                tracer.damage_rects(frame_index, &[DamageRect::from(outcome.damage)]);
            }

            if use_partial && outcome.damage.is_empty() {
                tracing::trace!(frame_index, "no visible damage; frame skipped");
            } else {
                present = self.render_and_present(
                    tracer,
                    &mut summary,
                    frame_index,
                    &outcome,
                    use_partial,
                );
            }
            self.update_top_fullscreen(outcome.top_fullscreen_actor);
        }

        // -- 6. Finish --
        self.scene.clear_stage_flags();
        let end = self.scene.now();
        self.scene.scheduler_mut().finish_draw(end);
        if core::mem::take(&mut self.redraw_after_finish) {
            self.scene.set_dirty();
        }
        self.note_scheduler_state(tracer, end);

        summary.set_counts(
            u32::try_from(self.scene.actor_count()).unwrap_or(u32::MAX),
            u32::try_from(culled).unwrap_or(u32::MAX),
            self.scene.num_animations(),
        );
        summary.set_present(present);
        let summary = summary.finish();
        tracer.frame_summary(&summary);
        summary
    }

    /// Releases every texture the compositor owns.
    ///
    /// Called automatically on drop. The compositor must not draw again
    /// afterwards.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        for texture in self.scene.take_all_textures() {
            self.backend.destroy_texture(texture);
        }
        self.resources.release_all(&mut self.backend);
        tracing::debug!(frames = self.frame_index, "compositor shut down");
    }

    // ---------------------------------------------------------------------

    fn render_and_present(
        &mut self,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
        frame_index: u64,
        outcome: &LayerOutcome,
        use_partial: bool,
    ) -> PresentKind {
        let stage = self.scene.stage_size();
        let region = use_partial.then_some(outcome.damage);

        // -- 4. Render --
        self.phase_begin(tracer, summary, frame_index, PhaseKind::Render);
        let plan = self.draw.build(&self.scene, outcome, region);
        let rendered = self.backend.render(plan);
        self.phase_end(tracer, summary, frame_index, PhaseKind::Render);
        if let Err(err) = rendered {
            self.on_backend_error(err);
            return PresentKind::Skipped;
        }

        // -- 5. Present --
        self.phase_begin(tracer, summary, frame_index, PhaseKind::Present);
        let damage = match region {
            Some(rect) => DamageRegion::from_rect(rect),
            None => DamageRegion::Full,
        };
        let mut kind = PresentKind::Skipped;
        if let Some(present) = damage.to_present(stage) {
            match self.backend.present(present) {
                Ok(()) => {
                    let (k, rect) = match present {
                        PresentRegion::Full => (PresentKind::Full, IntRect::from_size(stage)),
                        PresentRegion::Partial(_) => (PresentKind::Partial, outcome.damage),
                    };
                    kind = k;
                    tracer.present(&PresentEvent {
                        frame_index,
                        timestamp: self.scene.now(),
                        kind,
                        region: rect,
                    });
                }
                Err(err) => self.on_backend_error(err),
            }
        }
        self.phase_end(tracer, summary, frame_index, PhaseKind::Present);
        kind
    }

    fn restore_images(&mut self) {
        if !self.resources.needs_restore() {
            return;
        }
        match self.resources.restore(&mut self.backend) {
            Ok(remapped) => {
                let actors = self.scene.remap_image_textures(&remapped);
                tracing::debug!(images = remapped.len(), actors, "image actors re-pointed");
            }
            Err(err) => self.on_backend_error(err),
        }
    }

    fn refresh_textures(&mut self) {
        for texture in self.scene.take_released_textures() {
            self.backend.destroy_texture(texture);
            self.record_texture(u32::MAX, texture.0, TextureChange::Released);
        }

        for work in self.scene.take_texture_work() {
            match work {
                TextureWork::Refresh { idx, handle, size } => {
                    let has_alpha = self.scene.pixmap_at(idx).has_alpha;
                    match self.backend.create_pixmap_texture(handle, size, has_alpha) {
                        Ok(texture) => {
                            self.scene.finish_texture_refresh(idx, Some(texture));
                            self.record_texture(idx, texture.0, TextureChange::Created);
                        }
                        Err(BackendError::Lost) => {
                            self.on_backend_error(BackendError::Lost);
                            return;
                        }
                        Err(err) => {
                            tracing::warn!(?handle, %err, "pixmap texture failed; drawing placeholder");
                            self.scene.finish_texture_refresh(idx, None);
                            self.record_texture(idx, handle.0, TextureChange::Failed);
                        }
                    }
                }
                TextureWork::Update {
                    idx,
                    handle,
                    texture,
                } => {
                    let damage = self.scene.pixmap_at(idx).damage;
                    match self.backend.update_pixmap_texture(texture, handle, damage) {
                        Ok(()) => self.record_texture(idx, texture.0, TextureChange::Updated),
                        Err(BackendError::Lost) => {
                            self.on_backend_error(BackendError::Lost);
                            return;
                        }
                        Err(err) => {
                            tracing::warn!(?handle, %err, "pixmap texture update failed; keeping old contents");
                        }
                    }
                    self.scene.finish_texture_update(idx);
                }
            }
        }
    }

    fn on_backend_error(&mut self, err: BackendError) {
        match err {
            BackendError::Lost => {
                tracing::warn!("graphics context lost; re-creating textures");
                // The textures are gone with the context; drop our handles.
                for texture in self.scene.take_all_textures() {
                    self.backend.destroy_texture(texture);
                }
                self.resources.mark_lost();
                self.redraw_after_finish = true;
            }
            err => tracing::warn!(%err, "draw backend error"),
        }
    }

    fn update_top_fullscreen(&mut self, top: Option<ActorId>) {
        if top == self.top_fullscreen {
            return;
        }
        tracing::debug!(from = ?self.top_fullscreen, to = ?top, "top fullscreen actor changed");
        self.top_fullscreen = top;
        for listener in &mut self.listeners {
            listener.top_fullscreen_actor_changed(top);
        }
    }

    fn note_scheduler_state(&mut self, tracer: &mut Tracer<'_>, now: HostTime) {
        let state = self.scene.scheduler().state();
        if state == self.last_state {
            return;
        }
        tracer.scheduler(&SchedulerEvent {
            timestamp: now,
            from: self.last_state,
            to: state,
            num_animations: self.scene.num_animations(),
        });
        self.last_state = state;
    }

    fn phase_begin(
        &self,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
        frame_index: u64,
        phase: PhaseKind,
    ) {
        let timestamp = self.scene.now();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase,
            timestamp,
        });
        summary.phase_begin(phase, timestamp);
    }

    fn phase_end(
        &self,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
        frame_index: u64,
        phase: PhaseKind,
    ) {
        let timestamp = self.scene.now();
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase,
            timestamp,
        });
        summary.phase_end(phase, timestamp);
    }

    #[cfg_attr(
        not(feature = "trace-rich"),
        expect(unused_variables, reason = "texture events are only kept with trace-rich")
    )]
    fn record_texture(&mut self, actor_index: u32, texture: u64, change: TextureChange) {
        #[cfg(feature = "trace-rich")]
        self.texture_events.push(TextureEvent {
            actor_index,
            texture,
            kind: match change {
                TextureChange::Created => TextureEventKind::Created,
                TextureChange::Updated => TextureEventKind::Updated,
                TextureChange::Failed => TextureEventKind::Failed,
                TextureChange::Released => TextureEventKind::Released,
            },
        });
    }
}

impl<B: DrawBackend> Drop for Compositor<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Clone, Copy)]
enum TextureChange {
    Created,
    Updated,
    Failed,
    Released,
}
