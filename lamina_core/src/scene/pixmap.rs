// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-buffer binding and damage tracking for texture-pixmap actors.
//!
//! The scene records which buffer an actor shows and what happened to it;
//! GPU textures are created and destroyed by the draw pass, which reads the
//! pending work through [`Scene::take_texture_work`] and reports back with
//! [`Scene::finish_texture_refresh`].

use alloc::vec::Vec;

use crate::dirty;
use crate::error::SceneError;
use crate::geometry::{IntRect, Size};

use super::id::{ActorId, PixmapHandle, TextureId};
use super::kind::{ActorKind, PixmapState};
use super::store::{Scene, check_size};

/// What the draw pass must do for one texture-pixmap actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureWork {
    /// Release any old texture and create a new one for the buffer.
    Refresh {
        /// Slot index of the actor.
        idx: u32,
        /// The bound buffer.
        handle: PixmapHandle,
        /// Size of the buffer.
        size: Size,
    },
    /// Re-upload the buffer's pixels into the existing texture.
    Update {
        /// Slot index of the actor.
        idx: u32,
        /// The bound buffer.
        handle: PixmapHandle,
        /// The texture to update.
        texture: TextureId,
    },
}

impl Scene {
    fn check_pixmap(&self, id: ActorId) -> Result<usize, SceneError> {
        let i = self.check(id)? as usize;
        if self.kind[i] == ActorKind::TexturePixmap {
            Ok(i)
        } else {
            Err(SceneError::InvalidArgument("actor is not a texture-pixmap actor"))
        }
    }

    /// Binds a pixel buffer to a texture-pixmap actor.
    ///
    /// The actor takes the buffer's size, and its texture is recreated at the
    /// next draw. A previously bound texture is queued for release.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for other actor kinds or a
    /// negative size.
    pub fn bind_pixmap(
        &mut self,
        id: ActorId,
        handle: PixmapHandle,
        size: Size,
        has_alpha: bool,
    ) -> Result<(), SceneError> {
        let i = self.check_pixmap(id)?;
        check_size(size)?;
        if let Some(texture) = self.pixmap[i].texture.take() {
            self.released_textures.push(texture);
        }
        self.pixmap[i] = PixmapState {
            handle: Some(handle),
            has_alpha,
            texture: None,
            invalid: true,
            stale: false,
            failed: false,
            damage: IntRect::EMPTY,
        };
        self.width[i] = size.width;
        self.height[i] = size.height;
        self.dirty.mark(id.idx, dirty::CONTENT);
        self.set_dirty();
        Ok(())
    }

    /// Unbinds the actor's pixel buffer.
    ///
    /// The texture is released at the next draw (or at teardown). The actor
    /// shrinks to 0×0. Unbinding an unbound actor does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for other actor kinds.
    pub fn unbind_pixmap(&mut self, id: ActorId) -> Result<(), SceneError> {
        let i = self.check_pixmap(id)?;
        let state = &mut self.pixmap[i];
        if !state.is_bound() && state.texture.is_none() {
            return Ok(());
        }
        if let Some(texture) = state.texture.take() {
            self.released_textures.push(texture);
        }
        *state = PixmapState::default();
        self.width[i] = 0;
        self.height[i] = 0;
        self.set_dirty();
        Ok(())
    }

    /// Records that the bound buffer was resized.
    ///
    /// Invalidates the texture and drops accumulated damage. Ignored when no
    /// buffer is bound.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for other actor kinds or a
    /// negative size.
    pub fn resize_pixmap(&mut self, id: ActorId, size: Size) -> Result<(), SceneError> {
        let i = self.check_pixmap(id)?;
        check_size(size)?;
        if !self.pixmap[i].is_bound() {
            tracing::debug!(?id, "resize for an unbound pixmap ignored");
            return Ok(());
        }
        self.pixmap[i].invalid = true;
        self.pixmap[i].damage = IntRect::EMPTY;
        self.width[i] = size.width;
        self.height[i] = size.height;
        self.dirty.mark(id.idx, dirty::CONTENT);
        self.set_dirty();
        Ok(())
    }

    /// Merges a damaged rectangle (in actor-local pixels) into the actor's
    /// accumulated damage.
    ///
    /// The result is the bounding box of both, clipped to the actor's
    /// bounds. Marks the contents stale and the scene partially dirty.
    /// Ignored when no buffer is bound.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for other actor kinds.
    pub fn merge_damaged_region(&mut self, id: ActorId, rect: IntRect) -> Result<(), SceneError> {
        let i = self.check_pixmap(id)?;
        if !self.pixmap[i].is_bound() {
            tracing::debug!(?id, "damage for an unbound pixmap ignored");
            return Ok(());
        }
        let bounds = IntRect::new(0, 0, self.width[i], self.height[i]);
        let clipped = rect.intersect(bounds);
        if clipped.is_empty() {
            tracing::trace!(?id, ?rect, "damage outside the buffer ignored");
            return Ok(());
        }
        let state = &mut self.pixmap[i];
        state.damage = state.damage.union(clipped);
        state.stale = true;
        self.dirty.mark(id.idx, dirty::CONTENT);
        self.set_partially_dirty();
        Ok(())
    }

    /// Records that the buffer's pixels changed without damage information.
    ///
    /// Equivalent to damaging the whole actor.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidArgument`] for other actor kinds.
    pub fn mark_pixmap_stale(&mut self, id: ActorId) -> Result<(), SceneError> {
        let i = self.check_pixmap(id)?;
        let bounds = IntRect::new(0, 0, self.width[i], self.height[i]);
        self.merge_damaged_region(id, bounds)
    }

    /// Drains the texture work queued since the last call.
    ///
    /// Actors that were destroyed, unbound, or already handled are skipped.
    pub fn take_texture_work(&mut self) -> Vec<TextureWork> {
        let marked: Vec<u32> = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();
        let mut work = Vec::with_capacity(marked.len());
        for idx in marked {
            let i = idx as usize;
            if idx >= self.len || self.kind[i] != ActorKind::TexturePixmap {
                continue;
            }
            let state = &self.pixmap[i];
            let Some(handle) = state.handle else {
                continue;
            };
            if state.invalid || state.texture.is_none() {
                work.push(TextureWork::Refresh {
                    idx,
                    handle,
                    size: Size::new(self.width[i], self.height[i]),
                });
            } else if state.stale {
                if let Some(texture) = state.texture {
                    work.push(TextureWork::Update {
                        idx,
                        handle,
                        texture,
                    });
                }
            }
        }
        work
    }

    /// Stores the outcome of a texture refresh.
    ///
    /// `None` marks the actor as failed; it draws as a placeholder until the
    /// next successful refresh.
    pub fn finish_texture_refresh(&mut self, idx: u32, texture: Option<TextureId>) {
        let i = idx as usize;
        let state = &mut self.pixmap[i];
        if let Some(old) = state.texture.take() {
            self.released_textures.push(old);
        }
        state.texture = texture;
        state.invalid = false;
        state.stale = false;
        state.failed = texture.is_none();
    }

    /// Clears the stale flag after the texture's pixels were refreshed.
    pub fn finish_texture_update(&mut self, idx: u32) {
        self.pixmap[idx as usize].stale = false;
    }

    /// Takes the textures waiting to be destroyed.
    pub fn take_released_textures(&mut self) -> Vec<TextureId> {
        core::mem::take(&mut self.released_textures)
    }

    /// Detaches every pixmap texture from its actor and returns them along
    /// with the pending releases, marking every bound actor invalid.
    ///
    /// Used at teardown and after the backend loses its context.
    pub fn take_all_textures(&mut self) -> Vec<TextureId> {
        let mut out = self.take_released_textures();
        for idx in 0..self.len {
            let i = idx as usize;
            if let Some(texture) = self.pixmap[i].texture.take() {
                out.push(texture);
            }
            if self.pixmap[i].is_bound() {
                self.pixmap[i].invalid = true;
                self.dirty.mark(idx, dirty::CONTENT);
            }
        }
        out
    }

    /// Returns the actor's accumulated damage in local pixels.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn pixmap_damage(&self, id: ActorId) -> IntRect {
        self.pixmap(id).damage
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;

    use super::*;
    use crate::clock::ManualClock;
    use crate::scene::SceneConfig;
    use crate::scheduler::NullTimer;

    fn scene() -> Scene {
        Scene::new(
            SceneConfig::default(),
            Box::new(ManualClock::default()),
            Box::new(NullTimer),
        )
    }

    fn settle(s: &mut Scene) {
        let now = s.now();
        s.scheduler_mut().finish_draw(now);
    }

    #[test]
    fn bind_sizes_actor_and_invalidates() {
        let mut s = scene();
        let a = s.create_texture_pixmap();
        settle(&mut s);
        s.bind_pixmap(a, PixmapHandle(1), Size::new(640, 480), false)
            .unwrap();
        assert_eq!(s.size(a), Size::new(640, 480));
        assert!(s.is_pixmap_invalid(a));
        assert!(s.is_dirty());
        assert_eq!(
            s.take_texture_work(),
            vec![TextureWork::Refresh {
                idx: a.index(),
                handle: PixmapHandle(1),
                size: Size::new(640, 480),
            }]
        );
        // Drained.
        assert!(s.take_texture_work().is_empty());
    }

    #[test]
    fn bind_rejects_other_kinds() {
        let mut s = scene();
        let group = s.create_container();
        assert!(matches!(
            s.bind_pixmap(group, PixmapHandle(1), Size::new(1, 1), false),
            Err(SceneError::InvalidArgument(_))
        ));
    }

    #[test]
    fn bind_resize_rebind_round_trip() {
        let mut s = scene();
        let a = s.create_texture_pixmap();
        s.bind_pixmap(a, PixmapHandle(1), Size::new(100, 100), true)
            .unwrap();
        let _ = s.take_texture_work();
        s.finish_texture_refresh(a.index(), Some(TextureId(10)));
        assert!(!s.is_pixmap_invalid(a));

        s.resize_pixmap(a, Size::new(200, 50)).unwrap();
        assert!(s.is_pixmap_invalid(a));
        assert_eq!(s.size(a), Size::new(200, 50));
        let work = s.take_texture_work();
        assert_eq!(work.len(), 1);
        s.finish_texture_refresh(a.index(), Some(TextureId(11)));
        assert_eq!(s.take_released_textures(), vec![TextureId(10)]);

        s.bind_pixmap(a, PixmapHandle(2), Size::new(30, 40), false)
            .unwrap();
        assert_eq!(s.take_released_textures(), vec![TextureId(11)]);
        assert_eq!(s.pixmap(a).handle, Some(PixmapHandle(2)));
        assert!(s.pixmap(a).is_opaque());
    }

    #[test]
    fn damage_is_clipped_union() {
        let mut s = scene();
        let a = s.create_texture_pixmap();
        s.bind_pixmap(a, PixmapHandle(1), Size::new(100, 100), false)
            .unwrap();
        let _ = s.take_texture_work();
        s.finish_texture_refresh(a.index(), Some(TextureId(1)));
        settle(&mut s);

        s.merge_damaged_region(a, IntRect::new(10, 10, 10, 10))
            .unwrap();
        s.merge_damaged_region(a, IntRect::new(90, 50, 40, 5))
            .unwrap();
        assert_eq!(s.pixmap_damage(a), IntRect::new(10, 10, 90, 45));
        assert!(s.pixmap(a).stale);
        assert!(s.scheduler().is_partially_dirty());
        assert!(!s.is_dirty());

        assert_eq!(
            s.take_texture_work(),
            vec![TextureWork::Update {
                idx: a.index(),
                handle: PixmapHandle(1),
                texture: TextureId(1),
            }]
        );
        s.finish_texture_update(a.index());
        assert!(!s.pixmap(a).stale);
    }

    #[test]
    fn damage_near_i32_max_is_clipped_without_overflow() {
        let mut s = scene();
        let a = s.create_texture_pixmap();
        s.bind_pixmap(a, PixmapHandle(1), Size::new(100, 100), false)
            .unwrap();
        let _ = s.take_texture_work();
        s.finish_texture_refresh(a.index(), Some(TextureId(1)));
        settle(&mut s);

        s.merge_damaged_region(a, IntRect::new(i32::MAX - 5, 0, 10, 10))
            .unwrap();
        assert!(s.pixmap_damage(a).is_empty());
        assert!(!s.pixmap(a).stale);
        assert!(!s.scheduler().is_partially_dirty());

        s.merge_damaged_region(a, IntRect::new(95, 90, i32::MAX, i32::MAX))
            .unwrap();
        assert_eq!(s.pixmap_damage(a), IntRect::new(95, 90, 5, 10));
        s.merge_damaged_region(a, IntRect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX))
            .unwrap();
        assert_eq!(s.pixmap_damage(a), IntRect::new(95, 90, 5, 10));
        assert!(s.scheduler().is_partially_dirty());
    }

    #[test]
    fn damage_on_unbound_actor_is_ignored() {
        let mut s = scene();
        let a = s.create_texture_pixmap();
        settle(&mut s);
        s.merge_damaged_region(a, IntRect::new(0, 0, 5, 5)).unwrap();
        assert!(!s.scheduler().is_partially_dirty());
        assert!(s.take_texture_work().is_empty());
    }

    #[test]
    fn unbind_releases_texture_and_is_idempotent() {
        let mut s = scene();
        let a = s.create_texture_pixmap();
        s.bind_pixmap(a, PixmapHandle(1), Size::new(8, 8), false)
            .unwrap();
        s.finish_texture_refresh(a.index(), Some(TextureId(3)));
        s.unbind_pixmap(a).unwrap();
        assert!(!s.pixmap(a).is_bound());
        assert_eq!(s.size(a), Size::new(0, 0));
        assert_eq!(s.take_released_textures(), vec![TextureId(3)]);

        settle(&mut s);
        s.unbind_pixmap(a).unwrap();
        assert!(!s.is_dirty());
    }

    #[test]
    fn failed_refresh_is_recorded() {
        let mut s = scene();
        let a = s.create_texture_pixmap();
        s.bind_pixmap(a, PixmapHandle(1), Size::new(8, 8), false)
            .unwrap();
        s.finish_texture_refresh(a.index(), None);
        assert!(s.pixmap(a).failed);
        assert!(!s.is_pixmap_invalid(a));
    }

    #[test]
    fn destroy_queues_texture_release() {
        let mut s = scene();
        let a = s.create_texture_pixmap();
        s.bind_pixmap(a, PixmapHandle(1), Size::new(8, 8), false)
            .unwrap();
        s.finish_texture_refresh(a.index(), Some(TextureId(9)));
        s.destroy_actor(a).unwrap();
        assert_eq!(s.take_released_textures(), vec![TextureId(9)]);
        assert!(s.take_texture_work().is_empty());
    }
}
