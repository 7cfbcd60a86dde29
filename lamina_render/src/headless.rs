// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A backend that records calls instead of drawing.
//!
//! Used by tests and by hosts that composite offscreen for inspection.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use lamina_core::geometry::{IntRect, Size};
use lamina_core::scene::{PixmapHandle, TextureId};

use crate::backend::{BackendCapabilities, BackendError, DrawBackend};
use crate::damage::PresentRegion;
use crate::plan::RenderPlan;

/// One recorded [`DrawBackend`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    /// [`DrawBackend::create_pixmap_texture`].
    CreatePixmapTexture {
        /// The pixmap sampled.
        pixmap: PixmapHandle,
        /// The requested texture size.
        size: Size,
        /// The new texture, or `None` if creation failed.
        texture: Option<TextureId>,
    },
    /// [`DrawBackend::update_pixmap_texture`].
    UpdatePixmapTexture(TextureId, IntRect),
    /// [`DrawBackend::create_image_texture`].
    CreateImageTexture(TextureId),
    /// [`DrawBackend::destroy_texture`].
    DestroyTexture(TextureId),
    /// [`DrawBackend::resize_viewport`].
    ResizeViewport(Size),
    /// [`DrawBackend::render`], with the number of items drawn.
    Render(usize),
    /// [`DrawBackend::present`].
    Present(PresentRegion),
}

/// A recording [`DrawBackend`].
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    capabilities: BackendCapabilities,
    failing: BTreeSet<PixmapHandle>,
    failing_images: bool,
    next_texture: u64,
    live: BTreeSet<TextureId>,
    calls: Vec<BackendCall>,
    last_plan: Option<RenderPlan>,
    context_lost: bool,
}

impl HeadlessBackend {
    /// Creates a backend with the default capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend reporting the given capabilities.
    #[must_use]
    pub fn with_capabilities(capabilities: BackendCapabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Makes texture creation fail for `pixmap` until
    /// [`heal_pixmap`](Self::heal_pixmap).
    pub fn fail_pixmap(&mut self, pixmap: PixmapHandle) {
        self.failing.insert(pixmap);
    }

    /// Lets texture creation for `pixmap` succeed again.
    pub fn heal_pixmap(&mut self, pixmap: PixmapHandle) {
        self.failing.remove(&pixmap);
    }

    /// Makes every image upload fail while `fail` is set.
    pub fn fail_image_uploads(&mut self, fail: bool) {
        self.failing_images = fail;
    }

    /// Simulates losing the graphics context: every texture is gone and the
    /// next [`render`](DrawBackend::render) reports [`BackendError::Lost`].
    pub fn lose_context(&mut self) {
        self.live.clear();
        self.context_lost = true;
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Returns and forgets the recorded calls.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        core::mem::take(&mut self.calls)
    }

    /// Returns the plan passed to the most recent [`render`](DrawBackend::render).
    #[must_use]
    pub fn last_plan(&self) -> Option<&RenderPlan> {
        self.last_plan.as_ref()
    }

    /// Returns the number of textures created and not yet destroyed.
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if `texture` was created and not yet destroyed.
    #[must_use]
    pub fn is_live(&self, texture: TextureId) -> bool {
        self.live.contains(&texture)
    }

    fn alloc_texture(&mut self) -> TextureId {
        self.next_texture += 1;
        let texture = TextureId(self.next_texture);
        self.live.insert(texture);
        texture
    }
}

impl DrawBackend for HeadlessBackend {
    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    fn create_pixmap_texture(
        &mut self,
        pixmap: PixmapHandle,
        size: Size,
        _has_alpha: bool,
    ) -> Result<TextureId, BackendError> {
        if !self.capabilities.pixmap_textures {
            return Err(BackendError::Unsupported("pixmap textures"));
        }
        if self.failing.contains(&pixmap) {
            self.calls.push(BackendCall::CreatePixmapTexture {
                pixmap,
                size,
                texture: None,
            });
            return Err(BackendError::TextureCreation(pixmap));
        }
        let texture = self.alloc_texture();
        self.calls.push(BackendCall::CreatePixmapTexture {
            pixmap,
            size,
            texture: Some(texture),
        });
        Ok(texture)
    }

    fn update_pixmap_texture(
        &mut self,
        texture: TextureId,
        pixmap: PixmapHandle,
        damage: IntRect,
    ) -> Result<(), BackendError> {
        if self.failing.contains(&pixmap) {
            return Err(BackendError::TextureCreation(pixmap));
        }
        self.calls
            .push(BackendCall::UpdatePixmapTexture(texture, damage));
        Ok(())
    }

    fn create_image_texture(
        &mut self,
        _size: Size,
        _has_alpha: bool,
        _pixels: &[u8],
    ) -> Result<TextureId, BackendError> {
        if self.failing_images {
            return Err(BackendError::ImageUpload);
        }
        let texture = self.alloc_texture();
        self.calls.push(BackendCall::CreateImageTexture(texture));
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.live.remove(&texture);
        self.calls.push(BackendCall::DestroyTexture(texture));
    }

    fn resize_viewport(&mut self, size: Size) {
        self.calls.push(BackendCall::ResizeViewport(size));
    }

    fn render(&mut self, plan: &RenderPlan) -> Result<(), BackendError> {
        if core::mem::take(&mut self.context_lost) {
            return Err(BackendError::Lost);
        }
        self.calls.push(BackendCall::Render(plan.len()));
        match &mut self.last_plan {
            Some(last) => last.clone_from(plan),
            None => self.last_plan = Some(plan.clone()),
        }
        Ok(())
    }

    fn present(&mut self, region: PresentRegion) -> Result<(), BackendError> {
        if matches!(region, PresentRegion::Partial(_)) && !self.capabilities.partial_present {
            return Err(BackendError::Unsupported("partial present"));
        }
        self.calls.push(BackendCall::Present(region));
        Ok(())
    }
}
