// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw-backend contract.
//!
//! The compositor does not talk to a GPU API directly. A *backend* owns the
//! graphics context and provides the pieces below:
//!
//! - **Textures**: creating a texture bound to a client pixmap, re-reading
//!   its damaged pixels, and uploading decorative images.
//! - **Rendering**: executing a [`RenderPlan`] into the back buffer.
//! - **Presentation**: swapping the full buffer, or copying a sub-rectangle
//!   when the platform supports it.
//!
//! Texture failures are recoverable: the actor draws as a placeholder and the
//! compositor keeps running. [`BackendError::Lost`] means every texture
//! is gone; the compositor re-creates them on the next draw.
//!
//! # Frame pseudocode
//!
//! ```rust,ignore
//! for work in scene.take_texture_work() {
//!     match work {
//!         TextureWork::Refresh { idx, handle, size } => {
//!             let tex = backend.create_pixmap_texture(handle, size, has_alpha).ok();
//!             scene.finish_texture_refresh(idx, tex);
//!         }
//!         TextureWork::Update { idx, handle, texture } => {
//!             backend.update_pixmap_texture(texture, handle, damage)?;
//!             scene.finish_texture_update(idx);
//!         }
//!     }
//! }
//! let outcome = LayerVisitor::new(count, partial).visit(&mut scene);
//! backend.render(draw.build(&scene, &outcome, region))?;
//! backend.present(present_region)?;
//! ```

use lamina_core::geometry::{IntRect, Size};
use lamina_core::scene::{PixmapHandle, TextureId};

use crate::damage::PresentRegion;
use crate::plan::RenderPlan;

/// What a backend can do beyond the basics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Client pixmaps can be bound as textures.
    pub pixmap_textures: bool,
    /// Sub-rectangles of the back buffer can be presented.
    pub partial_present: bool,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self {
            pixmap_textures: true,
            partial_present: false,
        }
    }
}

/// An error reported by a draw backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The operation is not available on this backend.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// A texture could not be created or updated from a pixmap.
    #[error("texture creation failed for {0:?}")]
    TextureCreation(PixmapHandle),
    /// An image could not be uploaded as a texture.
    #[error("image upload failed")]
    ImageUpload,
    /// The graphics context was lost; all textures are invalid.
    #[error("graphics context lost")]
    Lost,
}

/// The GPU side of the compositor.
///
/// Implementations must tolerate [`destroy_texture`](Self::destroy_texture)
/// on a texture they no longer know about.
pub trait DrawBackend {
    /// Returns the backend's capabilities.
    fn capabilities(&self) -> BackendCapabilities;

    /// Creates a texture that samples the pixmap's contents.
    fn create_pixmap_texture(
        &mut self,
        pixmap: PixmapHandle,
        size: Size,
        has_alpha: bool,
    ) -> Result<TextureId, BackendError>;

    /// Re-reads `damage` (in pixmap pixels, top-left origin) of the pixmap
    /// into its texture. An empty rectangle means the whole pixmap.
    fn update_pixmap_texture(
        &mut self,
        texture: TextureId,
        pixmap: PixmapHandle,
        damage: IntRect,
    ) -> Result<(), BackendError>;

    /// Uploads RGBA8 pixels as a texture.
    fn create_image_texture(
        &mut self,
        size: Size,
        has_alpha: bool,
        pixels: &[u8],
    ) -> Result<TextureId, BackendError>;

    /// Releases a texture.
    fn destroy_texture(&mut self, texture: TextureId);

    /// Resizes the output surface and viewport.
    fn resize_viewport(&mut self, size: Size);

    /// Executes a render plan into the back buffer.
    fn render(&mut self, plan: &RenderPlan) -> Result<(), BackendError>;

    /// Makes the back buffer visible.
    fn present(&mut self, region: PresentRegion) -> Result<(), BackendError>;
}
