// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared decorative textures.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use lamina_core::geometry::Size;
use lamina_core::scene::{ImageContent, TextureId};

use crate::backend::{BackendError, DrawBackend};

#[derive(Debug)]
struct CachedImage {
    content: ImageContent,
    size: Size,
    pixels: Vec<u8>,
}

/// Named textures shared by any number of image actors.
///
/// The cache owns the textures; image actors only borrow the handle. Call
/// [`release_all`](Self::release_all) before the backend goes away.
///
/// Pixels are kept alongside each texture so the cache can upload them again
/// after the backend loses its context.
#[derive(Debug, Default)]
pub struct ResourceCache {
    images: BTreeMap<String, CachedImage>,
    lost: bool,
}

impl ResourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the image stored under `name`, uploading `pixels` (RGBA8)
    /// through `backend` on first use.
    ///
    /// Call [`restore`](Self::restore) first when
    /// [`needs_restore`](Self::needs_restore) reports a lost context;
    /// otherwise the returned texture may no longer exist.
    pub fn load_image(
        &mut self,
        backend: &mut dyn DrawBackend,
        name: &str,
        size: Size,
        has_alpha: bool,
        pixels: &[u8],
    ) -> Result<ImageContent, BackendError> {
        if let Some(cached) = self.images.get(name) {
            return Ok(cached.content);
        }
        let texture = backend.create_image_texture(size, has_alpha, pixels)?;
        let content = ImageContent { texture, has_alpha };
        self.images.insert(
            String::from(name),
            CachedImage {
                content,
                size,
                pixels: pixels.to_vec(),
            },
        );
        tracing::debug!(name, ?texture, "image texture cached");
        Ok(content)
    }

    /// Returns the image stored under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ImageContent> {
        self.images.get(name).map(|cached| cached.content)
    }

    /// Returns the number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Records that the backend lost its context and every cached texture
    /// with it. Nothing is destroyed; the textures no longer exist.
    pub fn mark_lost(&mut self) {
        if !self.images.is_empty() {
            self.lost = true;
        }
    }

    /// Returns `true` while cached textures are gone with a lost context.
    #[must_use]
    pub fn needs_restore(&self) -> bool {
        self.lost
    }

    /// Uploads every cached image again after a context loss.
    ///
    /// Returns the old texture of each image with its replacement, or `None`
    /// for an image whose upload failed; that image is dropped from the cache
    /// so a later [`load_image`](Self::load_image) retries it. Image actors
    /// still point at the old textures and must be re-pointed by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Lost`] if the context is lost again. The cache
    /// is left untouched and still needs restoring.
    pub fn restore(
        &mut self,
        backend: &mut dyn DrawBackend,
    ) -> Result<Vec<(TextureId, Option<ImageContent>)>, BackendError> {
        if !self.lost {
            return Ok(Vec::new());
        }
        let mut uploads = Vec::with_capacity(self.images.len());
        for (name, cached) in &self.images {
            let has_alpha = cached.content.has_alpha;
            match backend.create_image_texture(cached.size, has_alpha, &cached.pixels) {
                Ok(texture) => uploads.push((name.clone(), Some(texture))),
                Err(BackendError::Lost) => {
                    for texture in uploads.into_iter().filter_map(|(_, t)| t) {
                        backend.destroy_texture(texture);
                    }
                    return Err(BackendError::Lost);
                }
                Err(err) => {
                    tracing::warn!(name = name.as_str(), %err, "image texture lost for good");
                    uploads.push((name.clone(), None));
                }
            }
        }

        let mut remapped = Vec::with_capacity(uploads.len());
        for (name, texture) in uploads {
            let entry = match texture {
                Some(texture) => self.images.get_mut(&name).map(|cached| {
                    let old = cached.content.texture;
                    cached.content.texture = texture;
                    (old, Some(cached.content))
                }),
                None => self
                    .images
                    .remove(&name)
                    .map(|cached| (cached.content.texture, None)),
            };
            remapped.extend(entry);
        }
        self.lost = false;
        tracing::debug!(images = remapped.len(), "image textures restored");
        Ok(remapped)
    }

    /// Destroys every cached texture.
    pub fn release_all(&mut self, backend: &mut dyn DrawBackend) {
        let lost = core::mem::take(&mut self.lost);
        for (_, cached) in core::mem::take(&mut self.images) {
            if !lost {
                backend.destroy_texture(cached.content.texture);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{BackendCall, HeadlessBackend};

    #[test]
    fn uploads_once_per_name() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ResourceCache::new();
        let pixels = [0_u8; 16];
        let a = cache
            .load_image(&mut backend, "shadow", Size::new(2, 2), true, &pixels)
            .unwrap();
        let b = cache
            .load_image(&mut backend, "shadow", Size::new(2, 2), true, &pixels)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        assert_eq!(backend.live_textures(), 1);
    }

    #[test]
    fn release_all_destroys_textures() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ResourceCache::new();
        let image = cache
            .load_image(&mut backend, "bg", Size::new(1, 1), false, &[0; 4])
            .unwrap();
        cache.release_all(&mut backend);
        assert!(cache.is_empty());
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(
            backend.calls().last(),
            Some(&BackendCall::DestroyTexture(image.texture))
        );
    }

    #[test]
    fn restore_reuploads_after_context_loss() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ResourceCache::new();
        let bg = cache
            .load_image(&mut backend, "bg", Size::new(1, 1), false, &[0; 4])
            .unwrap();
        let shadow = cache
            .load_image(&mut backend, "shadow", Size::new(1, 1), true, &[0; 4])
            .unwrap();
        assert!(cache.restore(&mut backend).unwrap().is_empty(), "nothing lost yet");

        backend.lose_context();
        cache.mark_lost();
        assert!(cache.needs_restore());
        let remapped = cache.restore(&mut backend).unwrap();
        assert!(!cache.needs_restore());
        assert_eq!(remapped.len(), 2);

        let new_bg = cache.get("bg").unwrap();
        assert_ne!(new_bg.texture, bg.texture);
        assert!(backend.is_live(new_bg.texture));
        assert!(remapped.contains(&(bg.texture, Some(new_bg))));
        let new_shadow = cache.get("shadow").unwrap();
        assert!(new_shadow.has_alpha);
        assert!(remapped.contains(&(shadow.texture, Some(new_shadow))));
    }

    #[test]
    fn failed_restore_drops_the_image() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ResourceCache::new();
        let bg = cache
            .load_image(&mut backend, "bg", Size::new(1, 1), false, &[0; 4])
            .unwrap();
        backend.lose_context();
        cache.mark_lost();
        backend.fail_image_uploads(true);
        assert_eq!(cache.restore(&mut backend).unwrap(), [(bg.texture, None)]);
        assert!(cache.get("bg").is_none());

        backend.fail_image_uploads(false);
        let reloaded = cache
            .load_image(&mut backend, "bg", Size::new(1, 1), false, &[0; 4])
            .unwrap();
        assert!(backend.is_live(reloaded.texture));
    }

    #[test]
    fn lost_textures_are_not_destroyed_on_release() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ResourceCache::new();
        cache
            .load_image(&mut backend, "bg", Size::new(1, 1), false, &[0; 4])
            .unwrap();
        backend.lose_context();
        cache.mark_lost();
        backend.take_calls();
        cache.release_all(&mut backend);
        assert!(backend.calls().is_empty());
        assert!(!cache.needs_restore());
    }
}
