//! Shared texture cache.
//!
//! Textures are cached by name so that repeated loads of the same file hand
//! back the same GPU texture. Materials refer to cache entries by name, which
//! makes a highlight swap a rename instead of a reload and lets any number of
//! objects share one map.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::data_structures::texture::Texture;

/// Cache key for the shared all-white 1x1 map used by colour-only materials.
pub const WHITE_KEY: &str = "#white";

pub struct TextureCache {
    root: PathBuf,
    textures: HashMap<String, Arc<Texture>>,
}

impl TextureCache {
    /// Create a cache resolving relative texture names against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            textures: HashMap::new(),
        }
    }

    /// Look up a cached texture without loading.
    pub fn lookup(&self, name: &str) -> Option<&Arc<Texture>> {
        self.textures.get(name)
    }

    /// Insert an externally created texture under a name.
    ///
    /// Used for textures embedded in model files, which have no path of
    /// their own to load from.
    pub fn insert(&mut self, name: impl Into<String>, texture: Texture) -> Arc<Texture> {
        let texture = Arc::new(texture);
        self.textures.insert(name.into(), Arc::clone(&texture));
        texture
    }

    /// Fetch a texture by name, loading it from disk on the first request.
    ///
    /// Every later request for the same name returns the same texture. A
    /// load failure is logged and degrades to a solid placeholder so a
    /// missing file never takes the scene down; the placeholder is cached
    /// under the same name and not retried.
    pub fn get_or_load(
        &mut self,
        name: &str,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Arc<Texture> {
        if let Some(texture) = self.textures.get(name) {
            return Arc::clone(texture);
        }

        let path = self.root.join(name);
        let texture = match std::fs::read(&path) {
            Ok(bytes) => {
                let format = path.extension().and_then(|e| e.to_str());
                match Texture::from_bytes(device, queue, &bytes, name, format) {
                    Ok(texture) => texture,
                    Err(e) => {
                        log::warn!("Failed to decode texture {}: {}", path.display(), e);
                        Texture::create_solid([128, 128, 128, 255], device, queue)
                    }
                }
            }
            Err(e) => {
                log::warn!("Failed to read texture {}: {}", path.display(), e);
                Texture::create_solid([128, 128, 128, 255], device, queue)
            }
        };
        self.insert(name, texture)
    }

    /// The shared white 1x1 map. Colour-only materials sample it so the
    /// colour factor passes through unchanged.
    pub fn white(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Arc<Texture> {
        if let Some(texture) = self.textures.get(WHITE_KEY) {
            return Arc::clone(texture);
        }
        let texture = Texture::create_solid([255, 255, 255, 255], device, queue);
        self.insert(WHITE_KEY, texture)
    }
}
