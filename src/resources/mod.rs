//! Loading of model files and textures from disk.

use std::path::Path;

use crate::{
    data_structures::{model::Material, texture::Texture},
    resources::{cache::TextureCache, gltf::MapSource},
    scene::SceneObject,
};

pub mod cache;
pub mod gltf;

/// Load a glTF file into scene objects.
///
/// Geometry and transforms come from the file's default scene; colour maps
/// referenced by path go through the texture cache while embedded images are
/// uploaded directly and cached under a derived name. GPU mesh buffers are
/// not created here, the scene uploads them when a rendering context exists.
pub fn load_objects(
    path: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    cache: &mut TextureCache,
) -> anyhow::Result<Vec<SceneObject>> {
    let file = ::gltf::Gltf::open(path)?;
    let buffers = ::gltf::import_buffers(&file.document, path.parent(), file.blob)?;
    let parsed = gltf::collect_objects(&file.document, &buffers);
    log::info!("Loaded {} objects from {}", parsed.len(), path.display());

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");

    let objects = parsed
        .into_iter()
        .map(|object| {
            // A map and a flat colour never combine, mapped surfaces render
            // their texture untinted while unmapped ones keep the factor.
            let material = match object.map {
                Some(MapSource::Uri(uri)) => {
                    // Warm the cache so the first frame does not stall on IO.
                    cache.get_or_load(&uri, device, queue);
                    Material::with_map(uri)
                }
                Some(MapSource::Embedded { bytes, mime, index }) => {
                    let name = format!("{}#{}", stem, index);
                    if cache.lookup(&name).is_none() {
                        let format = mime.as_deref().and_then(|m| m.split('/').next_back());
                        match Texture::from_bytes(device, queue, &bytes, &name, format) {
                            Ok(texture) => {
                                cache.insert(&name, texture);
                            }
                            Err(e) => {
                                log::warn!("Failed to decode embedded texture {}: {}", name, e);
                                cache.insert(
                                    &name,
                                    Texture::create_solid([128, 128, 128, 255], device, queue),
                                );
                            }
                        }
                    }
                    Material::with_map(name)
                }
                None => Material::with_colour(object.colour),
            };

            SceneObject::new(
                object.name,
                object.selectable,
                object.geometry,
                object.instance,
                material,
            )
        })
        .collect();

    Ok(objects)
}
