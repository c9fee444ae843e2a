//! Pure glTF parsing into CPU-side object descriptions.
//!
//! This layer has no GPU dependency: it walks the default scene of a glTF
//! document and produces one [`ParsedObject`] per top-level mesh node, with
//! geometry, node transform, colour factor, and the source of the colour map
//! if the material has one. Turning the result into renderable scene objects
//! (texture uploads, buffer uploads) happens in [`super`].

use cgmath::Quaternion;

use crate::data_structures::{instance::Instance, model::Geometry};

/// Where a material's colour map comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum MapSource {
    /// A file referenced by relative path, loaded through the texture cache.
    Uri(String),
    /// Image bytes embedded in the asset's buffers.
    Embedded {
        bytes: Vec<u8>,
        mime: Option<String>,
        index: usize,
    },
}

/// One top-level mesh node of the default scene.
#[derive(Debug)]
pub struct ParsedObject {
    pub name: String,
    /// True when the node name marks it as a selectable cabinet.
    pub selectable: bool,
    pub instance: Instance,
    pub geometry: Geometry,
    /// Flat colour; white whenever the material carries a map.
    pub colour: [f32; 4],
    pub map: Option<MapSource>,
}

/// Nodes whose name contains this substring react to the cursor.
const SELECTABLE_MARKER: &str = "cabinet";

/// Collect the top-level mesh nodes of the document's default scene.
///
/// Only direct children of the scene are considered; nested nodes belong to
/// their parent object and are not walked. Nodes without a mesh (lights,
/// empties) are skipped. Falls back to the first scene when the asset names
/// no default.
pub fn collect_objects(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Vec<ParsedObject> {
    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        log::warn!("Model file contains no scenes");
        return Vec::new();
    };

    let mut objects = Vec::new();
    for node in scene.nodes() {
        let name = node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("node-{}", node.index()));
        let Some(mesh) = node.mesh() else {
            log::debug!("Skipping non-mesh node {}", name);
            continue;
        };
        let Some(primitive) = mesh.primitives().next() else {
            log::debug!("Skipping empty mesh node {}", name);
            continue;
        };
        if mesh.primitives().len() > 1 {
            log::debug!(
                "Node {} has {} primitives, rendering only the first",
                name,
                mesh.primitives().len()
            );
        }

        let reader = primitive.reader(|buffer| {
            buffers.get(buffer.index()).map(|data| data.0.as_slice())
        });
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .map(|iter| iter.collect())
            .unwrap_or_default();
        if positions.is_empty() {
            log::warn!("Node {} has no vertex positions, skipping", name);
            continue;
        }
        let tex_coords: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_default();
        let indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        let (translation, rotation, scale) = node.transform().decomposed();
        let instance = Instance {
            position: translation.into(),
            // decomposed() hands the quaternion back as [x, y, z, w]
            rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: scale.into(),
        };

        let material = primitive.material();
        let pbr = material.pbr_metallic_roughness();
        let map = pbr.base_color_texture().map(|info| {
            let source = info.texture().source();
            match source.source() {
                gltf::image::Source::Uri { uri, .. } => MapSource::Uri(uri.to_owned()),
                gltf::image::Source::View { view, mime_type } => {
                    let parent = &buffers[view.buffer().index()].0;
                    let start = view.offset();
                    let end = start + view.length();
                    MapSource::Embedded {
                        bytes: parent[start..end].to_vec(),
                        mime: Some(mime_type.to_owned()),
                        index: source.index(),
                    }
                }
            }
        });
        // Map and flat colour are mutually exclusive; a mapped surface
        // renders its texture untinted.
        let colour = if map.is_some() {
            [1.0, 1.0, 1.0, 1.0]
        } else {
            pbr.base_color_factor()
        };

        objects.push(ParsedObject {
            selectable: name.contains(SELECTABLE_MARKER),
            name,
            instance,
            geometry: Geometry::new(positions, tex_coords, indices),
            colour,
            map,
        });
    }
    objects
}
