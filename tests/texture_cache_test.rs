//! Texture cache and loader behavior against a real headless device.
//!
//! These tests need a GPU adapter and therefore only run with the
//! `integration-tests` feature enabled.

#![cfg(feature = "integration-tests")]

use std::sync::Arc;

use rackview::resources::{self, cache::TextureCache};

async fn create_device() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .expect("No GPU adapter available");
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .expect("Failed to create device")
}

fn write_test_png(path: &std::path::Path) {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    img.save(path).unwrap();
}

const TEST_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "scene": 0,
    "scenes": [{"nodes": [0, 1, 2]}],
    "nodes": [
        {"name": "cabinet-01", "mesh": 0, "translation": [2.0, 0.0, 0.0]},
        {"name": "rack-frame", "mesh": 0},
        {"name": "panel-door", "mesh": 1}
    ],
    "meshes": [
        {"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]},
        {"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 1}]}
    ],
    "materials": [
        {"pbrMetallicRoughness": {"baseColorFactor": [0.2, 0.3, 0.4, 1.0]}},
        {"pbrMetallicRoughness": {"baseColorFactor": [0.2, 0.3, 0.4, 1.0], "baseColorTexture": {"index": 0}}}
    ],
    "textures": [{"source": 0}],
    "images": [{"uri": "panel.png"}],
    "buffers": [{"uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAEAAAACAAAA", "byteLength": 48}],
    "bufferViews": [
        {"buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962},
        {"buffer": 0, "byteOffset": 36, "byteLength": 12, "target": 34963}
    ],
    "accessors": [
        {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
        {"bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR"}
    ]
}"#;

#[test]
fn repeated_loads_return_the_same_texture() {
    let (device, queue) = pollster::block_on(create_device());
    let dir = tempfile::tempdir().unwrap();
    write_test_png(&dir.path().join("cabinet.png"));

    let mut cache = TextureCache::new(dir.path());
    let first = cache.get_or_load("cabinet.png", &device, &queue);
    let second = cache.get_or_load("cabinet.png", &device, &queue);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn missing_files_degrade_to_a_cached_placeholder() {
    let (device, queue) = pollster::block_on(create_device());
    let dir = tempfile::tempdir().unwrap();

    let mut cache = TextureCache::new(dir.path());
    let first = cache.get_or_load("does-not-exist.png", &device, &queue);
    let second = cache.get_or_load("does-not-exist.png", &device, &queue);
    // The placeholder is cached under the requested name, not retried.
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn inserted_textures_are_found_by_lookup() {
    let (device, queue) = pollster::block_on(create_device());
    let mut cache = TextureCache::new(".");
    assert!(cache.lookup("#white").is_none());
    let white = cache.white(&device, &queue);
    assert!(Arc::ptr_eq(cache.lookup("#white").unwrap(), &white));
}

#[test]
fn scene_files_load_into_objects_with_unlit_materials() {
    let (device, queue) = pollster::block_on(create_device());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("room.gltf");
    std::fs::write(&path, TEST_GLTF).unwrap();
    write_test_png(&dir.path().join("panel.png"));

    let mut cache = TextureCache::new(dir.path());
    let objects = resources::load_objects(&path, &device, &queue, &mut cache).unwrap();

    assert_eq!(objects.len(), 3);
    assert!(objects[0].selectable);
    assert!(!objects[1].selectable);
    // Colour-only materials keep the factor and carry no map.
    for object in &objects[..2] {
        assert_eq!(object.material.colour, [0.2, 0.3, 0.4, 1.0]);
        assert_eq!(object.material.map, None);
    }
    // A mapped material renders its texture untinted, dropping the factor.
    assert_eq!(objects[2].material.map.as_deref(), Some("panel.png"));
    assert_eq!(objects[2].material.colour, [1.0, 1.0, 1.0, 1.0]);
    // The loader pre-warms the cache for referenced maps.
    assert!(cache.lookup("panel.png").is_some());
}
