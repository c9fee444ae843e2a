//! End-to-end picking without a GPU: camera, ray construction, scene state.

use cgmath::Point3;
use rackview::{
    camera::OrbitCamera,
    data_structures::{instance::Instance, model::Geometry, model::Material},
    picking::{PickTransition, Ray},
    scene::{HIGHLIGHT_MAP, PLAIN_MAP, Scene, SceneObject},
};

const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 600.0;

fn unit_box(name: &str, center: [f32; 3]) -> SceneObject {
    let [cx, cy, cz] = center;
    let positions = vec![
        [cx - 1.0, cy - 1.0, cz - 1.0],
        [cx + 1.0, cy - 1.0, cz - 1.0],
        [cx - 1.0, cy + 1.0, cz - 1.0],
        [cx + 1.0, cy + 1.0, cz - 1.0],
        [cx - 1.0, cy - 1.0, cz + 1.0],
        [cx + 1.0, cy - 1.0, cz + 1.0],
        [cx - 1.0, cy + 1.0, cz + 1.0],
        [cx + 1.0, cy + 1.0, cz + 1.0],
    ];
    let geometry = Geometry::new(positions, vec![], vec![]);
    SceneObject::new(
        name.to_owned(),
        name.contains("cabinet"),
        geometry,
        Instance::new(),
        Material::with_map(PLAIN_MAP),
    )
}

fn default_camera() -> OrbitCamera {
    OrbitCamera::looking_from(
        Point3::new(0.0, 10.0, 15.0),
        Point3::new(0.0, 0.0, 0.0),
        WIDTH / HEIGHT,
    )
}

fn pick_at(scene: &Scene, camera: &OrbitCamera, x: f32, y: f32) -> Option<usize> {
    Ray::from_screen(x, y, WIDTH, HEIGHT, camera.view_proj()).and_then(|ray| scene.pick(&ray))
}

#[test]
fn cursor_over_the_scene_center_picks_the_cabinet() {
    let mut scene = Scene::new();
    scene.add_objects(vec![unit_box("cabinet-01", [0.0, 0.0, 0.0])]);
    let camera = default_camera();

    assert_eq!(pick_at(&scene, &camera, WIDTH / 2.0, HEIGHT / 2.0), Some(0));
}

#[test]
fn cursor_in_the_window_corner_picks_nothing() {
    let mut scene = Scene::new();
    scene.add_objects(vec![unit_box("cabinet-01", [0.0, 0.0, 0.0])]);
    let camera = default_camera();

    assert_eq!(pick_at(&scene, &camera, 0.0, 0.0), None);
    assert_eq!(pick_at(&scene, &camera, WIDTH, HEIGHT), None);
}

#[test]
fn only_cabinet_objects_react_to_the_cursor() {
    let mut scene = Scene::new();
    scene.add_objects(vec![unit_box("rack-frame", [0.0, 0.0, 0.0])]);
    let camera = default_camera();

    assert_eq!(pick_at(&scene, &camera, WIDTH / 2.0, HEIGHT / 2.0), None);
}

#[test]
fn hover_sequence_swaps_maps_and_keeps_one_highlight() {
    let mut scene = Scene::new();
    scene.add_objects(vec![
        unit_box("cabinet-a", [0.0, 0.0, 0.0]),
        unit_box("cabinet-b", [4.0, 0.0, 0.0]),
    ]);

    assert_eq!(
        scene.apply_pick(Some(0)),
        PickTransition::Entered { prev: None, hit: 0 }
    );
    assert_eq!(scene.apply_pick(Some(0)), PickTransition::Moved { hit: 0 });
    assert_eq!(
        scene.apply_pick(Some(1)),
        PickTransition::Entered {
            prev: Some(0),
            hit: 1
        }
    );
    assert_eq!(scene.objects[0].material.map.as_deref(), Some(PLAIN_MAP));
    assert_eq!(scene.objects[1].material.map.as_deref(), Some(HIGHLIGHT_MAP));

    assert_eq!(scene.apply_pick(None), PickTransition::Left { prev: 1 });
    assert_eq!(scene.objects[1].material.map.as_deref(), Some(PLAIN_MAP));
    assert_eq!(scene.hovered, None);
}

#[test]
fn picking_an_empty_scene_is_harmless() {
    let mut scene = Scene::new();
    let camera = default_camera();
    assert_eq!(pick_at(&scene, &camera, WIDTH / 2.0, HEIGHT / 2.0), None);
    assert_eq!(scene.apply_pick(None), PickTransition::Idle);
}
