//! Scene contents and hover state.
//!
//! A [`Scene`] is a flat list of objects plus the index of the currently
//! hovered selectable, if any. At most one object is highlighted at a time;
//! [`Scene::apply_pick`] keeps that invariant by restoring the previous
//! object's plain map before the new one is highlighted.

use crate::{
    data_structures::{
        instance::Instance,
        model::{Geometry, Material, MeshBuffers},
    },
    picking::{Aabb, PickTransition, Ray, raycast_nearest, transition},
};

/// Map applied to a selectable object while the cursor is over it.
pub const HIGHLIGHT_MAP: &str = "cabinet-hover.jpg";
/// Map restored when the cursor leaves a selectable object.
pub const PLAIN_MAP: &str = "cabinet.jpg";

/// One renderable object of the loaded scene.
pub struct SceneObject {
    pub name: String,
    pub selectable: bool,
    pub geometry: Geometry,
    pub instance: Instance,
    pub material: Material,
    /// Created on first render, once a device exists.
    pub buffers: Option<MeshBuffers>,
    /// Object bounds in world space, cached for picking.
    pub world_aabb: Aabb,
}

impl SceneObject {
    pub fn new(
        name: String,
        selectable: bool,
        geometry: Geometry,
        instance: Instance,
        material: Material,
    ) -> Self {
        let world_aabb = geometry.aabb.transformed(instance.to_matrix());
        Self {
            name,
            selectable,
            geometry,
            instance,
            material,
            buffers: None,
            world_aabb,
        }
    }

    /// Upload the mesh to the GPU if it has not been already.
    pub fn ensure_uploaded(&mut self, device: &wgpu::Device) {
        if self.buffers.is_none() {
            self.buffers = Some(MeshBuffers::upload(device, &self.geometry, &self.instance));
        }
    }
}

#[derive(Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub hovered: Option<usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_objects(&mut self, objects: Vec<SceneObject>) {
        self.objects.extend(objects);
    }

    /// Cast a ray against the selectable objects only; nearest hit wins.
    pub fn pick(&self, ray: &Ray) -> Option<usize> {
        let boxes: Vec<(usize, Aabb)> = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.selectable)
            .map(|(index, object)| (index, object.world_aabb))
            .collect();
        raycast_nearest(ray, &boxes)
    }

    /// Update hover state and materials for a pick result.
    ///
    /// On a change of hovered object the previous one gets its plain map
    /// back before the new one receives the highlight map. The returned
    /// transition tells the caller which observer callbacks to fire.
    pub fn apply_pick(&mut self, hit: Option<usize>) -> PickTransition {
        let result = transition(self.hovered, hit);
        match result {
            PickTransition::Entered { prev, hit } => {
                if let Some(prev) = prev {
                    self.objects[prev].material.swap_map(PLAIN_MAP);
                }
                self.objects[hit].material.swap_map(HIGHLIGHT_MAP);
                self.hovered = Some(hit);
            }
            PickTransition::Left { prev } => {
                self.objects[prev].material.swap_map(PLAIN_MAP);
                self.hovered = None;
            }
            PickTransition::Moved { .. } | PickTransition::Idle => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Point3, Vector3};

    use super::*;

    fn cabinet(name: &str, z: f32) -> SceneObject {
        let geometry = Geometry::new(
            vec![[-1.0, -1.0, z], [1.0, -1.0, z], [1.0, 1.0, z + 1.0], [-1.0, 1.0, z + 1.0]],
            vec![],
            vec![0, 1, 2, 0, 2, 3],
        );
        SceneObject::new(
            name.to_owned(),
            name.contains("cabinet"),
            geometry,
            Instance::new(),
            Material::with_map(PLAIN_MAP),
        )
    }

    fn ray_towards_z() -> Ray {
        Ray {
            origin: Point3::new(0.0, 0.0, -10.0),
            direction: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    #[test]
    fn pick_ignores_non_selectable_objects() {
        let mut scene = Scene::new();
        scene.add_objects(vec![cabinet("rack-frame", 0.0), cabinet("cabinet-01", 3.0)]);
        assert_eq!(scene.pick(&ray_towards_z()), Some(1));
    }

    #[test]
    fn pick_takes_the_nearest_selectable() {
        let mut scene = Scene::new();
        scene.add_objects(vec![cabinet("cabinet-far", 5.0), cabinet("cabinet-near", 0.0)]);
        assert_eq!(scene.pick(&ray_towards_z()), Some(1));
    }

    #[test]
    fn at_most_one_object_is_highlighted() {
        let mut scene = Scene::new();
        scene.add_objects(vec![cabinet("cabinet-a", 0.0), cabinet("cabinet-b", 3.0)]);

        scene.apply_pick(Some(0));
        scene.apply_pick(Some(1));

        let highlighted: Vec<&str> = scene
            .objects
            .iter()
            .filter(|o| o.material.map.as_deref() == Some(HIGHLIGHT_MAP))
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(highlighted, vec!["cabinet-b"]);
        assert_eq!(scene.objects[0].material.map.as_deref(), Some(PLAIN_MAP));
    }

    #[test]
    fn leaving_restores_the_plain_map() {
        let mut scene = Scene::new();
        scene.add_objects(vec![cabinet("cabinet-a", 0.0)]);

        scene.apply_pick(Some(0));
        assert_eq!(scene.hovered, Some(0));
        scene.apply_pick(None);
        assert_eq!(scene.hovered, None);
        assert_eq!(scene.objects[0].material.map.as_deref(), Some(PLAIN_MAP));
    }

    #[test]
    fn repeated_hits_on_the_same_object_change_nothing() {
        let mut scene = Scene::new();
        scene.add_objects(vec![cabinet("cabinet-a", 0.0)]);

        assert_eq!(
            scene.apply_pick(Some(0)),
            PickTransition::Entered { prev: None, hit: 0 }
        );
        assert_eq!(scene.apply_pick(Some(0)), PickTransition::Moved { hit: 0 });
        assert_eq!(
            scene.objects[0].material.map.as_deref(),
            Some(HIGHLIGHT_MAP)
        );
    }
}
