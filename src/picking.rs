//! Cursor ray casting against object bounds.
//!
//! Picking runs entirely on the CPU: the cursor position is mapped to clip
//! space, unprojected through the inverse view-projection matrix into a world
//! ray, and tested against the axis-aligned bounding box of every selectable
//! object. The nearest hit along the ray wins.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};

/// Map a cursor position in window pixels to clip-space coordinates.
///
/// Pixel (0, 0) is the top-left corner of the window; clip space runs from
/// -1 to 1 on both axes with y pointing up, so the y axis flips.
pub fn screen_to_clip(x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
    let clip_x = (x / width) * 2.0 - 1.0;
    let clip_y = -(y / height) * 2.0 + 1.0;
    (clip_x, clip_y)
}

/// A world-space ray with a normalized direction.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Unproject a cursor position into a world-space ray.
    ///
    /// Both the near-plane and far-plane points under the cursor are pushed
    /// through the inverse view-projection matrix; the ray starts at the near
    /// point and heads towards the far point. Returns `None` when the matrix
    /// is singular, which only happens with a degenerate camera.
    pub fn from_screen(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        view_proj: Matrix4<f32>,
    ) -> Option<Self> {
        let inverse = view_proj.invert()?;
        let (clip_x, clip_y) = screen_to_clip(x, y, width, height);

        let near = unproject(&inverse, Vector4::new(clip_x, clip_y, 0.0, 1.0))?;
        let far = unproject(&inverse, Vector4::new(clip_x, clip_y, 1.0, 1.0))?;

        let direction = far - near;
        if direction.magnitude2() <= f32::EPSILON {
            return None;
        }
        Some(Self {
            origin: near,
            direction: direction.normalize(),
        })
    }
}

fn unproject(inverse: &Matrix4<f32>, clip: Vector4<f32>) -> Option<Point3<f32>> {
    let world = inverse * clip;
    if world.w.abs() <= f32::EPSILON {
        return None;
    }
    Some(Point3::from_vec(world.truncate() / world.w))
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Compute the bounds of a point set. Empty input yields a zero-size
    /// box at the origin; a ray passing exactly through the origin still
    /// counts it as a hit.
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);
        for p in points {
            min.x = min.x.min(p[0]);
            min.y = min.y.min(p[1]);
            min.z = min.z.min(p[2]);
            max.x = max.x.max(p[0]);
            max.y = max.y.max(p[1]);
            max.z = max.z.max(p[2]);
        }
        if points.is_empty() {
            min = Point3::new(0.0, 0.0, 0.0);
            max = Point3::new(0.0, 0.0, 0.0);
        }
        Self { min, max }
    }

    /// Rebuild the box around all eight transformed corners.
    ///
    /// Transforming min and max alone is wrong under rotation, so every
    /// corner goes through the matrix and the result is re-boxed.
    pub fn transformed(&self, matrix: Matrix4<f32>) -> Self {
        let corners = [
            [self.min.x, self.min.y, self.min.z],
            [self.max.x, self.min.y, self.min.z],
            [self.min.x, self.max.y, self.min.z],
            [self.max.x, self.max.y, self.min.z],
            [self.min.x, self.min.y, self.max.z],
            [self.max.x, self.min.y, self.max.z],
            [self.min.x, self.max.y, self.max.z],
            [self.max.x, self.max.y, self.max.z],
        ];
        let transformed: Vec<[f32; 3]> = corners
            .iter()
            .map(|c| {
                let v = matrix * Vector4::new(c[0], c[1], c[2], 1.0);
                [v.x, v.y, v.z]
            })
            .collect();
        Self::from_points(&transformed)
    }

    /// Slab test: distance along the ray to the box, if hit.
    ///
    /// Returns the entry distance, or 0.0 when the ray origin is already
    /// inside the box. Hits behind the origin are rejected.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let min = self.min[axis];
            let max = self.max[axis];

            if dir.abs() < f32::EPSILON {
                // Ray parallel to this slab; miss unless origin is within it.
                if origin < min || origin > max {
                    return None;
                }
            } else {
                let inv = 1.0 / dir;
                let mut t0 = (min - origin) * inv;
                let mut t1 = (max - origin) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return None;
                }
            }
        }

        if t_max < 0.0 {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

/// Find the nearest box hit by the ray.
///
/// `boxes` pairs each candidate with its caller-side index; the returned
/// index identifies the winner. Ties on distance keep the earlier entry.
pub fn raycast_nearest(ray: &Ray, boxes: &[(usize, Aabb)]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, aabb) in boxes {
        if let Some(distance) = aabb.intersect(ray) {
            match best {
                Some((_, best_distance)) if best_distance <= distance => {}
                _ => best = Some((*index, distance)),
            }
        }
    }
    best.map(|(index, _)| index)
}

/// Outcome of comparing the current pick against the previous one.
///
/// `Entered` carries the previously hovered object (if any) so the caller
/// can restore it before highlighting the new one. `Moved` means the cursor
/// stayed on the same object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickTransition {
    Entered { prev: Option<usize>, hit: usize },
    Moved { hit: usize },
    Left { prev: usize },
    Idle,
}

/// Classify a pick result relative to the previous hover state.
pub fn transition(current: Option<usize>, hit: Option<usize>) -> PickTransition {
    match (current, hit) {
        (Some(prev), Some(hit)) if prev == hit => PickTransition::Moved { hit },
        (prev, Some(hit)) => PickTransition::Entered { prev, hit },
        (Some(prev), None) => PickTransition::Left { prev },
        (None, None) => PickTransition::Idle,
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Point3, Vector3, perspective};

    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn clip_mapping_hits_the_corners() {
        assert_eq!(screen_to_clip(0.0, 0.0, 800.0, 600.0), (-1.0, 1.0));
        assert_eq!(screen_to_clip(800.0, 600.0, 800.0, 600.0), (1.0, -1.0));
        assert_eq!(screen_to_clip(400.0, 300.0, 800.0, 600.0), (0.0, 0.0));
    }

    #[test]
    fn slab_test_hits_box_in_front() {
        let aabb = Aabb {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        let ray = Ray {
            origin: Point3::new(0.0, 0.0, 5.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };
        assert!(approx_eq(aabb.intersect(&ray).unwrap(), 4.0));
    }

    #[test]
    fn slab_test_rejects_box_behind_origin() {
        let aabb = Aabb {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        let ray = Ray {
            origin: Point3::new(0.0, 0.0, 5.0),
            direction: Vector3::new(0.0, 0.0, 1.0),
        };
        assert!(aabb.intersect(&ray).is_none());
    }

    #[test]
    fn origin_inside_box_counts_as_hit_at_zero() {
        let aabb = Aabb {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        let ray = Ray {
            origin: Point3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(1.0, 0.0, 0.0),
        };
        assert_eq!(aabb.intersect(&ray), Some(0.0));
    }

    #[test]
    fn empty_point_set_collapses_to_origin_and_stays_hittable() {
        let aabb = Aabb::from_points(&[]);
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Point3::new(0.0, 0.0, 0.0));

        let through_origin = Ray {
            origin: Point3::new(0.0, 0.0, 5.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };
        assert!(aabb.intersect(&through_origin).is_some());

        let past_origin = Ray {
            origin: Point3::new(1.0, 0.0, 5.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };
        assert!(aabb.intersect(&past_origin).is_none());
    }

    #[test]
    fn nearest_box_wins() {
        let near = Aabb {
            min: Point3::new(-1.0, -1.0, 1.0),
            max: Point3::new(1.0, 1.0, 2.0),
        };
        let far = Aabb {
            min: Point3::new(-1.0, -1.0, 5.0),
            max: Point3::new(1.0, 1.0, 6.0),
        };
        let ray = Ray {
            origin: Point3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(0.0, 0.0, 1.0),
        };
        assert_eq!(raycast_nearest(&ray, &[(7, far), (3, near)]), Some(3));
    }

    #[test]
    fn transformed_bounds_follow_translation() {
        let aabb = Aabb {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        let moved = aabb.transformed(Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)));
        assert!(approx_eq(moved.min.x, 9.0));
        assert!(approx_eq(moved.max.x, 11.0));
    }

    #[test]
    fn center_screen_ray_points_at_look_target() {
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 10.0, 15.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let proj = perspective(Deg(45.0), 800.0 / 600.0, 0.1, 1000.0);
        let ray = Ray::from_screen(400.0, 300.0, 800.0, 600.0, proj * view).unwrap();
        let expected = (Point3::new(0.0, 0.0, 0.0) - Point3::new(0.0, 10.0, 15.0)).normalize();
        assert!(approx_eq(ray.direction.x, expected.x));
        assert!(approx_eq(ray.direction.y, expected.y));
        assert!(approx_eq(ray.direction.z, expected.z));
    }

    #[test]
    fn hover_transitions_follow_previous_state() {
        assert_eq!(transition(None, None), PickTransition::Idle);
        assert_eq!(
            transition(None, Some(2)),
            PickTransition::Entered { prev: None, hit: 2 }
        );
        assert_eq!(transition(Some(2), Some(2)), PickTransition::Moved { hit: 2 });
        assert_eq!(
            transition(Some(2), Some(5)),
            PickTransition::Entered {
                prev: Some(2),
                hit: 5
            }
        );
        assert_eq!(transition(Some(5), None), PickTransition::Left { prev: 5 });
    }
}
