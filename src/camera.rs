//! Orbit camera and mouse control.
//!
//! The camera orbits a target point at a distance, parameterised by pitch and
//! yaw. Dragging with the left mouse button rotates, the scroll wheel zooms.
//! The same view-projection matrix drives both rendering and cursor ray
//! casting, so what the user sees is exactly what the picker tests against.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

/// Maps the OpenGL clip-space z range of [-1, 1] onto WGPU's [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Camera data in the layout the vertex shader expects.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &OrbitCamera) -> Self {
        Self {
            view_proj: camera.view_proj().into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Point3<f32>, aspect: f32) -> Self {
        Self {
            distance,
            pitch,
            yaw,
            target,
            up: Vector3::unit_y(),
            aspect,
            fovy: Rad(std::f32::consts::PI / 4.0),
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    /// Build an orbit camera positioned at `eye` looking at `target`.
    pub fn looking_from(eye: Point3<f32>, target: Point3<f32>, aspect: f32) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude();
        let pitch = (offset.y / distance).asin();
        let yaw = offset.x.atan2(offset.z);
        Self::new(distance, pitch, yaw, target, aspect)
    }

    /// Eye position derived from the spherical parameters.
    pub fn eye(&self) -> Point3<f32> {
        let offset = Vector3::new(
            self.distance * self.yaw.sin() * self.pitch.cos(),
            self.distance * self.pitch.sin(),
            self.distance * self.yaw.cos() * self.pitch.cos(),
        );
        self.target + offset
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.eye(), self.target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn add_distance(&mut self, delta: f32) {
        self.distance = (self.distance + delta).clamp(0.5, 500.0);
    }

    pub fn add_pitch(&mut self, delta: f32) {
        // Stay clear of the poles so look_at keeps a well-defined up vector.
        let limit = std::f32::consts::PI / 2.0 - 0.01;
        self.pitch = (self.pitch + delta).clamp(-limit, limit);
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.yaw += delta;
    }
}

/// Translates window mouse events into orbit camera motion.
pub struct CameraController {
    rotate_speed: f32,
    zoom_speed: f32,
    is_drag_rotate: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            is_drag_rotate: false,
            last_cursor: None,
        }
    }

    /// Feed a window event into the controller. Returns true when the camera
    /// changed and its uniform needs a re-upload.
    pub fn process_event(&mut self, event: &WindowEvent, camera: &mut OrbitCamera) -> bool {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.is_drag_rotate = *state == ElementState::Pressed;
                if !self.is_drag_rotate {
                    self.last_cursor = None;
                }
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                let changed = if self.is_drag_rotate {
                    if let Some(last) = self.last_cursor {
                        let dx = (position.x - last.x) as f32;
                        let dy = (position.y - last.y) as f32;
                        camera.add_yaw(-dx * self.rotate_speed);
                        camera.add_pitch(dy * self.rotate_speed);
                        true
                    } else {
                        false
                    }
                } else {
                    false
                };
                self.last_cursor = Some(*position);
                changed
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                };
                camera.add_distance(-scroll * self.zoom_speed);
                true
            }
            _ => false,
        }
    }
}
