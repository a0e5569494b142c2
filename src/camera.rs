//! Camera and model transforms supplied by the host.
use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::pipeline::normal_matrix_for;

/// Perspective projection. Produces clip depth in `[-w, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perspective {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Perspective {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
        }
    }

    pub fn as_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl View {
    pub fn new(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        Self { eye, target, up }
    }

    pub fn as_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

/// World to clip transform for one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub perspective: Perspective,
    pub view: View,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            perspective: Perspective::new(60.0, 1.0, 0.1, 100.0),
            view: View::new(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO, Vec3::Y),
        }
    }
}

impl Camera {
    pub fn new(perspective: Perspective, view: View) -> Self {
        Self { perspective, view }
    }

    /// Combined projection * view matrix uploaded as the camera transform.
    pub fn projection(&self) -> Mat4 {
        self.perspective.as_matrix() * self.view.as_matrix()
    }

    /// Moves the eye by `increment`, keeping the target.
    pub fn move_camera(&mut self, increment: Vec3) -> &View {
        self.view.eye += increment;
        &self.view
    }
}

/// Object to world transform of one drawable instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    pub translation: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl ModelTransform {
    pub fn to_matrix(&self) -> Mat4 {
        let translation = Mat4::from_translation(self.translation);
        let rotation = Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians());
        let scale = Mat4::from_scale(self.scale);
        translation * rotation * scale
    }

    pub fn is_uniform_scale(&self) -> bool {
        let s = self.scale;
        (s.x - s.y).abs() <= f32::EPSILON && (s.y - s.z).abs() <= f32::EPSILON
    }

    /// Normal matrix the host should supply, `None` when the model's own 3x3 block is exact.
    pub fn normal_matrix(&self) -> Option<Mat3> {
        if self.is_uniform_scale() {
            None
        } else {
            Some(normal_matrix_for(self.to_matrix()))
        }
    }
}
