//! Transform stage: object space to clip space, plus the varyings for the next stage.
use glam::{Mat3, Mat4, Vec4};
use serde::{Deserialize, Serialize};

use super::{Varyings, VertexOutput};
use crate::vertex::Vertex;

/// Depth range expected by the target graphics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepthConvention {
    /// Clip depth spans `[-w, w]` and is remapped to `[0, w]` after projection.
    #[default]
    Remap,
    /// The target already expects `[0, w]`; clip depth is left untouched.
    Native,
}

/// Read-only transforms for one draw. Absent matrices behave as identity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transforms {
    /// World to clip space.
    pub camera: Option<Mat4>,
    /// Object to world space.
    pub model: Option<Mat4>,
    /// Precomputed normal matrix. Falls back to the upper-left 3x3 of `model`,
    /// which is only correct for uniform scale.
    pub normal_matrix: Option<Mat3>,
    pub depth: DepthConvention,
}

impl Transforms {
    /// No camera and no model: positions pass straight into clip space.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn with_camera(camera: Mat4) -> Self {
        Self {
            camera: Some(camera),
            ..Self::default()
        }
    }

    pub fn model(mut self, model: Mat4) -> Self {
        self.model = Some(model);
        self
    }

    pub fn normal_matrix(mut self, normal_matrix: Mat3) -> Self {
        self.normal_matrix = Some(normal_matrix);
        self
    }

    pub fn depth(mut self, depth: DepthConvention) -> Self {
        self.depth = depth;
        self
    }
}

/// Maps clip depth from `[-w, w]` to `[0, w]`.
pub fn remap_depth(clip: Vec4) -> Vec4 {
    Vec4::new(clip.x, clip.y, 0.5 * (clip.z + clip.w), clip.w)
}

/// Inverse-transpose normal matrix for models with non-uniform scale.
pub fn normal_matrix_for(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model).inverse().transpose()
}

/// Runs the transform stage for one vertex.
pub fn transform_vertex(vertex: &Vertex, transforms: &Transforms) -> VertexOutput {
    let object_position = vertex.position().extend(1.0);
    let world_position = match transforms.model {
        Some(model) => model * object_position,
        None => object_position,
    };

    let world_normal = vertex.normal().map(|normal| {
        match (transforms.normal_matrix, transforms.model) {
            (Some(normal_matrix), _) => normal_matrix * normal,
            (None, Some(model)) => Mat3::from_mat4(model) * normal,
            (None, None) => normal,
        }
    });

    // Only a projective transform has a depth range to convert.
    let clip_position = match transforms.camera {
        Some(camera) => {
            let clip = camera * world_position;
            match transforms.depth {
                DepthConvention::Remap => remap_depth(clip),
                DepthConvention::Native => clip,
            }
        }
        None => world_position,
    };

    VertexOutput {
        clip_position,
        varyings: Varyings {
            world_position,
            world_normal,
            base_colour: vertex.colour(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn approx(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn remap_keeps_xy_and_w() {
        let clip = remap_depth(Vec4::new(1.0, -2.0, -3.0, 3.0));
        assert_eq!(clip, Vec4::new(1.0, -2.0, 0.0, 3.0));
    }

    #[test]
    fn identity_passes_position_through() {
        let vertex = Vertex::coloured(Vec3::new(0.25, -0.5, 0.75), Vec3::ONE);
        let out = transform_vertex(&vertex, &Transforms::identity());
        assert_eq!(out.clip_position, Vec4::new(0.25, -0.5, 0.75, 1.0));
    }

    #[test]
    fn camera_output_is_remapped() {
        let camera = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 100.0);
        let vertex = Vertex::positional(Vec3::new(0.0, 0.0, -10.0));
        let raw = camera * Vec4::new(0.0, 0.0, -10.0, 1.0);

        let out = transform_vertex(&vertex, &Transforms::with_camera(camera));
        assert!(approx(out.clip_position, remap_depth(raw)));

        let native = Transforms::with_camera(camera).depth(DepthConvention::Native);
        assert!(approx(transform_vertex(&vertex, &native).clip_position, raw));
    }

    #[test]
    fn model_moves_position_and_rotates_normal() {
        let model = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))
            * Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let vertex = Vertex::lit(Vec3::X, Vec3::X, Vec3::ONE);
        let out = transform_vertex(&vertex, &Transforms::identity().model(model));

        assert!(approx(out.varyings.world_position, Vec4::new(0.0, 3.0, 0.0, 1.0)));
        let normal = out.varyings.world_normal.unwrap();
        assert!((normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn model_without_camera_skips_remap() {
        let model = Mat4::from_translation(Vec3::new(0.0, 0.0, 0.5));
        let vertex = Vertex::positional(Vec3::ZERO);
        let out = transform_vertex(&vertex, &Transforms::identity().model(model));
        assert_eq!(out.clip_position, Vec4::new(0.0, 0.0, 0.5, 1.0));
    }

    #[test]
    fn supplied_normal_matrix_corrects_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let vertex = Vertex::lit(Vec3::ZERO, normal, Vec3::ONE);

        let naive = transform_vertex(&vertex, &Transforms::identity().model(model));
        let corrected = transform_vertex(
            &vertex,
            &Transforms::identity()
                .model(model)
                .normal_matrix(normal_matrix_for(model)),
        );

        // A surface along (1, -1) stretched by x4 becomes (4, -1); its normal must stay perpendicular.
        let tangent = Vec3::new(4.0, -1.0, 0.0);
        assert!(naive.varyings.world_normal.unwrap().dot(tangent).abs() > 1.0);
        assert!(corrected.varyings.world_normal.unwrap().dot(tangent).abs() < 1e-5);
    }

    #[test]
    fn colour_is_passed_through() {
        let vertex = Vertex::coloured(Vec3::ZERO, Vec3::new(0.2, 0.4, 0.6));
        let out = transform_vertex(&vertex, &Transforms::with_camera(Mat4::IDENTITY));
        assert_eq!(out.varyings.base_colour, Vec3::new(0.2, 0.4, 0.6));
        assert_eq!(out.varyings.world_normal, None);
    }
}
