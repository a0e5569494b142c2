//! Uniform blocks uploaded by the host once per frame or draw.
//!
//! Every block is `Pod` so it can be written with `bytemuck::bytes_of`. The
//! shaders bind them all in group 0 at the slots below.
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::light::{CountPolicy, LightRaw, LightSnapshot, FIXED_LIGHTS, MAX_LIGHTS};
use crate::pipeline::{ShadingVariant, Transforms};

pub const CAMERA_BINDING: u32 = 0;
pub const MODEL_BINDING: u32 = 1;
pub const LIGHTS_BINDING: u32 = 2;
pub const LIGHT_COUNT_BINDING: u32 = 3;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub matrix: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(camera: Mat4) -> Self {
        Self {
            matrix: camera.to_cols_array_2d(),
        }
    }
}

/// Model matrix plus the normal matrix, padded to `mat3x4` columns.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub matrix: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

impl ModelUniform {
    /// Without an explicit normal matrix the upper-left 3x3 of `model` is used,
    /// matching what the transform stage does.
    pub fn new(model: Mat4, normal_matrix: Option<Mat3>) -> Self {
        let normal = normal_matrix.unwrap_or_else(|| Mat3::from_mat4(model));
        Self {
            matrix: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DynamicLightBlock {
    pub lights: [LightRaw; MAX_LIGHTS],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FixedLightBlock {
    pub lights: [LightRaw; FIXED_LIGHTS],
}

/// Active light count, padded to the 16 byte uniform granularity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct LightCountUniform {
    pub count: u32,
    pub _padding: [u32; 3],
}

impl LightCountUniform {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            _padding: [0; 3],
        }
    }
}

/// Encodes a light snapshot in the block layout of its own policy.
pub fn light_block_bytes(lights: &LightSnapshot) -> Vec<u8> {
    match lights.policy() {
        CountPolicy::Dynamic => {
            let mut block = DynamicLightBlock::zeroed();
            for (slot, record) in block.lights.iter_mut().zip(lights.records()) {
                *slot = *record;
            }
            bytemuck::bytes_of(&block).to_vec()
        }
        CountPolicy::Fixed => {
            let mut block = FixedLightBlock::zeroed();
            for (slot, record) in block.lights.iter_mut().zip(lights.records()) {
                *slot = *record;
            }
            bytemuck::bytes_of(&block).to_vec()
        }
    }
}

/// Everything a variant reads for one draw, ready to be written into buffers.
///
/// Blocks a variant does not declare are `None`. The active count is uploaded
/// as supplied; the shader clamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUploads {
    pub camera: Option<CameraUniform>,
    pub model: Option<ModelUniform>,
    pub lights: Option<Vec<u8>>,
    pub light_count: Option<LightCountUniform>,
}

impl FrameUploads {
    pub fn new(variant: ShadingVariant, transforms: &Transforms, lights: &LightSnapshot) -> Self {
        if variant == ShadingVariant::Bootstrap {
            return Self {
                camera: None,
                model: None,
                lights: None,
                light_count: None,
            };
        }

        let camera = transforms.camera.map(CameraUniform::new);
        let model = transforms
            .model
            .map(|model| ModelUniform::new(model, transforms.normal_matrix));
        let lights_bytes = variant.is_lit().then(|| light_block_bytes(lights));
        let light_count = (variant == ShadingVariant::LitDynamic)
            .then(|| LightCountUniform::new(lights.active_count()));

        Self {
            camera,
            model,
            lights: lights_bytes,
            light_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::{Light, LightSet};
    use glam::Vec3;

    #[test]
    fn block_sizes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 112);
        assert_eq!(std::mem::size_of::<DynamicLightBlock>(), 960);
        assert_eq!(std::mem::size_of::<FixedLightBlock>(), 192);
        assert_eq!(std::mem::size_of::<LightCountUniform>(), 16);
    }

    #[test]
    fn model_uniform_defaults_to_upper_left_block() {
        let model = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
        let uniform = ModelUniform::new(model, None);
        assert_eq!(uniform.normal[0], [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniform.normal[1], [0.0, 3.0, 0.0, 0.0]);
        assert_eq!(uniform.normal[2], [0.0, 0.0, 4.0, 0.0]);
    }

    #[test]
    fn light_block_matches_policy_size() {
        let dynamic = LightSet::dynamic().snapshot().unwrap();
        assert_eq!(light_block_bytes(&dynamic).len(), 960);

        let fixed = LightSet::from_lights(
            CountPolicy::Fixed,
            [Light::new(Vec3::X, Vec3::ONE), Light::new(Vec3::Y, Vec3::ONE)],
        )
        .snapshot()
        .unwrap();
        let bytes = light_block_bytes(&fixed);
        assert_eq!(bytes.len(), 192);
        let second: LightRaw = bytemuck::pod_read_unaligned(&bytes[LightRaw::SIZE..]);
        assert_eq!(second.position, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn uploads_follow_variant_bindings() {
        let transforms = Transforms::with_camera(Mat4::IDENTITY).model(Mat4::IDENTITY);
        let lights = LightSnapshot::empty().with_active_count(15);

        let dynamic = FrameUploads::new(ShadingVariant::LitDynamic, &transforms, &lights);
        assert!(dynamic.camera.is_some() && dynamic.model.is_some() && dynamic.lights.is_some());
        assert_eq!(dynamic.light_count, Some(LightCountUniform::new(15)));

        let unlit = FrameUploads::new(ShadingVariant::Unlit, &transforms, &lights);
        assert!(unlit.lights.is_none() && unlit.light_count.is_none());

        let bootstrap = FrameUploads::new(ShadingVariant::Bootstrap, &transforms, &lights);
        assert!(bootstrap.camera.is_none() && bootstrap.model.is_none());
    }
}
