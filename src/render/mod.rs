//! Host-side upload contract: uniform blocks, vertex layouts and WGSL sources.
//!
//! Creating devices, pipelines and bind groups belongs to the embedding application.

pub mod layout;
pub mod shaders;
pub mod uniforms;

pub use layout::{shader_module_descriptor, vertex_layout, INDEX_FORMAT};
pub use shaders::{wgsl, ShaderOptions};
pub use uniforms::{
    light_block_bytes, CameraUniform, DynamicLightBlock, FixedLightBlock, FrameUploads,
    LightCountUniform, ModelUniform, CAMERA_BINDING, LIGHTS_BINDING, LIGHT_COUNT_BINDING,
    MODEL_BINDING,
};
