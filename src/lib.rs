//! Forward shading pipeline stages with a CPU reference evaluator.
//!
//! The crate describes a small set of shader programs (a transform stage, a
//! Lambertian lighting stage over a bounded light block, and unlit debug
//! variants) twice: once as WGSL sources with their upload layouts, and once
//! as plain Rust functions that compute the same values per invocation. The
//! host side (device setup, pipelines, bind groups) stays outside of the crate.

pub mod camera;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod light;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod vertex;

pub use camera::{Camera, ModelTransform, Perspective, View};
pub use config::ShadingConfig;
pub use frame::{Batch, DrawOutput, FrameResources, FrameState};
pub use geometry::{Geometry, Mesh, Polygon, Solid, SolidKind};
pub use light::{
    CountPolicy, Light, LightCount, LightRaw, LightSet, LightSetError, LightSnapshot,
    FIXED_LIGHTS, MAX_LIGHTS,
};
pub use pipeline::{
    DepthConvention, LightingStage, ShadingPipeline, ShadingVariant, Transforms, Varyings,
    VertexOutput,
};
pub use render::{wgsl, FrameUploads, ShaderOptions};
pub use scene::Scene;
pub use vertex::{
    pack_vertices, PackedVertices, Vertex, VertexError, VertexFormat, MAX_INDEXED_VERTICES,
};
