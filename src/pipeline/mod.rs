//! Reference evaluation of the shading stages.
//!
//! Every function here is a pure per-invocation computation: it reads the
//! host supplied transforms and light block and never keeps state between calls.

pub mod lighting;
pub mod transform;
pub mod unlit;

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::light::{CountPolicy, LightCount, LightSnapshot};
use crate::vertex::{Vertex, VertexFormat};

pub use lighting::{LightingStage, DEFAULT_AMBIENT};
pub use transform::{
    normal_matrix_for, remap_depth, transform_vertex, DepthConvention, Transforms,
};
pub use unlit::{bootstrap_vertex, shade_unlit, BOOTSTRAP_COLOURS, BOOTSTRAP_POSITIONS};

/// Attributes emitted per vertex and interpolated across the primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varyings {
    pub world_position: Vec4,
    pub world_normal: Option<Vec3>,
    pub base_colour: Vec3,
}

impl Varyings {
    /// Linear interpolation with barycentric `weights` (expected to sum to 1).
    ///
    /// The normal is only interpolated when all three corners carry one.
    pub fn interpolate(corners: [&Varyings; 3], weights: Vec3) -> Varyings {
        let [a, b, c] = corners;
        let world_normal = match (a.world_normal, b.world_normal, c.world_normal) {
            (Some(na), Some(nb), Some(nc)) => {
                Some(na * weights.x + nb * weights.y + nc * weights.z)
            }
            _ => None,
        };
        Varyings {
            world_position: a.world_position * weights.x
                + b.world_position * weights.y
                + c.world_position * weights.z,
            world_normal,
            base_colour: a.base_colour * weights.x
                + b.base_colour * weights.y
                + c.base_colour * weights.z,
        }
    }
}

/// Output of the transform stage for one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub varyings: Varyings,
}

/// The shader programs that make up the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadingVariant {
    /// Single triangle from a built-in table. No vertex buffer, no transforms.
    Bootstrap,
    /// Coloured geometry through the transform stage, lighting bypassed.
    Unlit,
    /// Lit geometry, loop bound fixed at the two-light block capacity.
    LitFixed,
    /// Lit geometry, loop bound taken from the host supplied active count.
    LitDynamic,
}

impl ShadingVariant {
    pub const ALL: [ShadingVariant; 4] = [
        ShadingVariant::Bootstrap,
        ShadingVariant::Unlit,
        ShadingVariant::LitFixed,
        ShadingVariant::LitDynamic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShadingVariant::Bootstrap => "bootstrap",
            ShadingVariant::Unlit => "unlit",
            ShadingVariant::LitFixed => "lit-fixed",
            ShadingVariant::LitDynamic => "lit-dynamic",
        }
    }

    /// Vertex buffer format the variant is normally fed, `None` when it generates its own.
    pub fn vertex_format(self) -> Option<VertexFormat> {
        match self {
            ShadingVariant::Bootstrap => None,
            ShadingVariant::Unlit => Some(VertexFormat::Coloured),
            ShadingVariant::LitFixed | ShadingVariant::LitDynamic => Some(VertexFormat::Lit),
        }
    }

    /// Whether a buffer of `format` can feed this variant. Unlit also takes
    /// positional buffers, which shade white.
    pub fn accepts(self, format: VertexFormat) -> bool {
        match self {
            ShadingVariant::Bootstrap => false,
            ShadingVariant::Unlit => {
                matches!(format, VertexFormat::Coloured | VertexFormat::Positional)
            }
            ShadingVariant::LitFixed | ShadingVariant::LitDynamic => format == VertexFormat::Lit,
        }
    }

    /// Light block policy, `None` for the unlit variants.
    pub fn count_policy(self) -> Option<CountPolicy> {
        match self {
            ShadingVariant::LitFixed => Some(CountPolicy::Fixed),
            ShadingVariant::LitDynamic => Some(CountPolicy::Dynamic),
            ShadingVariant::Bootstrap | ShadingVariant::Unlit => None,
        }
    }

    pub fn is_lit(self) -> bool {
        self.count_policy().is_some()
    }
}

impl fmt::Display for ShadingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShadingVariant {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ShadingVariant::ALL
            .into_iter()
            .find(|variant| variant.name() == value)
            .ok_or_else(|| {
                anyhow!(
                    "unknown shading variant {value}. Expected bootstrap, unlit, lit-fixed or lit-dynamic"
                )
            })
    }
}

/// One configured shader program: a variant plus its transforms and lighting constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingPipeline {
    variant: ShadingVariant,
    transforms: Transforms,
    lighting: LightingStage,
}

impl ShadingPipeline {
    pub fn new(variant: ShadingVariant, transforms: Transforms, lighting: LightingStage) -> Self {
        Self {
            variant,
            transforms,
            lighting,
        }
    }

    pub fn variant(&self) -> ShadingVariant {
        self.variant
    }

    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    pub fn lighting(&self) -> &LightingStage {
        &self.lighting
    }

    /// Vertex stage. The bootstrap variant ignores `vertex` and uses `vertex_index`.
    pub fn shade_vertex(&self, vertex_index: u32, vertex: &Vertex) -> VertexOutput {
        match self.variant {
            ShadingVariant::Bootstrap => bootstrap_vertex(vertex_index),
            _ => transform_vertex(vertex, &self.transforms),
        }
    }

    /// Loop bound the lit variants use against `lights`.
    pub fn light_count(&self, lights: &LightSnapshot) -> LightCount {
        let capacity = lights.records().len();
        match self.variant {
            ShadingVariant::LitFixed => {
                LightCount::clamped(LightCount::fixed().get() as u32, capacity)
            }
            _ => LightCount::clamped(lights.active_count(), capacity),
        }
    }

    /// Fragment stage.
    pub fn shade_fragment(&self, input: &Varyings, lights: &LightSnapshot) -> Vec4 {
        if self.variant.is_lit() {
            self.lighting
                .shade(input, lights.records(), self.light_count(lights))
        } else {
            shade_unlit(input)
        }
    }

    /// Runs both stages for the point of a triangle at barycentric `weights`.
    pub fn shade_triangle(
        &self,
        first_index: u32,
        corners: [&Vertex; 3],
        weights: Vec3,
        lights: &LightSnapshot,
    ) -> Vec4 {
        let outputs = [
            self.shade_vertex(first_index, corners[0]),
            self.shade_vertex(first_index.wrapping_add(1), corners[1]),
            self.shade_vertex(first_index.wrapping_add(2), corners[2]),
        ];
        let input = Varyings::interpolate(
            [&outputs[0].varyings, &outputs[1].varyings, &outputs[2].varyings],
            weights,
        );
        self.shade_fragment(&input, lights)
    }
}
