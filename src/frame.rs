//! Per-frame shared resources and batch evaluation.
//!
//! The host is the single writer; a batch holds a read guard for its whole
//! duration, so uploads for the next frame wait until every invocation is done.
use std::sync::Arc;

use glam::{Vec3, Vec4};
use log::{debug, warn};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::light::LightSnapshot;
use crate::pipeline::{
    LightingStage, ShadingPipeline, ShadingVariant, Transforms, Varyings, VertexOutput,
};
use crate::vertex::Vertex;

const BOOTSTRAP_INDICES: [u16; 3] = [0, 1, 2];

/// Read-only inputs of one batch of invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub transforms: Transforms,
    pub lights: LightSnapshot,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            transforms: Transforms::identity(),
            lights: LightSnapshot::empty(),
        }
    }
}

/// Cloneable handle to the frame state shared between the host and its batches.
#[derive(Debug, Default)]
pub struct FrameResources {
    state: Arc<RwLock<FrameState>>,
}

impl Clone for FrameResources {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl FrameResources {
    pub fn new(state: FrameState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn set_transforms(&self, transforms: Transforms) {
        self.state.write().transforms = transforms;
    }

    pub fn set_lights(&self, lights: LightSnapshot) {
        self.state.write().lights = lights;
    }

    /// Applies a host-side mutation. Blocks while a batch is in flight.
    pub fn update<F, R>(&self, updater: F) -> R
    where
        F: FnOnce(&mut FrameState) -> R,
    {
        updater(&mut self.state.write())
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> FrameState {
        self.state.read().clone()
    }

    /// Starts a batch. The returned view keeps the state frozen until dropped.
    pub fn batch(&self) -> Batch<'_> {
        Batch {
            state: self.state.read(),
        }
    }
}

/// Frozen view of the frame state used by every invocation of one draw.
pub struct Batch<'a> {
    state: RwLockReadGuard<'a, FrameState>,
}

/// Results of one draw: one entry per vertex and one per triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutput {
    pub vertices: Vec<VertexOutput>,
    /// Fragment stage evaluated at each vertex.
    pub vertex_colours: Vec<Vec4>,
    /// Fragment stage evaluated at each triangle centroid.
    pub triangle_colours: Vec<Vec4>,
}

impl Batch<'_> {
    pub fn transforms(&self) -> &Transforms {
        &self.state.transforms
    }

    pub fn lights(&self) -> &LightSnapshot {
        &self.state.lights
    }

    pub fn pipeline(&self, variant: ShadingVariant, lighting: LightingStage) -> ShadingPipeline {
        ShadingPipeline::new(variant, self.state.transforms, lighting)
    }

    /// Runs an indexed draw. The bootstrap variant ignores the buffers and draws three vertices.
    pub fn draw(
        &self,
        variant: ShadingVariant,
        lighting: LightingStage,
        vertices: &[Vertex],
        indices: &[u16],
    ) -> DrawOutput {
        let pipeline = self.pipeline(variant, lighting);
        let lights = &self.state.lights;

        let bootstrap = variant == ShadingVariant::Bootstrap;
        let placeholder = [Vertex::positional(Vec3::ZERO); 3];
        let vertices: &[Vertex] = if bootstrap { &placeholder } else { vertices };
        let indices: &[u16] = if bootstrap { &BOOTSTRAP_INDICES } else { indices };

        let outputs: Vec<VertexOutput> = vertices
            .iter()
            .enumerate()
            .map(|(index, vertex)| pipeline.shade_vertex(index as u32, vertex))
            .collect();

        let vertex_colours = outputs
            .iter()
            .map(|output| pipeline.shade_fragment(&output.varyings, lights))
            .collect();

        let mut skipped = 0;
        let triangle_colours: Vec<Vec4> = indices
            .chunks_exact(3)
            .filter_map(|tri| {
                let corners = [
                    outputs.get(usize::from(tri[0])),
                    outputs.get(usize::from(tri[1])),
                    outputs.get(usize::from(tri[2])),
                ];
                let [Some(a), Some(b), Some(c)] = corners else {
                    skipped += 1;
                    return None;
                };
                let centroid = Varyings::interpolate(
                    [&a.varyings, &b.varyings, &c.varyings],
                    Vec3::splat(1.0 / 3.0),
                );
                Some(pipeline.shade_fragment(&centroid, lights))
            })
            .collect();
        if skipped > 0 {
            warn!("{variant} draw skipped {skipped} triangle(s) with out-of-range indices");
        }

        debug!(
            "{variant} draw: {} vertices, {} triangles, {} light(s)",
            outputs.len(),
            triangle_colours.len(),
            pipeline.light_count(lights).get()
        );

        DrawOutput {
            vertices: outputs,
            vertex_colours,
            triangle_colours,
        }
    }
}
