//! Unlit variants: colour pass-through and the bootstrap triangle used for smoke tests.
use glam::{Vec2, Vec3, Vec4};

use super::{Varyings, VertexOutput};

/// Clip-space corners of the bootstrap triangle.
pub const BOOTSTRAP_POSITIONS: [Vec2; 3] = [
    Vec2::new(0.0, -0.5),
    Vec2::new(0.5, 0.5),
    Vec2::new(-0.5, 0.5),
];

/// Corner colours of the bootstrap triangle: red, green, blue.
pub const BOOTSTRAP_COLOURS: [Vec3; 3] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
];

/// Fragment output of every unlit variant.
pub fn shade_unlit(input: &Varyings) -> Vec4 {
    input.base_colour.extend(1.0)
}

/// Vertex stage of the bootstrap generator. Takes no host geometry; the built-in
/// vertex index selects a table entry and wraps every three vertices.
pub fn bootstrap_vertex(vertex_index: u32) -> VertexOutput {
    let slot = (vertex_index % 3) as usize;
    let clip_position = BOOTSTRAP_POSITIONS[slot].extend(0.0).extend(1.0);
    VertexOutput {
        clip_position,
        varyings: Varyings {
            world_position: clip_position,
            world_normal: None,
            base_colour: BOOTSTRAP_COLOURS[slot],
        },
    }
}
