//! Vertex formats accepted by the transform stage and their packed GPU records.
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-vertex attributes supplied by the host. Immutable for the draw call.
///
/// The variants are the capability sets a vertex buffer can carry; the transform
/// stage handles all of them and only emits a normal when one is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "kebab-case")]
pub enum Vertex {
    Positional {
        position: Vec3,
    },
    Coloured {
        position: Vec3,
        colour: Vec3,
    },
    Lit {
        position: Vec3,
        normal: Vec3,
        colour: Vec3,
    },
}

impl Vertex {
    pub fn positional(position: Vec3) -> Self {
        Vertex::Positional { position }
    }

    pub fn coloured(position: Vec3, colour: Vec3) -> Self {
        Vertex::Coloured { position, colour }
    }

    pub fn lit(position: Vec3, normal: Vec3, colour: Vec3) -> Self {
        Vertex::Lit {
            position,
            normal,
            colour,
        }
    }

    pub fn position(&self) -> Vec3 {
        match *self {
            Vertex::Positional { position }
            | Vertex::Coloured { position, .. }
            | Vertex::Lit { position, .. } => position,
        }
    }

    pub fn normal(&self) -> Option<Vec3> {
        match *self {
            Vertex::Lit { normal, .. } => Some(normal),
            _ => None,
        }
    }

    /// Base colour. Positional vertices carry none and shade white.
    pub fn colour(&self) -> Vec3 {
        match *self {
            Vertex::Positional { .. } => Vec3::ONE,
            Vertex::Coloured { colour, .. } | Vertex::Lit { colour, .. } => colour,
        }
    }

    pub fn format(&self) -> VertexFormat {
        match self {
            Vertex::Positional { .. } => VertexFormat::Positional,
            Vertex::Coloured { .. } => VertexFormat::Coloured,
            Vertex::Lit { .. } => VertexFormat::Lit,
        }
    }
}

/// Attribute set of a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VertexFormat {
    Positional,
    Coloured,
    Lit,
}

impl VertexFormat {
    /// Size in bytes of one packed vertex.
    pub const fn stride(self) -> usize {
        match self {
            VertexFormat::Positional => std::mem::size_of::<PositionalVertexRaw>(),
            VertexFormat::Coloured => std::mem::size_of::<ColouredVertexRaw>(),
            VertexFormat::Lit => std::mem::size_of::<LitVertexRaw>(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionalVertexRaw {
    pub position: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColouredVertexRaw {
    pub position: [f32; 3],
    pub colour: [f32; 3],
}

/// Lit vertex as read by the vertex stage: position, normal, colour at locations 0, 1, 2.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LitVertexRaw {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub colour: [f32; 3],
}

/// Vertices addressable by a `u16` index buffer.
pub const MAX_INDEXED_VERTICES: usize = u16::MAX as usize + 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VertexError {
    #[error("vertex list is empty")]
    Empty,
    #[error("{count} vertices do not fit 16-bit indices (at most 65536)")]
    TooManyVertices { count: usize },
    #[error("vertex {index} is {found:?} but the buffer holds {expected:?} vertices")]
    MixedFormats {
        index: usize,
        expected: VertexFormat,
        found: VertexFormat,
    },
}

/// Vertex buffer contents ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedVertices {
    pub format: VertexFormat,
    pub count: usize,
    pub bytes: Vec<u8>,
}

/// Packs a homogeneous vertex list into its interleaved byte layout.
pub fn pack_vertices(vertices: &[Vertex]) -> Result<PackedVertices, VertexError> {
    let first = vertices.first().ok_or(VertexError::Empty)?;
    let format = first.format();
    let mut bytes = Vec::with_capacity(vertices.len() * format.stride());

    for (index, vertex) in vertices.iter().enumerate() {
        match (format, *vertex) {
            (VertexFormat::Positional, Vertex::Positional { position }) => {
                bytes.extend_from_slice(bytemuck::bytes_of(&PositionalVertexRaw {
                    position: position.into(),
                }));
            }
            (VertexFormat::Coloured, Vertex::Coloured { position, colour }) => {
                bytes.extend_from_slice(bytemuck::bytes_of(&ColouredVertexRaw {
                    position: position.into(),
                    colour: colour.into(),
                }));
            }
            (
                VertexFormat::Lit,
                Vertex::Lit {
                    position,
                    normal,
                    colour,
                },
            ) => {
                bytes.extend_from_slice(bytemuck::bytes_of(&LitVertexRaw {
                    position: position.into(),
                    normal: normal.into(),
                    colour: colour.into(),
                }));
            }
            _ => {
                return Err(VertexError::MixedFormats {
                    index,
                    expected: format,
                    found: vertex.format(),
                })
            }
        }
    }

    Ok(PackedVertices {
        format,
        count: vertices.len(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_attribute_counts() {
        assert_eq!(VertexFormat::Positional.stride(), 12);
        assert_eq!(VertexFormat::Coloured.stride(), 24);
        assert_eq!(VertexFormat::Lit.stride(), 36);
    }

    #[test]
    fn positional_vertex_shades_white() {
        let vertex = Vertex::positional(Vec3::X);
        assert_eq!(vertex.colour(), Vec3::ONE);
        assert_eq!(vertex.normal(), None);
    }

    #[test]
    fn lit_vertices_pack_interleaved() {
        let vertices = [
            Vertex::lit(Vec3::new(1.0, 2.0, 3.0), Vec3::Z, Vec3::new(0.0, 1.0, 0.0)),
            Vertex::lit(Vec3::ZERO, Vec3::Y, Vec3::ONE),
        ];
        let packed = pack_vertices(&vertices).unwrap();
        assert_eq!(packed.format, VertexFormat::Lit);
        assert_eq!(packed.count, 2);
        assert_eq!(packed.bytes.len(), 72);
        let first: LitVertexRaw = bytemuck::pod_read_unaligned(&packed.bytes[..36]);
        assert_eq!(first.position, [1.0, 2.0, 3.0]);
        assert_eq!(first.normal, [0.0, 0.0, 1.0]);
        assert_eq!(first.colour, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn mixed_formats_are_rejected() {
        let vertices = [
            Vertex::coloured(Vec3::ZERO, Vec3::ONE),
            Vertex::positional(Vec3::ONE),
        ];
        assert_eq!(
            pack_vertices(&vertices),
            Err(VertexError::MixedFormats {
                index: 1,
                expected: VertexFormat::Coloured,
                found: VertexFormat::Positional,
            })
        );
    }

    #[test]
    fn empty_list_is_rejected() {
        assert_eq!(pack_vertices(&[]), Err(VertexError::Empty));
    }
}
