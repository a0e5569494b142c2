//! Vertex buffer layouts and shader module descriptors for `wgpu`.
//!
//! Attribute locations are shared by every format: position 0, normal 1, colour 2.
use std::borrow::Cow;

use crate::vertex::VertexFormat;

static POSITIONAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![0 => Float32x3];

static COLOURED_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 2 => Float32x3];

static LIT_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

/// Index buffers use 16-bit indices.
pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;

pub fn vertex_layout(format: VertexFormat) -> wgpu::VertexBufferLayout<'static> {
    let attributes: &'static [wgpu::VertexAttribute] = match format {
        VertexFormat::Positional => &POSITIONAL_ATTRIBUTES,
        VertexFormat::Coloured => &COLOURED_ATTRIBUTES,
        VertexFormat::Lit => &LIT_ATTRIBUTES,
    };
    wgpu::VertexBufferLayout {
        array_stride: format.stride() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// Wraps generated WGSL for `Device::create_shader_module`.
pub fn shader_module_descriptor<'a>(
    label: &'a str,
    source: &'a str,
) -> wgpu::ShaderModuleDescriptor<'a> {
    wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lit_layout_is_interleaved() {
        let layout = vertex_layout(VertexFormat::Lit);
        assert_eq!(layout.array_stride, 36);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }

    #[test]
    fn coloured_layout_keeps_colour_location() {
        let layout = vertex_layout(VertexFormat::Coloured);
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes[1].shader_location, 2);
        assert_eq!(layout.attributes[1].offset, 12);
    }
}
