//! WGSL sources for every shading variant.
//!
//! Sources are assembled from the same constants the reference stages use so the
//! GPU and CPU paths cannot drift apart.
use glam::{Vec2, Vec3};

use super::uniforms::{CAMERA_BINDING, LIGHTS_BINDING, LIGHT_COUNT_BINDING, MODEL_BINDING};
use crate::light::{FIXED_LIGHTS, MAX_LIGHTS};
use crate::pipeline::{
    DepthConvention, ShadingVariant, Transforms, BOOTSTRAP_COLOURS, BOOTSTRAP_POSITIONS,
    DEFAULT_AMBIENT,
};

/// Knobs that change the generated source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderOptions {
    pub depth: DepthConvention,
    pub ambient: Vec3,
    /// Declare and apply the camera transform. Without it no depth remap is emitted.
    pub camera: bool,
    /// Declare and apply the model transform.
    pub model: bool,
    /// The unlit vertex buffer carries positions only and shades white.
    pub positional_input: bool,
}

impl Default for ShaderOptions {
    fn default() -> Self {
        Self {
            depth: DepthConvention::Remap,
            ambient: DEFAULT_AMBIENT,
            camera: true,
            model: true,
            positional_input: false,
        }
    }
}

impl ShaderOptions {
    /// Options matching the transforms a draw will upload.
    pub fn for_transforms(transforms: &Transforms, ambient: Vec3) -> Self {
        Self {
            depth: transforms.depth,
            ambient,
            camera: transforms.camera.is_some(),
            model: transforms.model.is_some(),
            positional_input: false,
        }
    }
}

const LIGHT_STRUCT: &str = r#"
struct Light {
    projection: mat4x4<f32>,
    position: vec4<f32>,
    colour: vec4<f32>,
}
"#;

const TRANSFORM_STRUCTS: &str = r#"
struct CameraTransform {
    matrix: mat4x4<f32>,
}

struct ModelTransform {
    matrix: mat4x4<f32>,
    normal: mat3x4<f32>,
}
"#;

const REMAP_DEPTH: &str = "    out.position.z = 0.5 * (out.position.z + out.position.w);\n";

/// Generates the WGSL module (entry points `vs_main` and `fs_main`) for a variant.
pub fn wgsl(variant: ShadingVariant, options: &ShaderOptions) -> String {
    match variant {
        ShadingVariant::Bootstrap => bootstrap_source(),
        ShadingVariant::Unlit => unlit_source(options),
        ShadingVariant::LitFixed | ShadingVariant::LitDynamic => lit_source(variant, options),
    }
}

fn vec2(v: Vec2) -> String {
    format!("vec2<f32>({:?}, {:?})", v.x, v.y)
}

fn vec3(v: Vec3) -> String {
    format!("vec3<f32>({:?}, {:?}, {:?})", v.x, v.y, v.z)
}

fn bootstrap_source() -> String {
    let positions: Vec<String> = BOOTSTRAP_POSITIONS.iter().map(|p| vec2(*p)).collect();
    let colours: Vec<String> = BOOTSTRAP_COLOURS.iter().map(|c| vec3(*c)).collect();
    format!(
        r#"
struct VertexOutput {{
    @builtin(position) position: vec4<f32>,
    @location(0) colour: vec3<f32>,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {{
    var positions = array<vec2<f32>, 3>({positions});
    var colours = array<vec3<f32>, 3>({colours});
    let slot = vertex_index % 3u;
    var out: VertexOutput;
    out.position = vec4<f32>(positions[slot], 0.0, 1.0);
    out.colour = colours[slot];
    return out;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    return vec4<f32>(input.colour, 1.0);
}}
"#,
        positions = positions.join(", "),
        colours = colours.join(", "),
    )
}

/// Transform bindings plus the body lines computing `world_position` and `out.position`.
fn transform_parts(options: &ShaderOptions) -> (String, String) {
    let mut bindings = String::from(TRANSFORM_STRUCTS);
    let mut body = String::new();

    if options.camera {
        bindings.push_str(&format!(
            "\n@group(0) @binding({CAMERA_BINDING})\nvar<uniform> camera: CameraTransform;\n"
        ));
    }
    if options.model {
        bindings.push_str(&format!(
            "\n@group(0) @binding({MODEL_BINDING})\nvar<uniform> model: ModelTransform;\n"
        ));
        body.push_str(
            "    let world_position = model.matrix * vec4<f32>(input.position, 1.0);\n",
        );
    } else {
        body.push_str("    let world_position = vec4<f32>(input.position, 1.0);\n");
    }

    if options.camera {
        body.push_str("    out.position = camera.matrix * world_position;\n");
        if options.depth == DepthConvention::Remap {
            body.push_str(REMAP_DEPTH);
        }
    } else {
        body.push_str("    out.position = world_position;\n");
    }

    (bindings, body)
}

fn unlit_source(options: &ShaderOptions) -> String {
    let (bindings, transform) = transform_parts(options);
    let (colour_input, colour) = if options.positional_input {
        ("", vec3(Vec3::ONE))
    } else {
        ("    @location(2) colour: vec3<f32>,\n", String::from("input.colour"))
    };
    format!(
        r#"{bindings}
struct VertexInput {{
    @location(0) position: vec3<f32>,
{colour_input}}}

struct VertexOutput {{
    @builtin(position) position: vec4<f32>,
    @location(0) colour: vec3<f32>,
}}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {{
    var out: VertexOutput;
{transform}    out.colour = {colour};
    return out;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    return vec4<f32>(input.colour, 1.0);
}}
"#
    )
}

fn lit_source(variant: ShadingVariant, options: &ShaderOptions) -> String {
    let (bindings, transform) = transform_parts(options);
    let normal = if options.model {
        "    out.world_normal = mat3x3<f32>(model.normal[0].xyz, model.normal[1].xyz, model.normal[2].xyz) * input.normal;\n"
    } else {
        "    out.world_normal = input.normal;\n"
    };

    let (capacity, light_count) = if variant == ShadingVariant::LitDynamic {
        (
            MAX_LIGHTS,
            format!(
                r#"
struct LightCount {{
    value: u32,
}}

@group(0) @binding({LIGHT_COUNT_BINDING})
var<uniform> light_count: LightCount;
"#
            ),
        )
    } else {
        (FIXED_LIGHTS, String::new())
    };
    let bound = if variant == ShadingVariant::LitDynamic {
        "min(light_count.value, LIGHT_CAPACITY)"
    } else {
        "LIGHT_CAPACITY"
    };

    format!(
        r#"{bindings}{LIGHT_STRUCT}
const LIGHT_CAPACITY: u32 = {capacity}u;
const AMBIENT: vec3<f32> = {ambient};

struct Lights {{
    items: array<Light, {capacity}>,
}}

@group(0) @binding({LIGHTS_BINDING})
var<uniform> lights: Lights;
{light_count}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) colour: vec3<f32>,
}}

struct VertexOutput {{
    @builtin(position) position: vec4<f32>,
    @location(0) world_position: vec4<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) colour: vec3<f32>,
}}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {{
    var out: VertexOutput;
{transform}    out.world_position = world_position;
{normal}    out.colour = input.colour;
    return out;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    let normal = normalize(input.world_normal);
    let count = {bound};
    var accumulated = AMBIENT;
    for (var i = 0u; i < count; i = i + 1u) {{
        let light = lights.items[i];
        let light_dir = normalize(light.position.xyz - input.world_position.xyz);
        let diffuse = max(dot(normal, light_dir), 0.0);
        accumulated = accumulated + diffuse * light.colour.xyz;
    }}
    return vec4<f32>(accumulated, 1.0) * vec4<f32>(input.colour, 1.0);
}}
"#,
        ambient = vec3(options.ambient),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_both_entry_points() {
        for variant in ShadingVariant::ALL {
            let source = wgsl(variant, &ShaderOptions::default());
            assert!(source.contains("fn vs_main"), "{variant}");
            assert!(source.contains("fn fs_main"), "{variant}");
        }
    }

    #[test]
    fn remap_follows_depth_convention() {
        let remapped = wgsl(ShadingVariant::LitFixed, &ShaderOptions::default());
        assert!(remapped.contains(REMAP_DEPTH));

        let native = ShaderOptions {
            depth: DepthConvention::Native,
            ..ShaderOptions::default()
        };
        assert!(!wgsl(ShadingVariant::LitFixed, &native).contains(REMAP_DEPTH));
        assert!(!wgsl(ShadingVariant::Unlit, &native).contains(REMAP_DEPTH));
    }

    #[test]
    fn no_camera_means_no_remap() {
        let options = ShaderOptions {
            camera: false,
            ..ShaderOptions::default()
        };
        let source = wgsl(ShadingVariant::Unlit, &options);
        assert!(!source.contains("var<uniform> camera"));
        assert!(!source.contains(REMAP_DEPTH));
        assert!(!wgsl(ShadingVariant::Bootstrap, &ShaderOptions::default()).contains(REMAP_DEPTH));
    }

    #[test]
    fn dynamic_variant_clamps_uploaded_count() {
        let source = wgsl(ShadingVariant::LitDynamic, &ShaderOptions::default());
        assert!(source.contains("const LIGHT_CAPACITY: u32 = 10u;"));
        assert!(source.contains("min(light_count.value, LIGHT_CAPACITY)"));
        assert!(source.contains("@binding(3)"));
    }

    #[test]
    fn fixed_variant_has_no_count_binding() {
        let source = wgsl(ShadingVariant::LitFixed, &ShaderOptions::default());
        assert!(source.contains("const LIGHT_CAPACITY: u32 = 2u;"));
        assert!(source.contains("array<Light, 2>"));
        assert!(!source.contains("light_count"));
    }

    #[test]
    fn ambient_is_baked_from_options() {
        let options = ShaderOptions {
            ambient: Vec3::new(0.1, 0.2, 0.3),
            ..ShaderOptions::default()
        };
        let source = wgsl(ShadingVariant::LitDynamic, &options);
        assert!(source.contains("const AMBIENT: vec3<f32> = vec3<f32>(0.1, 0.2, 0.3);"));
    }

    #[test]
    fn bootstrap_table_comes_from_reference_constants() {
        let source = wgsl(ShadingVariant::Bootstrap, &ShaderOptions::default());
        assert!(source.contains("vec2<f32>(0.0, -0.5)"));
        assert!(source.contains("vec3<f32>(0.0, 0.0, 1.0)"));
    }

    #[test]
    fn positional_unlit_input_shades_white() {
        let coloured = wgsl(ShadingVariant::Unlit, &ShaderOptions::default());
        assert!(coloured.contains("@location(2) colour: vec3<f32>,"));
        assert!(coloured.contains("out.colour = input.colour;"));

        let options = ShaderOptions {
            positional_input: true,
            ..ShaderOptions::default()
        };
        let positional = wgsl(ShadingVariant::Unlit, &options);
        assert!(!positional.contains("@location(2) colour: vec3<f32>,"));
        assert!(positional.contains("out.colour = vec3<f32>(1.0, 1.0, 1.0);"));
    }

    #[test]
    fn options_follow_transforms() {
        let transforms = Transforms::with_camera(glam::Mat4::IDENTITY);
        let options = ShaderOptions::for_transforms(&transforms, DEFAULT_AMBIENT);
        assert!(options.camera);
        assert!(!options.model);
    }
}
