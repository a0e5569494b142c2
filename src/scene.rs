use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use log::warn;
use roxmltree::{Document, Node};

use crate::camera::{Camera, ModelTransform, Perspective, View};
use crate::config::ShadingConfig;
use crate::frame::FrameState;
use crate::geometry::{Geometry, Mesh, Solid, SolidKind};
use crate::light::{CountPolicy, Light, LightSet, LightSnapshot};
use crate::pipeline::{DepthConvention, ShadingVariant, Transforms};
use crate::vertex::{Vertex, VertexError, VertexFormat, MAX_INDEXED_VERTICES};

/// Everything one headless draw needs: the variant, host transforms, lights and geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub variant: ShadingVariant,
    pub camera: Option<Camera>,
    pub model: Option<ModelTransform>,
    pub lights: Vec<Light>,
    /// Count uploaded instead of the number of lights.
    pub light_count: Option<u32>,
    pub mesh: Mesh,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            variant: ShadingVariant::LitDynamic,
            camera: None,
            model: None,
            lights: Vec::new(),
            light_count: None,
            mesh: Mesh::default(),
        }
    }
}

impl Scene {
    /// Parses a scene description.
    ///
    /// ```xml
    /// <scene>
    ///   <variant>lit-dynamic</variant>
    ///   <camera><eye>0 2 6</eye><fov>60</fov></camera>
    ///   <light><position>0 5 0</position><colour>255 255 255</colour></light>
    ///   <solid><kind>cube</kind><size>2</size></solid>
    /// </scene>
    /// ```
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        let mut scene = Scene::default();

        if let Some(variant) = optional_text(&root, "variant") {
            scene.variant = variant.parse()?;
        }
        if let Some(node) = child(&root, "camera") {
            scene.camera = Some(parse_camera(&node).context("invalid <camera>")?);
        }
        if let Some(node) = child(&root, "model") {
            scene.model = Some(parse_model(&node).context("invalid <model>")?);
        }
        scene.light_count = optional_text(&root, "light-count")
            .map(|value| {
                value
                    .parse::<u32>()
                    .map_err(|err| anyhow!("failed to parse light count: {err}"))
            })
            .transpose()?;

        for (index, node) in children(&root, "light").enumerate() {
            let light = parse_light(&node).with_context(|| format!("invalid <light> #{index}"))?;
            scene.lights.push(light);
        }

        scene.mesh = parse_mesh(&root, scene.variant)?;
        Ok(scene)
    }

    /// Format of the mesh's vertex buffer, `None` when it is empty.
    pub fn vertex_format(&self) -> Option<VertexFormat> {
        self.mesh.vertices.first().map(Vertex::format)
    }

    /// Transforms the host uploads for this scene.
    pub fn transforms(&self, depth: DepthConvention) -> Transforms {
        let mut transforms = Transforms::identity().depth(depth);
        transforms.camera = self.camera.map(|camera| camera.projection());
        if let Some(model) = self.model {
            transforms = transforms.model(model.to_matrix());
            transforms.normal_matrix = model.normal_matrix();
        }
        transforms
    }

    /// Light set sized for the variant. Unlit variants get an unused dynamic set.
    pub fn light_set(&self) -> LightSet {
        let policy = self.variant.count_policy().unwrap_or(CountPolicy::Dynamic);
        LightSet::from_lights(policy, self.lights.iter().copied())
    }

    /// Frozen light block, with the scene's count override applied.
    pub fn light_snapshot(&self) -> Result<LightSnapshot> {
        let snapshot = self
            .light_set()
            .snapshot()
            .with_context(|| format!("lights do not fit the {} variant", self.variant))?;
        Ok(match self.light_count {
            Some(count) => snapshot.with_active_count(count),
            None => snapshot,
        })
    }

    /// Frame state for a draw of this scene under `config`.
    ///
    /// A count given in the config wins over the one in the scene.
    pub fn frame_state(&self, config: &ShadingConfig) -> Result<FrameState> {
        Ok(FrameState {
            transforms: self.transforms(config.depth),
            lights: config.apply_light_count(self.light_snapshot()?),
        })
    }
}

fn parse_camera(node: &Node<'_, '_>) -> Result<Camera> {
    let defaults = Camera::default();
    let perspective = Perspective::new(
        parse_f32(optional_text(node, "fov"), defaults.perspective.fov)?,
        parse_f32(optional_text(node, "aspect"), defaults.perspective.aspect)?,
        parse_f32(optional_text(node, "near"), defaults.perspective.near)?,
        parse_f32(optional_text(node, "far"), defaults.perspective.far)?,
    );
    let view = View::new(
        parse_vec3(optional_text(node, "eye"), defaults.view.eye)?,
        parse_vec3(optional_text(node, "target"), defaults.view.target)?,
        parse_vec3(optional_text(node, "up"), defaults.view.up)?,
    );
    Ok(Camera::new(perspective, view))
}

fn parse_model(node: &Node<'_, '_>) -> Result<ModelTransform> {
    let defaults = ModelTransform::default();
    Ok(ModelTransform {
        translation: parse_vec3(optional_text(node, "translation"), defaults.translation)?,
        rotation: parse_vec3(optional_text(node, "rotation"), defaults.rotation)?,
        scale: parse_vec3(optional_text(node, "scale"), defaults.scale)?,
    })
}

fn parse_light(node: &Node<'_, '_>) -> Result<Light> {
    let position = parse_vec3(Some(required_text(node, "position")?), Vec3::ZERO)?;
    let colour = parse_color(optional_text(node, "colour"), Vec3::ONE)?;
    let light = Light::new(position, colour);
    Ok(light.with_frustum(
        parse_f32(optional_text(node, "fov"), light.fov)?,
        parse_f32(optional_text(node, "near"), light.near)?,
        parse_f32(optional_text(node, "far"), light.far)?,
    ))
}

/// Explicit vertices first, then every solid appended after them.
fn parse_mesh(root: &Node<'_, '_>, variant: ShadingVariant) -> Result<Mesh> {
    let mut vertices = Vec::new();
    for (index, node) in children(root, "vertex").enumerate() {
        let vertex = parse_vertex(&node).with_context(|| format!("invalid <vertex> #{index}"))?;
        if variant != ShadingVariant::Bootstrap && !variant.accepts(vertex.format()) {
            bail!(
                "vertex #{index} is {:?}, which the {variant} variant does not read",
                vertex.format()
            );
        }
        if let Some(first) = vertices.first().map(Vertex::format) {
            if vertex.format() != first {
                bail!(
                    "vertex #{index} is {:?} but vertex #0 is {first:?}",
                    vertex.format()
                );
            }
        }
        vertices.push(vertex);
    }

    let indices = match optional_text(root, "indices") {
        Some(text) => parse_indices(&text)?,
        None => (0..vertices.len())
            .map(|index| u16::try_from(index).context("too many vertices for u16 indices"))
            .collect::<Result<Vec<u16>>>()?,
    };
    if indices.len() % 3 != 0 {
        warn!(
            "{} trailing index(es) do not form a triangle",
            indices.len() % 3
        );
    }
    let mut mesh = Mesh::new(vertices, indices);

    for (index, node) in children(root, "solid").enumerate() {
        let solid = parse_solid(&node).with_context(|| format!("invalid <solid> #{index}"))?;
        append(&mut mesh, solid, variant)?;
    }

    if let Some((position, index)) = mesh.find_bad_index() {
        bail!(
            "index {index} at position {position} is out of range for {} vertices",
            mesh.vertices.len()
        );
    }
    Ok(mesh)
}

fn parse_vertex(node: &Node<'_, '_>) -> Result<Vertex> {
    let position = parse_vec3(Some(required_text(node, "position")?), Vec3::ZERO)?;
    let colour = optional_text(node, "colour");
    match optional_text(node, "normal") {
        Some(normal) => Ok(Vertex::lit(
            position,
            parse_vec3(Some(normal), Vec3::ZERO)?,
            parse_color(colour, Vec3::ONE)?,
        )),
        None if colour.is_some() => {
            Ok(Vertex::coloured(position, parse_color(colour, Vec3::ONE)?))
        }
        None => Ok(Vertex::positional(position)),
    }
}

fn parse_solid(node: &Node<'_, '_>) -> Result<Solid> {
    let kind: SolidKind = required_text(node, "kind")?.parse()?;
    let size = parse_f32(optional_text(node, "size"), 1.0)?;
    let colour = parse_color(optional_text(node, "colour"), Vec3::ONE)?;
    Ok(Solid::new(kind, size, colour))
}

/// Appends solid geometry in the format of the mesh's existing vertices.
/// The unlit variant drops the normals, and colours too for positional buffers.
fn append(mesh: &mut Mesh, solid: Solid, variant: ShadingVariant) -> Result<()> {
    let (vertices, indices) = solid.geometry()?;
    let offset = mesh.vertices.len();
    let count = offset + vertices.len();
    if count > MAX_INDEXED_VERTICES {
        return Err(VertexError::TooManyVertices { count }.into());
    }
    let format = mesh
        .vertices
        .first()
        .map(Vertex::format)
        .or(variant.vertex_format())
        .unwrap_or(VertexFormat::Lit);
    mesh.vertices.extend(vertices.into_iter().map(|vertex| match format {
        VertexFormat::Positional => Vertex::positional(vertex.position()),
        VertexFormat::Coloured => Vertex::coloured(vertex.position(), vertex.colour()),
        VertexFormat::Lit => vertex,
    }));
    // Offset fits: the total vertex count was checked above.
    mesh.indices
        .extend(indices.into_iter().map(|index| index + offset as u16));
    Ok(())
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn children<'a, 'input: 'a>(
    node: &Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |child| child.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components(value: &str, what: &str) -> Result<[f32; 3]> {
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse {what} component {component:?}: {err}"))
        })
        .collect::<Result<Vec<f32>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(anyhow!(
            "{what} needs 3 components, found {}",
            numbers.len()
        )),
    }
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    Ok(Vec3::from_array(parse_components(&value, "vector")?))
}

/// Colours are written as 0-255 channels.
fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    Ok(Vec3::from_array(parse_components(&value, "colour")?) / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

fn parse_indices(value: &str) -> Result<Vec<u16>> {
    value
        .split_whitespace()
        .map(|index| {
            index
                .parse::<u16>()
                .map_err(|err| anyhow!("failed to parse index {index:?}: {err}"))
        })
        .collect()
}
