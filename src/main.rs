use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use glam::{Vec3, Vec4};
use log::info;

use polyshade::config::parse_triple;
use polyshade::{
    pack_vertices, wgsl, DepthConvention, FrameResources, FrameUploads, Scene, ShaderOptions,
    ShadingConfig, ShadingVariant, VertexFormat,
};

const USAGE: &str =
    "Usage: polyshade <scene.xml> [--native-depth] [--ambient <r,g,b>] [--light-count <n>] [--wgsl]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read scene {}", options.path))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;
    let config = options.config;

    if options.print_wgsl {
        let transforms = scene.transforms(config.depth);
        let shader = ShaderOptions {
            positional_input: scene.vertex_format() == Some(VertexFormat::Positional),
            ..ShaderOptions::for_transforms(&transforms, config.ambient)
        };
        print!("{}", wgsl(scene.variant, &shader));
        return Ok(());
    }

    let state = scene.frame_state(&config)?;
    println!(
        "Loaded scene with {} vertices, {} triangles, {} light(s) (variant {})",
        scene.mesh.vertices.len(),
        scene.mesh.indices.len() / 3,
        scene.lights.len(),
        scene.variant
    );

    let uploads = FrameUploads::new(scene.variant, &state.transforms, &state.lights);
    print_uploads(&scene, &uploads)?;

    let resources = FrameResources::new(state);
    let batch = resources.batch();
    info!(
        "evaluating {} with {} active light(s)",
        scene.variant,
        batch.lights().active_count()
    );
    let output = batch.draw(
        scene.variant,
        config.lighting(),
        &scene.mesh.vertices,
        &scene.mesh.indices,
    );

    println!("Vertices:");
    for (index, (vertex, colour)) in output
        .vertices
        .iter()
        .zip(&output.vertex_colours)
        .enumerate()
    {
        println!(
            " - #{index} clip={} colour={}",
            format_vec4(vertex.clip_position),
            format_vec3(colour.truncate())
        );
    }
    println!("Triangles:");
    for (index, colour) in output.triangle_colours.iter().enumerate() {
        println!(" - #{index} colour={}", format_vec3(colour.truncate()));
    }
    Ok(())
}

fn print_uploads(scene: &Scene, uploads: &FrameUploads) -> Result<()> {
    println!("Uploads:");
    if scene.vertex_format().is_some() && scene.variant != ShadingVariant::Bootstrap {
        let packed = pack_vertices(&scene.mesh.vertices).context("failed to pack vertices")?;
        println!(
            " - vertices: {} bytes ({} x {:?})",
            packed.bytes.len(),
            packed.count,
            packed.format
        );
    }
    if uploads.camera.is_some() {
        println!(" - camera transform");
    }
    if uploads.model.is_some() {
        println!(" - model transform");
    }
    if let Some(lights) = &uploads.lights {
        println!(" - light block: {} bytes", lights.len());
    }
    if let Some(count) = uploads.light_count {
        println!(" - light count: {}", count.count);
    }
    Ok(())
}

fn format_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

fn format_vec4(v: Vec4) -> String {
    format!("({:.2}, {:.2}, {:.2}, {:.2})", v.x, v.y, v.z, v.w)
}

struct CliOptions {
    path: String,
    config: ShadingConfig,
    print_wgsl: bool,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(path) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut config = ShadingConfig::default();
        let mut print_wgsl = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--native-depth" => config.depth = DepthConvention::Native,
                "--wgsl" => print_wgsl = true,
                "--ambient" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--ambient needs a value. {USAGE}"))?;
                    config.ambient = parse_triple(&value).context("invalid --ambient")?;
                }
                "--light-count" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--light-count needs a value. {USAGE}"))?;
                    config.light_count = Some(
                        value
                            .parse::<u32>()
                            .with_context(|| format!("invalid --light-count {value}"))?,
                    );
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(Self {
            path,
            config,
            print_wgsl,
        })
    }
}
