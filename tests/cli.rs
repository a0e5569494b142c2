use assert_cmd::prelude::*;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const LIT_SCENE: &str = r#"<scene>
  <variant>lit-dynamic</variant>
  <light>
    <position>0 0 5</position>
    <colour>255 255 255</colour>
  </light>
  <vertex>
    <position>0 0 0</position>
    <normal>0 0 1</normal>
    <colour>255 255 255</colour>
  </vertex>
  <vertex>
    <position>1 0 0</position>
    <normal>0 0 1</normal>
    <colour>255 255 255</colour>
  </vertex>
  <vertex>
    <position>0 1 0</position>
    <normal>0 0 1</normal>
    <colour>255 255 255</colour>
  </vertex>
</scene>
"#;

fn write_scene(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(xml.as_bytes()).expect("write scene");
    tmp
}

fn polyshade() -> Command {
    Command::cargo_bin("polyshade").expect("binary exists")
}

#[test]
fn cli_shades_lit_scene() {
    let scene = write_scene(LIT_SCENE);
    polyshade()
        .arg(scene.path())
        .assert()
        .success()
        .stdout(contains(
            "Loaded scene with 3 vertices, 1 triangles, 1 light(s) (variant lit-dynamic)",
        ))
        .stdout(contains(" - vertices: 108 bytes (3 x Lit)"))
        .stdout(contains(" - light block: 960 bytes"))
        .stdout(contains(" - light count: 1"))
        .stdout(contains(
            " - #0 clip=(0.00, 0.00, 0.00, 1.00) colour=(1.05, 1.05, 1.05)",
        ))
        .stdout(contains(" - #1 clip=(1.00, 0.00, 0.00, 1.00) colour=(1.03, 1.03, 1.03)"));
}

#[test]
fn cli_applies_ambient_and_count_overrides() {
    let scene = write_scene(LIT_SCENE);
    polyshade()
        .arg(scene.path())
        .args(["--ambient", "0,0,0", "--light-count", "15"])
        .assert()
        .success()
        .stdout(contains(" - light count: 15"))
        .stdout(contains(" - #0 clip=(0.00, 0.00, 0.00, 1.00) colour=(1.00, 1.00, 1.00)"));
}

#[test]
fn cli_prints_wgsl_for_scene_variant() {
    let scene = write_scene(
        r#"<scene>
  <variant>lit-dynamic</variant>
  <camera><eye>0 0 5</eye></camera>
</scene>
"#,
    );
    polyshade()
        .arg(scene.path())
        .arg("--wgsl")
        .assert()
        .success()
        .stdout(contains("fn vs_main"))
        .stdout(contains("min(light_count.value, LIGHT_CAPACITY)"))
        .stdout(contains("out.position.z = 0.5 * (out.position.z + out.position.w);"));

    polyshade()
        .arg(scene.path())
        .args(["--wgsl", "--native-depth"])
        .assert()
        .success()
        .stdout(contains("fn fs_main").and(contains("0.5 * (out.position.z").not()));
}

#[test]
fn cli_draws_bootstrap_triangle() {
    let scene = write_scene("<scene><variant>bootstrap</variant></scene>");
    polyshade()
        .arg(scene.path())
        .assert()
        .success()
        .stdout(contains(" - #0 clip=(0.00, -0.50, 0.00, 1.00) colour=(1.00, 0.00, 0.00)"))
        .stdout(contains(" - #2 clip=(-0.50, 0.50, 0.00, 1.00) colour=(0.00, 0.00, 1.00)"));
}

#[test]
fn cli_rejects_unknown_arguments() {
    let scene = write_scene(LIT_SCENE);
    polyshade()
        .arg(scene.path())
        .arg("--phong")
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --phong"));
}

#[test]
fn cli_reports_incomplete_fixed_light_block() {
    let scene = write_scene(
        r#"<scene>
  <variant>lit-fixed</variant>
  <light><position>0 5 0</position></light>
</scene>
"#,
    );
    polyshade()
        .arg(scene.path())
        .assert()
        .failure()
        .stderr(contains("lights do not fit the lit-fixed variant"));
}

#[test]
fn cli_rejects_non_finite_ambient() {
    let scene = write_scene(LIT_SCENE);
    polyshade()
        .arg(scene.path())
        .args(["--ambient", "inf,0,0"])
        .assert()
        .failure()
        .stderr(contains("invalid --ambient").and(contains("is not finite")));
}

#[test]
fn cli_rejects_out_of_range_indices() {
    let scene = write_scene(
        r#"<scene>
  <variant>unlit</variant>
  <vertex><position>0 0 0</position><colour>255 0 0</colour></vertex>
  <vertex><position>1 0 0</position><colour>255 0 0</colour></vertex>
  <vertex><position>0 1 0</position><colour>255 0 0</colour></vertex>
  <indices>0 1 200 0 1 2</indices>
</scene>
"#,
    );
    polyshade()
        .arg(scene.path())
        .assert()
        .failure()
        .stderr(contains("index 200 at position 2 is out of range"));
}

#[test]
fn cli_prints_white_unlit_wgsl_for_positional_vertices() {
    let scene = write_scene(
        r#"<scene>
  <variant>unlit</variant>
  <vertex><position>0 0 0</position></vertex>
  <vertex><position>1 0 0</position></vertex>
  <vertex><position>0 1 0</position></vertex>
</scene>
"#,
    );
    polyshade()
        .arg(scene.path())
        .arg("--wgsl")
        .assert()
        .success()
        .stdout(contains("out.colour = vec3<f32>(1.0, 1.0, 1.0);"))
        .stdout(contains("@location(2) colour").not());

    polyshade()
        .arg(scene.path())
        .assert()
        .success()
        .stdout(contains(" - vertices: 36 bytes (3 x Positional)"))
        .stdout(contains(" - #0 colour=(1.00, 1.00, 1.00)"));
}
