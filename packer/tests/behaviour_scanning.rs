//! Behaviour-driven tests for artefact discovery.
//!
//! Tests use the rstest-bdd v0.5.0 mutable world pattern.

use adapterpack_packer::scanner::{
    ADAPTER_WEIGHTS_NAME, AdapterExtractor, MODEL_WEIGHTS_NAME, ScanResult, WeightsFileNames,
    extract_adapters, scan,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Default)]
struct ScanWorld {
    temp_dir: Option<TempDir>,
    result: Option<ScanResult>,
}

#[fixture]
fn world() -> ScanWorld {
    ScanWorld {
        temp_dir: Some(TempDir::new().expect("temp dir")),
        ..ScanWorld::default()
    }
}

fn temp_path(world: &ScanWorld) -> PathBuf {
    world
        .temp_dir
        .as_ref()
        .expect("temp_dir set")
        .path()
        .to_path_buf()
}

fn write_weights(world: &ScanWorld, dir: &str, file_name: &str) {
    let path = temp_path(world).join(dir);
    fs::create_dir_all(&path).expect("mkdir");
    fs::write(path.join(file_name), b"weights").expect("write weights");
}

fn relative(world: &ScanWorld, dirs: &[PathBuf]) -> String {
    let root = temp_path(world);
    dirs.iter()
        .map(|dir| {
            dir.strip_prefix(&root)
                .expect("inside temp dir")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_scan(world: &mut ScanWorld, include_models: bool) {
    let roots = [temp_path(world).join("checkpoints")];
    world.result = Some(scan(&roots, &WeightsFileNames::default(), include_models));
}

/// Writes one adapter into a fixed sub-directory of each model.
struct SubdirExtractor {
    subdir: PathBuf,
}

impl AdapterExtractor for SubdirExtractor {
    fn extract(&self, model_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let target = model_dir.join(&self.subdir);
        fs::create_dir_all(&target)?;
        fs::write(target.join(ADAPTER_WEIGHTS_NAME), b"extracted")?;
        Ok(vec![target])
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("an adapter weights file in \"{dir}\"")]
fn given_adapter_weights(world: &mut ScanWorld, dir: String) {
    write_weights(world, &dir, ADAPTER_WEIGHTS_NAME);
}

#[given("a model weights file in \"{dir}\"")]
fn given_model_weights(world: &mut ScanWorld, dir: String) {
    write_weights(world, &dir, MODEL_WEIGHTS_NAME);
}

#[when("the roots are scanned without models")]
fn when_scanned_without_models(world: &mut ScanWorld) {
    run_scan(world, false);
}

#[when("the roots are scanned with models")]
fn when_scanned_with_models(world: &mut ScanWorld) {
    run_scan(world, true);
}

#[when("a missing root is scanned")]
fn when_missing_root_scanned(world: &mut ScanWorld) {
    let roots = [temp_path(world).join("does-not-exist")];
    world.result = Some(scan(&roots, &WeightsFileNames::default(), true));
}

#[when("adapters are extracted into \"{dir}\"")]
fn when_adapters_extracted(world: &mut ScanWorld, dir: String) {
    let root = temp_path(world);
    let result = world.result.as_mut().expect("scan ran");
    let model_dir = result.model_dirs.first().expect("a model was found").clone();
    let subdir = root
        .join(&dir)
        .strip_prefix(&model_dir)
        .expect("target below the model")
        .to_path_buf();
    extract_adapters(result, &SubdirExtractor { subdir });
}

#[then("the adapter directories are \"{expected}\"")]
fn then_adapter_dirs(world: &mut ScanWorld, expected: String) {
    let result = world.result.as_ref().expect("scan ran");
    assert_eq!(relative(world, &result.adapter_dirs), expected);
}

#[then("the model directories are \"{expected}\"")]
fn then_model_dirs(world: &mut ScanWorld, expected: String) {
    let result = world.result.as_ref().expect("scan ran");
    assert_eq!(relative(world, &result.model_dirs), expected);
}

#[then("no model directories are reported")]
fn then_no_models(world: &mut ScanWorld) {
    let result = world.result.as_ref().expect("scan ran");
    assert!(result.model_dirs.is_empty());
}

#[then("nothing is found")]
fn then_nothing_found(world: &mut ScanWorld) {
    let result = world.result.as_ref().expect("scan ran");
    assert!(result.is_empty());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/scanning.feature",
    name = "Adapters nested below a root are found in name order"
)]
fn scenario_nested_adapters(world: ScanWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/scanning.feature",
    name = "Model directories are reported when requested"
)]
fn scenario_models_requested(world: ScanWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/scanning.feature",
    name = "Extracted adapters join the found ones"
)]
fn scenario_extracted_adapters(world: ScanWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/scanning.feature",
    name = "A missing root yields nothing"
)]
fn scenario_missing_root(world: ScanWorld) {
    let _ = world;
}
