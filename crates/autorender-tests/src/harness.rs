//! Test harness utilities for running the pipeline and checking outputs.

use std::path::Path;

use autorender_backend_blender::{
    AssetFailure, AssetReport, FailurePolicy, MemoryEngine, Orchestrator, Pipeline, RunSummary,
};
use autorender_spec::{load_manifest, AssetConfig};

use crate::format_validators::{validate_png, PngInfo};

/// Load `manifest` and render it with a fresh in-process engine.
///
/// Panics if the manifest fails to load.
pub fn render_manifest(manifest: &Path, policy: FailurePolicy) -> RunSummary {
    let loaded = load_manifest(manifest)
        .unwrap_or_else(|e| panic!("Failed to load manifest {}: {}", manifest.display(), e));
    let mut engine = MemoryEngine::new();
    Pipeline::new(&mut engine).run_manifest(&loaded, policy)
}

/// Render one asset with a fresh in-process engine.
pub fn render_asset(
    config: &AssetConfig,
    collection_output_dir: &Path,
) -> Result<AssetReport, AssetFailure> {
    let mut engine = MemoryEngine::new();
    Pipeline::new(&mut engine).run_asset(config, collection_output_dir)
}

/// Read and validate a PNG output.
///
/// Panics if the file is missing or not a PNG.
pub fn read_png_info(path: &Path) -> PngInfo {
    let data = std::fs::read(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    validate_png(&data).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

/// Check if Blender can be located the way the engine locates it.
pub fn is_blender_available() -> bool {
    Orchestrator::new().find_blender().is_ok()
}

/// Check if Blender tests should run based on environment variable.
pub fn should_run_blender_tests() -> bool {
    std::env::var("AUTORENDER_RUN_BLENDER_TESTS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
