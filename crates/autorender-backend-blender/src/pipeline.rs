//! Pipeline driver.
//!
//! Runs validated assets one at a time against a single engine. Each asset
//! gets a freshly emptied output directory
//! `<collection output>/<variant subfolder>/<id>`, is dispatched to the
//! handler of its variant, and has every written file hashed with BLAKE3.

use std::path::{Path, PathBuf};
use std::time::Instant;

use autorender_backend_texture::png::hash_file;
use autorender_backend_texture::PngConfig;
use autorender_spec::{AssetConfig, AssetKind, AssetVariant, BackendError, LoadedManifest};
use serde::Serialize;
use thiserror::Error;

use crate::engine::RenderEngine;
use crate::error::{PipelineError, Stage, StageError, StageExt};
use crate::isolate::ChannelIsolator;
use crate::{anim_scene, anim_sprite, material};

/// A failed asset.
#[derive(Debug, Error)]
#[error("asset '{asset_id}' failed during {stage}: {source}")]
pub struct AssetFailure {
    pub asset_id: String,
    pub stage: Stage,
    pub source: PipelineError,
}

impl AssetFailure {
    fn new(asset_id: &str, err: StageError) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            stage: err.stage,
            source: err.source,
        }
    }
}

impl BackendError for AssetFailure {
    fn code(&self) -> &'static str {
        self.source.code()
    }

    fn category(&self) -> &'static str {
        self.source.category()
    }
}

/// What to do after an asset fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run.
    #[default]
    Abort,
    /// Record the failure and go on with the next asset.
    Continue,
}

/// A written file and its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub path: PathBuf,
    /// BLAKE3 hex digest.
    pub hash: String,
}

/// A successfully produced asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetReport {
    pub asset_id: String,
    pub kind: AssetKind,
    pub output_dir: PathBuf,
    pub outputs: Vec<OutputFile>,
    pub duration_ms: u64,
}

/// Serializable form of an [`AssetFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub asset_id: String,
    pub stage: Stage,
    pub code: String,
    pub category: String,
    pub message: String,
}

impl From<&AssetFailure> for FailureReport {
    fn from(failure: &AssetFailure) -> Self {
        Self {
            asset_id: failure.asset_id.clone(),
            stage: failure.stage,
            code: failure.code().to_string(),
            category: failure.category().to_string(),
            message: failure.source.to_string(),
        }
    }
}

/// Outcome of a manifest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub assets: Vec<AssetReport>,
    pub failures: Vec<FailureReport>,
    /// True when the run stopped at a failure before reaching every asset.
    pub aborted: bool,
    pub total_ms: u64,
}

impl RunSummary {
    /// Returns true if no asset failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Serializes the summary to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Drives assets through one render engine.
pub struct Pipeline<'e> {
    engine: &'e mut dyn RenderEngine,
    png: PngConfig,
    isolator: ChannelIsolator,
}

impl<'e> Pipeline<'e> {
    /// Creates a pipeline with default PNG settings.
    pub fn new(engine: &'e mut dyn RenderEngine) -> Self {
        Self {
            engine,
            png: PngConfig::default(),
            isolator: ChannelIsolator::new(),
        }
    }

    /// Sets the PNG encoder settings.
    pub fn with_png_config(mut self, png: PngConfig) -> Self {
        self.png = png;
        self
    }

    /// Produces one asset under `collection_output_dir`.
    pub fn run_asset(
        &mut self,
        config: &AssetConfig,
        collection_output_dir: &Path,
    ) -> Result<AssetReport, AssetFailure> {
        let start = Instant::now();
        let output_dir = config.output_dir(collection_output_dir);
        log::info!(
            "{} '{}' -> {} ({} engine)",
            config.kind(),
            config.id,
            output_dir.display(),
            self.engine.name()
        );

        self.produce(config, &output_dir)
            .map(|outputs| AssetReport {
                asset_id: config.id.clone(),
                kind: config.kind(),
                output_dir,
                outputs,
                duration_ms: start.elapsed().as_millis() as u64,
            })
            .map_err(|err| AssetFailure::new(&config.id, err))
    }

    fn produce(
        &mut self,
        config: &AssetConfig,
        output_dir: &Path,
    ) -> Result<Vec<OutputFile>, StageError> {
        prepare_output_dir(output_dir).stage(Stage::Setup)?;

        let source = config.source_scene_path.as_path();
        let files = match &config.variant {
            AssetVariant::Material(material) => material::generate(
                &mut *self.engine,
                &mut self.isolator,
                source,
                material,
                output_dir,
                &self.png,
            )?
            .outputs(),
            AssetVariant::AnimatedSprite(sprite) => anim_sprite::generate(
                &mut *self.engine,
                &mut self.isolator,
                source,
                sprite,
                output_dir,
                &self.png,
            )?
            .outputs(),
            AssetVariant::AnimatedScene(scene) => {
                vec![anim_scene::generate(&mut *self.engine, source, scene, output_dir)?.output_path]
            }
        };

        files
            .into_iter()
            .map(|path| {
                let hash = hash_file(&path).stage(Stage::Hash)?;
                Ok(OutputFile { path, hash })
            })
            .collect()
    }

    /// Produces every asset of a loaded manifest in order.
    pub fn run_manifest(&mut self, manifest: &LoadedManifest, policy: FailurePolicy) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        'collections: for collection in &manifest.collections {
            log::info!(
                "collection '{}' ({} assets)",
                collection.name,
                collection.assets.len()
            );
            for asset in &collection.assets {
                match self.run_asset(&asset.config, &collection.output_dir) {
                    Ok(report) => summary.assets.push(report),
                    Err(failure) => {
                        log::error!("{}", failure);
                        summary.failures.push(FailureReport::from(&failure));
                        if policy == FailurePolicy::Abort {
                            summary.aborted = true;
                            break 'collections;
                        }
                    }
                }
            }
        }

        summary.total_ms = start.elapsed().as_millis() as u64;
        summary
    }
}

/// Empties (or creates) an asset's output directory.
fn prepare_output_dir(dir: &Path) -> Result<(), PipelineError> {
    let io = |source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(io)?;
    }
    std::fs::create_dir_all(dir).map_err(io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use autorender_spec::{
        ActionConfig, AnimatedSceneConfig, LoadedAsset, LoadedCollection, MaterialConfig,
    };

    const SCENE: &str = r#"{
        "objects": [{"name": "rig", "kind": "ARMATURE"}],
        "actions": [{"name": "Walk", "frame_range": [1, 12]}],
        "materials": [{"name": "Rock"}]
    }"#;

    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("rock.scene.json");
        std::fs::write(&scene, SCENE).unwrap();
        (dir, scene)
    }

    fn material(id: &str, scene: &Path, name: &str) -> AssetConfig {
        AssetConfig::new(
            id,
            scene,
            AssetVariant::Material(MaterialConfig::new(name, 8)),
        )
    }

    fn manifest(out: &Path, assets: Vec<AssetConfig>) -> LoadedManifest {
        LoadedManifest {
            path: out.join("manifest.json"),
            collections: vec![LoadedCollection {
                name: "props".into(),
                output_dir: out.to_path_buf(),
                assets: assets
                    .into_iter()
                    .map(|config| LoadedAsset {
                        document_path: out.join(format!("{}.json", config.id)),
                        config,
                        warnings: Vec::new(),
                    })
                    .collect(),
            }],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_run_asset_hashes_outputs() {
        let (dir, scene) = fixture();
        let mut engine = MemoryEngine::new();
        let mut pipeline = Pipeline::new(&mut engine);

        let report = pipeline
            .run_asset(&material("rock01", &scene, "Rock"), dir.path())
            .unwrap();
        assert_eq!(report.output_dir, dir.path().join("materials/rock01"));
        assert_eq!(report.outputs.len(), 5);
        assert!(report.outputs.iter().all(|o| o.hash.len() == 64));
    }

    #[test]
    fn test_output_dir_is_regenerated() {
        let (dir, scene) = fixture();
        let stale = dir.path().join("materials/rock01/stale.png");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"old").unwrap();

        let mut engine = MemoryEngine::new();
        Pipeline::new(&mut engine)
            .run_asset(&material("rock01", &scene, "Rock"), dir.path())
            .unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_failure_carries_id_and_stage() {
        let (dir, scene) = fixture();
        let mut engine = MemoryEngine::new();
        let failure = Pipeline::new(&mut engine)
            .run_asset(&material("marble", &scene, "Marble"), dir.path())
            .unwrap_err();

        assert_eq!(failure.asset_id, "marble");
        assert_eq!(failure.stage, Stage::Setup);
        assert_eq!(failure.code(), "PIPELINE_001");
        assert_eq!(
            failure.to_string(),
            "asset 'marble' failed during setup: material 'Marble' not found in source scene"
        );
    }

    #[test]
    fn test_abort_policy_stops_run() {
        let (dir, scene) = fixture();
        let loaded = manifest(
            dir.path(),
            vec![
                material("marble", &scene, "Marble"),
                material("rock01", &scene, "Rock"),
            ],
        );
        let mut engine = MemoryEngine::new();
        let summary = Pipeline::new(&mut engine).run_manifest(&loaded, FailurePolicy::Abort);

        assert!(summary.aborted);
        assert!(!summary.is_success());
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.assets.is_empty());
    }

    #[test]
    fn test_continue_policy_runs_remaining_assets() {
        let (dir, scene) = fixture();
        let walk = AssetConfig::new(
            "rig_anims",
            &scene,
            AssetVariant::AnimatedScene(
                AnimatedSceneConfig::new("rig").with_action(ActionConfig::new("Walk")),
            ),
        );
        let loaded = manifest(
            dir.path(),
            vec![material("marble", &scene, "Marble"), walk],
        );
        let mut engine = MemoryEngine::new();
        let summary = Pipeline::new(&mut engine).run_manifest(&loaded, FailurePolicy::Continue);

        assert!(!summary.aborted);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].asset_id, "marble");
        assert_eq!(summary.assets.len(), 1);
        assert_eq!(summary.assets[0].kind, AssetKind::AnimatedScene);
        assert!(dir.path().join("anim_scenes/rig_anims/model.glb").exists());

        let json = summary.to_json_pretty().unwrap();
        assert!(json.contains("\"stage\": \"setup\""));
    }
}
