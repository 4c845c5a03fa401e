//! Test fixture utilities for creating synthetic asset projects.
//!
//! Scenes are `*.scene.json` documents, so fixtures render with the
//! in-process engine.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use autorender_spec::AssetConfig;

/// A scene with a principled material `Rock` (base colour 0.4/0.6/0.2,
/// roughness 0.8, metallic 0.0) and an emission-only material `Glow`.
pub const ROCK_SCENE: &str = r#"{
    "objects": [],
    "materials": [
        {"name": "Rock", "graph": {
            "nodes": [
                {"name": "Principled BSDF", "kind": "BSDF_PRINCIPLED",
                 "inputs": {"Base Color": [0.4, 0.6, 0.2, 1.0], "Roughness": 0.8, "Metallic": 0.0}},
                {"name": "Material Output", "kind": "OUTPUT_MATERIAL"}
            ],
            "links": [{"from_node": "Principled BSDF", "from_socket": "BSDF",
                       "to_node": "Material Output", "to_socket": "Surface"}]
        }},
        {"name": "Glow", "graph": {
            "nodes": [
                {"name": "Emission", "kind": "EMISSION", "inputs": {"Color": [1.0, 0.0, 0.0, 1.0]}},
                {"name": "Material Output", "kind": "OUTPUT_MATERIAL"}
            ],
            "links": [{"from_node": "Emission", "from_socket": "Emission",
                       "to_node": "Material Output", "to_socket": "Surface"}]
        }}
    ]
}"#;

/// A camera, a knight mesh with one authored and one empty material slot,
/// and a `Walk` action over frames 1..=24.
pub const KNIGHT_SCENE: &str = r#"{
    "objects": [
        {"name": "Camera", "kind": "CAMERA"},
        {"name": "knight", "kind": "MESH", "material_slots": ["Armor", null]}
    ],
    "actions": [{"name": "Walk", "frame_range": [1, 24]}],
    "materials": [{"name": "Armor"}]
}"#;

/// An armature with three actions and a prop carrying leftover animation.
pub const RIG_SCENE: &str = r#"{
    "objects": [
        {"name": "rig", "kind": "ARMATURE", "animation": {"active_action": "Idle"}},
        {"name": "prop", "kind": "MESH", "animation": {"active_action": "Spin"}}
    ],
    "actions": [
        {"name": "Walk", "frame_range": [1, 24]},
        {"name": "Run", "frame_range": [1, 16]},
        {"name": "Idle", "frame_range": [1, 60]},
        {"name": "Spin", "frame_range": [1, 10]}
    ]
}"#;

/// A temporary project with scenes, asset documents and manifests.
pub struct ProjectFixture {
    pub root: TempDir,
}

impl ProjectFixture {
    /// Create a new empty project.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Get the project root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Collection output directory used by [`Self::add_manifest`].
    pub fn output_dir(&self) -> PathBuf {
        self.path().join("build")
    }

    /// Write a scene document as `scenes/<name>.scene.json`.
    pub fn add_scene(&self, name: &str, json: &str) -> PathBuf {
        let dir = self.path().join("scenes");
        fs::create_dir_all(&dir).expect("Failed to create scenes dir");
        let path = dir.join(format!("{}.scene.json", name));
        fs::write(&path, json).expect("Failed to write scene");
        path
    }

    /// Write an asset document as `assets/<id>.json`.
    ///
    /// The source scene path is stored relative to the document when it
    /// lies inside the project.
    pub fn add_asset(&self, config: &AssetConfig) -> PathBuf {
        let dir = self.path().join("assets");
        fs::create_dir_all(&dir).expect("Failed to create assets dir");

        let mut config = config.clone();
        if let Ok(relative) = config.source_scene_path.strip_prefix(self.path()) {
            config.source_scene_path = Path::new("..").join(relative);
        }

        let path = dir.join(format!("{}.json", config.id));
        let json = config.to_json_pretty().expect("Failed to serialize asset");
        fs::write(&path, json).expect("Failed to write asset");
        path
    }

    /// Write a raw asset document as `assets/<file_name>`.
    pub fn add_raw_asset(&self, file_name: &str, json: &str) -> PathBuf {
        let dir = self.path().join("assets");
        fs::create_dir_all(&dir).expect("Failed to create assets dir");
        let path = dir.join(file_name);
        fs::write(&path, json).expect("Failed to write asset");
        path
    }

    /// Write `manifest.json` with one collection per `(name, documents)`
    /// pair, all writing under [`Self::output_dir`].
    pub fn add_manifest(&self, collections: &[(&str, Vec<PathBuf>)]) -> PathBuf {
        let collections: Vec<serde_json::Value> = collections
            .iter()
            .map(|(name, documents)| {
                let assets: Vec<String> = documents
                    .iter()
                    .map(|doc| {
                        doc.strip_prefix(self.path())
                            .unwrap_or(doc)
                            .to_string_lossy()
                            .replace('\\', "/")
                    })
                    .collect();
                serde_json::json!({
                    "name": name,
                    "output_dir": "build",
                    "assets": assets,
                })
            })
            .collect();

        let path = self.path().join("manifest.json");
        let json = serde_json::to_string_pretty(&serde_json::json!({ "collections": collections }))
            .expect("Failed to serialize manifest");
        fs::write(&path, json).expect("Failed to write manifest");
        path
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
