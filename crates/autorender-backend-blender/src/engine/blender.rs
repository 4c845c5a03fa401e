//! [`RenderEngine`] backed by Blender subprocesses.
//!
//! The source `.blend` file is copied into a private working directory on
//! `load_scene`. Every call becomes one [`EngineCommand`] run by the Python
//! entrypoint against the working copy; commands that change the scene save
//! it before Blender exits, so state carries over between calls.
//! `revert_scene` copies the source over the working file again.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    BakeRequest, CameraSetup, ExportOptions, KeyframeBakeOptions, RenderEngine, RenderTarget,
    SceneInfo, ShadingMode,
};
use crate::error::{EngineError, EngineResult};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::shader_graph::{GraphEdit, ShaderGraph};

const WORKING_SCENE: &str = "working.blend";

/// One command for the Python entrypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EngineCommand {
    SceneInfo,
    SetRenderTarget { target: RenderTarget },
    SetCamera { camera: CameraSetup },
    SetShading { shading: ShadingMode },
    BindAction { object: String, action: Option<String> },
    ClearAnimation,
    EnsureAnimationData { object: String },
    RemoveAction { action: String },
    ClearNlaTracks { object: String },
    SelectForBake { object: String },
    BakeToKeyframes { object: String, options: KeyframeBakeOptions },
    CreateNlaTrack { object: String, track: String },
    AddStrip {
        object: String,
        track: String,
        action: String,
        start_frame: i32,
    },
    MaterialGraph { material: String },
    CreateMaterial { name: String },
    DuplicateMaterial { material: String, new_name: String },
    ApplyGraphEdits { material: String, edits: Vec<GraphEdit> },
    AssignMaterial {
        object: String,
        slot: usize,
        material: String,
    },
    RemoveMaterial { material: String },
    AddBakePlane { material: String },
    BakeTexture { request: BakeRequest },
    RenderActiveFrame { frame: i32, output: PathBuf },
    ExportScene { options: ExportOptions },
}

impl EngineCommand {
    /// Command name as written in the command file.
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::SceneInfo => "scene_info",
            EngineCommand::SetRenderTarget { .. } => "set_render_target",
            EngineCommand::SetCamera { .. } => "set_camera",
            EngineCommand::SetShading { .. } => "set_shading",
            EngineCommand::BindAction { .. } => "bind_action",
            EngineCommand::ClearAnimation => "clear_animation",
            EngineCommand::EnsureAnimationData { .. } => "ensure_animation_data",
            EngineCommand::RemoveAction { .. } => "remove_action",
            EngineCommand::ClearNlaTracks { .. } => "clear_nla_tracks",
            EngineCommand::SelectForBake { .. } => "select_for_bake",
            EngineCommand::BakeToKeyframes { .. } => "bake_to_keyframes",
            EngineCommand::CreateNlaTrack { .. } => "create_nla_track",
            EngineCommand::AddStrip { .. } => "add_strip",
            EngineCommand::MaterialGraph { .. } => "material_graph",
            EngineCommand::CreateMaterial { .. } => "create_material",
            EngineCommand::DuplicateMaterial { .. } => "duplicate_material",
            EngineCommand::ApplyGraphEdits { .. } => "apply_graph_edits",
            EngineCommand::AssignMaterial { .. } => "assign_material",
            EngineCommand::RemoveMaterial { .. } => "remove_material",
            EngineCommand::AddBakePlane { .. } => "add_bake_plane",
            EngineCommand::BakeTexture { .. } => "bake_texture",
            EngineCommand::RenderActiveFrame { .. } => "render_active_frame",
            EngineCommand::ExportScene { .. } => "export_scene",
        }
    }

    /// Whether the working scene must be saved after the command.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            EngineCommand::SceneInfo
                | EngineCommand::MaterialGraph { .. }
                | EngineCommand::BakeTexture { .. }
                | EngineCommand::RenderActiveFrame { .. }
                | EngineCommand::ExportScene { .. }
        )
    }
}

#[derive(Serialize)]
struct CommandFile<'a> {
    save: bool,
    #[serde(flatten)]
    command: &'a EngineCommand,
}

/// Report written by the Python entrypoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Command-specific result.
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub blender_version: Option<String>,
}

/// [`RenderEngine`] that drives Blender.
pub struct BlenderEngine {
    orchestrator: Orchestrator,
    workdir: tempfile::TempDir,
    source: Option<PathBuf>,
}

impl BlenderEngine {
    /// Creates an engine with the given orchestrator settings.
    pub fn new(config: OrchestratorConfig) -> EngineResult<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("autorender_scene_")
            .tempdir()?;
        Ok(Self {
            orchestrator: Orchestrator::with_config(config),
            workdir,
            source: None,
        })
    }

    fn working_scene(&self) -> PathBuf {
        self.workdir.path().join(WORKING_SCENE)
    }

    fn copy_source(&self) -> EngineResult<()> {
        let source = self.source.as_ref().ok_or(EngineError::NoScene)?;
        std::fs::copy(source, self.working_scene())?;
        Ok(())
    }

    fn execute(&self, command: EngineCommand) -> EngineResult<serde_json::Value> {
        if self.source.is_none() {
            return Err(EngineError::NoScene);
        }
        let file = CommandFile {
            save: command.mutates(),
            command: &command,
        };
        let json = serde_json::to_string(&file).map_err(EngineError::ParseReportFailed)?;
        let report = self
            .orchestrator
            .run_json(&self.working_scene(), &json, command.name())?;
        Ok(report.result)
    }

    fn execute_unit(&self, command: EngineCommand) -> EngineResult<()> {
        self.execute(command).map(|_| ())
    }

    fn execute_as<T: DeserializeOwned>(&self, command: EngineCommand) -> EngineResult<T> {
        let value = self.execute(command)?;
        serde_json::from_value(value).map_err(EngineError::ParseReportFailed)
    }
}

impl RenderEngine for BlenderEngine {
    fn name(&self) -> &'static str {
        "blender"
    }

    fn load_scene(&mut self, path: &Path) -> EngineResult<()> {
        self.source = Some(path.to_path_buf());
        if let Err(e) = self.copy_source() {
            self.source = None;
            return Err(e);
        }
        log::debug!(
            "working copy of {} at {}",
            path.display(),
            self.working_scene().display()
        );
        Ok(())
    }

    fn revert_scene(&mut self) -> EngineResult<()> {
        self.copy_source()
    }

    fn scene_info(&mut self) -> EngineResult<SceneInfo> {
        self.execute_as(EngineCommand::SceneInfo)
    }

    fn set_render_target(&mut self, target: &RenderTarget) -> EngineResult<()> {
        self.execute_unit(EngineCommand::SetRenderTarget { target: *target })
    }

    fn set_camera(&mut self, camera: &CameraSetup) -> EngineResult<()> {
        self.execute_unit(EngineCommand::SetCamera {
            camera: camera.clone(),
        })
    }

    fn set_shading(&mut self, shading: &ShadingMode) -> EngineResult<()> {
        self.execute_unit(EngineCommand::SetShading {
            shading: shading.clone(),
        })
    }

    fn bind_action(&mut self, object: &str, action: Option<&str>) -> EngineResult<()> {
        self.execute_unit(EngineCommand::BindAction {
            object: object.to_string(),
            action: action.map(str::to_string),
        })
    }

    fn clear_animation(&mut self) -> EngineResult<()> {
        self.execute_unit(EngineCommand::ClearAnimation)
    }

    fn ensure_animation_data(&mut self, object: &str) -> EngineResult<()> {
        self.execute_unit(EngineCommand::EnsureAnimationData {
            object: object.to_string(),
        })
    }

    fn remove_action(&mut self, action: &str) -> EngineResult<()> {
        self.execute_unit(EngineCommand::RemoveAction {
            action: action.to_string(),
        })
    }

    fn clear_nla_tracks(&mut self, object: &str) -> EngineResult<()> {
        self.execute_unit(EngineCommand::ClearNlaTracks {
            object: object.to_string(),
        })
    }

    fn select_for_bake(&mut self, object: &str) -> EngineResult<()> {
        self.execute_unit(EngineCommand::SelectForBake {
            object: object.to_string(),
        })
    }

    fn bake_to_keyframes(
        &mut self,
        object: &str,
        options: &KeyframeBakeOptions,
    ) -> EngineResult<()> {
        self.execute_unit(EngineCommand::BakeToKeyframes {
            object: object.to_string(),
            options: *options,
        })
    }

    fn create_nla_track(&mut self, object: &str, track: &str) -> EngineResult<()> {
        self.execute_unit(EngineCommand::CreateNlaTrack {
            object: object.to_string(),
            track: track.to_string(),
        })
    }

    fn add_strip(
        &mut self,
        object: &str,
        track: &str,
        action: &str,
        start_frame: i32,
    ) -> EngineResult<()> {
        self.execute_unit(EngineCommand::AddStrip {
            object: object.to_string(),
            track: track.to_string(),
            action: action.to_string(),
            start_frame,
        })
    }

    fn material_graph(&mut self, material: &str) -> EngineResult<ShaderGraph> {
        self.execute_as(EngineCommand::MaterialGraph {
            material: material.to_string(),
        })
    }

    fn create_material(&mut self, name: &str) -> EngineResult<String> {
        self.execute_as(EngineCommand::CreateMaterial {
            name: name.to_string(),
        })
    }

    fn duplicate_material(&mut self, material: &str, new_name: &str) -> EngineResult<String> {
        self.execute_as(EngineCommand::DuplicateMaterial {
            material: material.to_string(),
            new_name: new_name.to_string(),
        })
    }

    fn apply_graph_edits(&mut self, material: &str, edits: &[GraphEdit]) -> EngineResult<()> {
        self.execute_unit(EngineCommand::ApplyGraphEdits {
            material: material.to_string(),
            edits: edits.to_vec(),
        })
    }

    fn assign_material(&mut self, object: &str, slot: usize, material: &str) -> EngineResult<()> {
        self.execute_unit(EngineCommand::AssignMaterial {
            object: object.to_string(),
            slot,
            material: material.to_string(),
        })
    }

    fn remove_material(&mut self, material: &str) -> EngineResult<()> {
        self.execute_unit(EngineCommand::RemoveMaterial {
            material: material.to_string(),
        })
    }

    fn add_bake_plane(&mut self, material: &str) -> EngineResult<String> {
        self.execute_as(EngineCommand::AddBakePlane {
            material: material.to_string(),
        })
    }

    fn bake_texture(&mut self, request: &BakeRequest) -> EngineResult<()> {
        self.execute_unit(EngineCommand::BakeTexture {
            request: request.clone(),
        })
    }

    fn render_active_frame(&mut self, frame: i32, output: &Path) -> EngineResult<()> {
        self.execute_unit(EngineCommand::RenderActiveFrame {
            frame,
            output: output.to_path_buf(),
        })
    }

    fn export_scene(&mut self, options: &ExportOptions) -> EngineResult<()> {
        self.execute_unit(EngineCommand::ExportScene {
            options: options.clone(),
        })
    }
}
