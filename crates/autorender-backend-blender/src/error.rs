//! Error types for the render-engine backend.

use std::path::PathBuf;

use autorender_backend_texture::{PackingError, PngError, SheetError};
use autorender_spec::{BackendError, FrameRangeError};
use serde::Serialize;
use thiserror::Error;

use crate::shader_graph::GraphShapeError;

/// Result type for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by a [`crate::engine::RenderEngine`] implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Blender executable not found.
    #[error("Blender executable not found. Ensure Blender is installed and in PATH, or set BLENDER_PATH environment variable")]
    BlenderNotFound,

    /// Failed to spawn Blender process.
    #[error("Failed to spawn Blender process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// Blender process timed out.
    #[error("Blender process timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Blender process exited with non-zero status.
    #[error("Blender process exited with status {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// Failed to write the command file for Blender.
    #[error("Failed to write command file: {0}")]
    WriteCommandFailed(#[source] std::io::Error),

    /// Failed to read report from Blender.
    #[error("Failed to read Blender report from {path}: {source}")]
    ReadReportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse report JSON from Blender.
    #[error("Failed to parse Blender report: {0}")]
    ParseReportFailed(#[source] serde_json::Error),

    /// The engine ran the command and reported a failure.
    #[error("engine command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Python entrypoint script not found.
    #[error("Python entrypoint script not found at: {path}")]
    EntrypointNotFound { path: PathBuf },

    /// A command was issued before `load_scene`.
    #[error("no scene is loaded")]
    NoScene,

    /// A named object does not exist in the loaded scene.
    #[error("object '{0}' not found")]
    UnknownObject(String),

    /// A named action does not exist in the loaded scene.
    #[error("action '{0}' not found")]
    UnknownAction(String),

    /// A named material does not exist in the loaded scene.
    #[error("material '{0}' not found")]
    UnknownMaterial(String),

    /// The call is not valid in the current scene state.
    #[error("invalid engine state: {0}")]
    InvalidState(String),

    /// A scene document could not be parsed.
    #[error("failed to parse scene document {path}: {source}")]
    SceneDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Graph edits could not be applied.
    #[error("graph edit failed: {0}")]
    Graph(#[from] GraphShapeError),

    /// Writing an image failed.
    #[error("image output failed: {0}")]
    Image(#[from] PngError),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new process failed error.
    pub fn process_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new command failed error.
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl BackendError for EngineError {
    fn code(&self) -> &'static str {
        match self {
            EngineError::BlenderNotFound => "ENGINE_001",
            EngineError::SpawnFailed(_) => "ENGINE_002",
            EngineError::Timeout { .. } => "ENGINE_003",
            EngineError::ProcessFailed { .. } => "ENGINE_004",
            EngineError::WriteCommandFailed(_) => "ENGINE_005",
            EngineError::ReadReportFailed { .. } => "ENGINE_006",
            EngineError::ParseReportFailed(_) => "ENGINE_007",
            EngineError::CommandFailed { .. } => "ENGINE_008",
            EngineError::EntrypointNotFound { .. } => "ENGINE_009",
            EngineError::NoScene => "ENGINE_010",
            EngineError::UnknownObject(_) => "ENGINE_011",
            EngineError::UnknownAction(_) => "ENGINE_012",
            EngineError::UnknownMaterial(_) => "ENGINE_013",
            EngineError::InvalidState(_) => "ENGINE_014",
            EngineError::SceneDocument { .. } => "ENGINE_015",
            EngineError::Graph(_) => "ENGINE_016",
            EngineError::Image(_) => "ENGINE_017",
            EngineError::Io(_) => "ENGINE_018",
        }
    }

    fn category(&self) -> &'static str {
        "engine"
    }
}

/// Kind of scene entity a config refers to by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Object,
    Action,
    Material,
    Camera,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReferenceKind::Object => "object",
            ReferenceKind::Action => "action",
            ReferenceKind::Material => "material",
            ReferenceKind::Camera => "camera",
        };
        write!(f, "{}", s)
    }
}

/// Errors that fail a single asset.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The config names something the source scene does not contain.
    #[error("{kind} '{name}' not found in source scene")]
    Reference { kind: ReferenceKind, name: String },

    /// The frame range produces no usable frames.
    #[error("invalid frame range: {0}")]
    FrameRange(#[from] FrameRangeError),

    /// An engine call failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Channel packing failed.
    #[error(transparent)]
    Packing(#[from] PackingError),

    /// Sprite sheet assembly failed.
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// Reading, writing or hashing an image failed.
    #[error(transparent)]
    Png(#[from] PngError),

    /// Preparing the output directory failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Creates a missing-reference error.
    pub fn missing(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self::Reference {
            kind,
            name: name.into(),
        }
    }
}

impl BackendError for PipelineError {
    fn code(&self) -> &'static str {
        match self {
            PipelineError::Reference { .. } => "PIPELINE_001",
            PipelineError::FrameRange(_) => "PIPELINE_002",
            PipelineError::Engine(e) => e.code(),
            PipelineError::Packing(e) => e.code(),
            PipelineError::Sheet(e) => e.code(),
            PipelineError::Png(e) => e.code(),
            PipelineError::Io { .. } => "PIPELINE_003",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            PipelineError::Engine(e) => e.category(),
            PipelineError::Packing(e) => e.category(),
            PipelineError::Sheet(e) => e.category(),
            PipelineError::Png(e) => e.category(),
            _ => "pipeline",
        }
    }
}

/// Step of an asset run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Output directory, scene load, reference checks, render setup.
    Setup,
    /// Channel isolation and material swaps.
    Extract,
    Render,
    /// Texture bakes and keyframe bakes.
    Bake,
    /// NLA track and strip placement.
    Sequence,
    Pack,
    Assemble,
    Export,
    Hash,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Extract => "extract",
            Stage::Render => "render",
            Stage::Bake => "bake",
            Stage::Sequence => "sequence",
            Stage::Pack => "pack",
            Stage::Assemble => "assemble",
            Stage::Export => "export",
            Stage::Hash => "hash",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A [`PipelineError`] tagged with the stage it happened in.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    pub source: PipelineError,
}

/// Tags the error of a result with a [`Stage`].
pub trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T, E: Into<PipelineError>> StageExt<T> for Result<T, E> {
    fn stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|e| StageError {
            stage,
            source: e.into(),
        })
    }
}
