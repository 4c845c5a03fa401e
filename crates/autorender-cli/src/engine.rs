//! Render engine selection from command-line options.

use anyhow::{Context, Result};
use autorender_backend_blender::{BlenderEngine, MemoryEngine, OrchestratorConfig, RenderEngine};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Which render engine to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EngineKind {
    /// Blender subprocesses against `.blend` files
    #[default]
    Blender,
    /// In-process engine over `.scene.json` documents (dry run)
    Memory,
}

/// Engine options shared by the rendering commands.
#[derive(Debug, Clone, Default, Args)]
pub struct EngineOptions {
    /// Render engine to use
    #[arg(long, value_enum, default_value_t = EngineKind::Blender)]
    pub engine: EngineKind,

    /// Path to the Blender executable (default: BLENDER_PATH, then PATH)
    #[arg(long)]
    pub blender: Option<PathBuf>,

    /// Kill a Blender command after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl EngineOptions {
    /// Orchestrator settings for the Blender engine.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default();
        if let Some(ref path) = self.blender {
            config = config.blender_path(path);
        }
        if let Some(secs) = self.timeout {
            config = config.timeout_secs(secs);
        }
        config
    }

    /// Creates the selected engine.
    pub fn build(&self) -> Result<Box<dyn RenderEngine>> {
        match self.engine {
            EngineKind::Blender => {
                let engine = BlenderEngine::new(self.orchestrator_config())
                    .context("Failed to set up the Blender engine")?;
                Ok(Box::new(engine))
            }
            EngineKind::Memory => Ok(Box::new(MemoryEngine::new())),
        }
    }
}
