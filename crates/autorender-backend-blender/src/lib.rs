//! Autorender Blender Backend
//!
//! This crate turns validated asset configs into files by driving a render
//! engine: baked material texture sets, animated sprite sheets and GLB
//! scenes with baked animation clips.
//!
//! # Overview
//!
//! Three asset variants are supported:
//!
//! - **Material** - diffuse, normal, roughness and metallic bakes of one
//!   material plus a packed ORM texture
//! - **AnimatedSprite** - per-frame diffuse and normal renders of animated
//!   objects from an orthographic camera, assembled into sprite sheets
//! - **AnimatedScene** - actions baked to keyframes, laid out on NLA tracks
//!   and exported as GLB
//!
//! # Architecture
//!
//! Handlers never touch Blender directly. Every scene operation goes through
//! the [`RenderEngine`] trait, received as `&mut dyn RenderEngine`:
//!
//! 1. **[`BlenderEngine`]** - Spawns Blender per command through the
//!    [`orchestrator`]; a Python entrypoint runs inside Blender and writes a
//!    JSON report
//! 2. **[`MemoryEngine`]** - Evaluates a JSON scene document in process,
//!    used by tests and dry runs
//!
//! Material channels that have no dedicated bake pass are isolated first:
//! the [`shader_graph`] module plans the rewiring of a duplicated material so
//! the wanted input is emitted unlit, and the [`isolate`] module applies it.
//!
//! # Example
//!
//! ```ignore
//! use autorender_backend_blender::{FailurePolicy, MemoryEngine, Pipeline};
//! use autorender_spec::load_manifest;
//! use std::path::Path;
//!
//! let manifest = load_manifest(Path::new("assets/manifest.json"))?;
//! let mut engine = MemoryEngine::new();
//! let summary = Pipeline::new(&mut engine).run_manifest(&manifest, FailurePolicy::Continue);
//!
//! println!("{} assets, {} failures", summary.assets.len(), summary.failures.len());
//! ```
//!
//! # Blender Requirements
//!
//! [`BlenderEngine`] requires Blender to be installed. The orchestrator
//! searches for Blender in:
//!
//! 1. The configured path
//! 2. `BLENDER_PATH` environment variable
//! 3. System PATH
//! 4. Common installation locations (platform-specific)
//!
//! # Crate Structure
//!
//! - [`engine`] - Render engine trait and implementations
//! - [`shader_graph`] - Typed material graphs and channel isolation plans
//! - [`isolate`] - Applies isolation plans to duplicated materials
//! - [`material`] - Material texture sets
//! - [`anim_sprite`] - Animated sprite sheets
//! - [`anim_scene`] - Baked animation export
//! - [`pipeline`] - Asset dispatch, output directories and run summaries
//! - [`orchestrator`] - Blender subprocess management
//! - [`error`] - Error types

pub mod anim_scene;
pub mod anim_sprite;
pub mod engine;
pub mod error;
pub mod isolate;
pub mod material;
pub mod orchestrator;
pub mod pipeline;
pub mod shader_graph;

pub use engine::{BlenderEngine, MemoryEngine, RenderEngine, SceneDocument};
pub use error::{EngineError, EngineResult, PipelineError, Stage, StageError};
pub use isolate::ChannelIsolator;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use pipeline::{AssetFailure, AssetReport, FailurePolicy, Pipeline, RunSummary};
