//! Autorender End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the full pipeline:
//!
//! - Loading: manifest -> validated asset configs
//! - Rendering: asset config -> output files, through the in-process engine
//! - Validation: output files exist and have the expected format
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all tests that use the in-process engine (no Blender required)
//! cargo test -p autorender-tests
//!
//! # Run the Blender tests (requires Blender and a sample .blend)
//! AUTORENDER_RUN_BLENDER_TESTS=1 cargo test -p autorender-tests -- --ignored
//! ```

pub mod fixtures;
pub mod format_validators;
pub mod harness;

// Re-export commonly used items
pub use fixtures::ProjectFixture;
pub use format_validators::{validate_glb, validate_png, FormatError, GlbInfo, PngInfo};
pub use harness::{render_asset, render_manifest, should_run_blender_tests};
