//! Render command implementations
//!
//! `render` produces every asset of a manifest; `render-asset` produces one
//! asset document into an explicit output directory.

use anyhow::{Context, Result};
use autorender_backend_blender::pipeline::FailureReport;
use autorender_backend_blender::{FailurePolicy, Pipeline, RunSummary};
use autorender_spec::{load_asset, load_manifest};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use super::reporting;
use crate::engine::EngineOptions;

/// Output options shared by the render commands.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions<'a> {
    /// Print the run summary as JSON instead of colored text.
    pub json: bool,
    /// Also write the run summary to this file.
    pub summary_path: Option<&'a str>,
}

/// Run the render command
///
/// # Returns
/// Exit code: 0 if every asset was produced, 1 otherwise
pub fn run(
    manifest_path: &str,
    engine: &EngineOptions,
    keep_going: bool,
    output: &OutputOptions<'_>,
) -> Result<ExitCode> {
    if !output.json {
        println!("{} {}", "Rendering:".cyan().bold(), manifest_path);
    }

    let manifest = match load_manifest(Path::new(manifest_path)) {
        Ok(manifest) => manifest,
        Err(err) => {
            if output.json {
                let diags = reporting::config_diagnostics(&err);
                println!("{}", serde_json::to_string_pretty(&diags)?);
            } else {
                reporting::print_config_error(&err);
                println!("\n{} {}", "FAILED".red().bold(), err);
            }
            return Ok(ExitCode::from(1));
        }
    };

    if !output.json {
        for collection in &manifest.collections {
            for asset in &collection.assets {
                reporting::print_warnings(&asset.document_path, &asset.warnings);
            }
        }
    }

    let policy = if keep_going {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };

    let mut engine = engine.build()?;
    log::info!(
        "rendering {} asset(s) with the {} engine",
        manifest.asset_count(),
        engine.name()
    );
    let summary = Pipeline::new(engine.as_mut()).run_manifest(&manifest, policy);

    finish(&summary, output)
}

/// Run the render-asset command
///
/// # Returns
/// Exit code: 0 if the asset was produced, 1 otherwise
pub fn run_asset(
    asset_path: &str,
    out_dir: &str,
    engine: &EngineOptions,
    output: &OutputOptions<'_>,
) -> Result<ExitCode> {
    let start = Instant::now();
    if !output.json {
        println!("{} {}", "Rendering:".cyan().bold(), asset_path);
    }

    let asset = match load_asset(Path::new(asset_path)) {
        Ok(asset) => asset,
        Err(err) => {
            if output.json {
                let diags = reporting::config_diagnostics(&err);
                println!("{}", serde_json::to_string_pretty(&diags)?);
            } else {
                reporting::print_config_error(&err);
                println!("\n{} {}", "FAILED".red().bold(), err);
            }
            return Ok(ExitCode::from(1));
        }
    };
    if !output.json {
        reporting::print_warnings(&asset.document_path, &asset.warnings);
    }

    let mut engine = engine.build()?;
    let mut summary = RunSummary::default();
    match Pipeline::new(engine.as_mut()).run_asset(&asset.config, Path::new(out_dir)) {
        Ok(report) => summary.assets.push(report),
        Err(failure) => {
            log::error!("{}", failure);
            summary.failures.push(FailureReport::from(&failure));
        }
    }
    summary.total_ms = start.elapsed().as_millis() as u64;

    finish(&summary, output)
}

fn finish(summary: &RunSummary, output: &OutputOptions<'_>) -> Result<ExitCode> {
    if let Some(path) = output.summary_path {
        reporting::write_summary(summary, Path::new(path))?;
    }

    if output.json {
        let json = summary
            .to_json_pretty()
            .context("Failed to serialize run summary")?;
        println!("{}", json);
    } else {
        reporting::print_summary(summary);
        if let Some(path) = output.summary_path {
            println!("{} {}", "Summary written to:".dimmed(), path);
        }
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
