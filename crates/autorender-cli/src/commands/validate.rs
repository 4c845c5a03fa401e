//! Validate command implementation
//!
//! Loads a manifest and every asset document it lists without rendering.

use anyhow::{Context, Result};
use autorender_spec::{load_manifest, LoadedManifest};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::reporting::{self, Diagnostic};

/// Machine-readable validate output.
#[derive(Debug, Serialize)]
struct ValidateOutput {
    ok: bool,
    manifest: PathBuf,
    collections: Vec<CollectionOutput>,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
struct CollectionOutput {
    name: String,
    output_dir: PathBuf,
    assets: Vec<String>,
}

/// Run the validate command
///
/// # Returns
/// Exit code: 0 if every document is valid, 1 otherwise
pub fn run(manifest_path: &str, json_output: bool) -> Result<ExitCode> {
    let path = Path::new(manifest_path);
    if json_output {
        run_json(path)
    } else {
        run_human(path)
    }
}

fn run_human(path: &Path) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), path.display());

    match load_manifest(path) {
        Ok(manifest) => {
            for warning in &manifest.warnings {
                reporting::print_warnings(&manifest.path, std::slice::from_ref(warning));
            }
            for collection in &manifest.collections {
                println!(
                    "  {} {} -> {} ({} assets)",
                    "collection".dimmed(),
                    collection.name.bold(),
                    collection.output_dir.display(),
                    collection.assets.len()
                );
                for asset in &collection.assets {
                    reporting::print_warnings(&asset.document_path, &asset.warnings);
                }
            }
            println!(
                "\n{} {} asset(s) valid",
                "SUCCESS".green().bold(),
                manifest.asset_count()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            reporting::print_config_error(&err);
            println!("\n{} {}", "FAILED".red().bold(), err);
            Ok(ExitCode::from(1))
        }
    }
}

fn run_json(path: &Path) -> Result<ExitCode> {
    let output = match load_manifest(path) {
        Ok(manifest) => success_output(&manifest),
        Err(err) => ValidateOutput {
            ok: false,
            manifest: path.to_path_buf(),
            collections: Vec::new(),
            errors: reporting::config_diagnostics(&err),
            warnings: Vec::new(),
        },
    };

    let json =
        serde_json::to_string_pretty(&output).context("Failed to serialize validate output")?;
    println!("{}", json);

    Ok(if output.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn success_output(manifest: &LoadedManifest) -> ValidateOutput {
    let mut warnings: Vec<Diagnostic> = manifest
        .warnings
        .iter()
        .map(|w| Diagnostic::from_warning(&manifest.path, w))
        .collect();

    let collections = manifest
        .collections
        .iter()
        .map(|collection| {
            for asset in &collection.assets {
                warnings.extend(
                    asset
                        .warnings
                        .iter()
                        .map(|w| Diagnostic::from_warning(&asset.document_path, w)),
                );
            }
            CollectionOutput {
                name: collection.name.clone(),
                output_dir: collection.output_dir.clone(),
                assets: collection
                    .assets
                    .iter()
                    .map(|a| a.config.id.clone())
                    .collect(),
            }
        })
        .collect();

    ValidateOutput {
        ok: true,
        manifest: manifest.path.clone(),
        collections,
        errors: Vec::new(),
        warnings,
    }
}
