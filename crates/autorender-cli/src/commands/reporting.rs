//! Terminal and JSON output shared by the commands.

use anyhow::{Context, Result};
use autorender_backend_blender::RunSummary;
use autorender_spec::{BackendError, ConfigError, ValidationWarning};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One config problem in machine-readable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Document the problem belongs to.
    pub document: Option<PathBuf>,
    pub code: String,
    pub message: String,
    /// JSON path inside the document.
    pub path: Option<String>,
}

impl Diagnostic {
    pub(crate) fn from_warning(document: &Path, warning: &ValidationWarning) -> Self {
        Self {
            document: Some(document.to_path_buf()),
            code: warning.code.to_string(),
            message: warning.message.clone(),
            path: warning.path.clone(),
        }
    }
}

/// Flattens a config error into one diagnostic per problem.
pub(crate) fn config_diagnostics(err: &ConfigError) -> Vec<Diagnostic> {
    match err {
        ConfigError::Invalid { path, errors } => errors
            .iter()
            .map(|e| Diagnostic {
                document: Some(path.clone()),
                code: e.code.to_string(),
                message: e.message.clone(),
                path: e.path.clone(),
            })
            .collect(),
        ConfigError::Multiple(inner) => inner.iter().flat_map(config_diagnostics).collect(),
        other => vec![Diagnostic {
            document: other.path().map(Path::to_path_buf),
            code: other.code().to_string(),
            message: other.to_string(),
            path: None,
        }],
    }
}

/// Prints config errors, grouped by document.
pub(crate) fn print_config_error(err: &ConfigError) {
    println!("\n{}", "Errors:".red().bold());
    let mut current: Option<PathBuf> = None;
    for diag in config_diagnostics(err) {
        if diag.document != current {
            if let Some(ref doc) = diag.document {
                println!("  {}", doc.display().to_string().bold());
            }
            current = diag.document.clone();
        }
        let path_info = diag
            .path
            .as_ref()
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        println!(
            "    {} [{}]{}: {}",
            "x".red(),
            diag.code.red(),
            path_info.dimmed(),
            diag.message
        );
    }
}

/// Prints validation warnings of one document.
pub(crate) fn print_warnings(document: &Path, warnings: &[ValidationWarning]) {
    for warning in warnings {
        let path_info = warning
            .path
            .as_ref()
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        println!(
            "  {} [{}] {}{}: {}",
            "!".yellow(),
            warning.code.to_string().yellow(),
            document.display(),
            path_info.dimmed(),
            warning.message
        );
    }
}

/// Prints produced assets and failures of a run.
pub(crate) fn print_summary(summary: &RunSummary) {
    for asset in &summary.assets {
        println!(
            "  {} {} {} ({} files, {}ms)",
            "ok".green(),
            asset.kind.as_str().dimmed(),
            asset.asset_id,
            asset.outputs.len(),
            asset.duration_ms
        );
    }
    for failure in &summary.failures {
        println!(
            "  {} {} [{}] {}: {}",
            "!!".red(),
            failure.asset_id,
            failure.code.red(),
            failure.stage,
            failure.message
        );
    }

    if summary.is_success() {
        println!(
            "\n{} {} asset(s) rendered ({}ms)",
            "SUCCESS".green().bold(),
            summary.assets.len(),
            summary.total_ms
        );
    } else {
        let note = if summary.aborted {
            " (run aborted)"
        } else {
            ""
        };
        println!(
            "\n{} {} asset(s) rendered, {} failed{} ({}ms)",
            "FAILED".red().bold(),
            summary.assets.len(),
            summary.failures.len(),
            note,
            summary.total_ms
        );
    }
}

/// Writes the run summary as pretty JSON.
pub(crate) fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = summary
        .to_json_pretty()
        .context("Failed to serialize run summary")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary: {}", path.display()))
}
