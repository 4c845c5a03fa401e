//! Doctor command implementation
//!
//! Checks that Blender can be found and started.

use anyhow::Result;
use autorender_backend_blender::orchestrator::ENTRYPOINT_ENV;
use autorender_backend_blender::Orchestrator;
use colored::Colorize;
use std::path::Path;
use std::process::{Command, ExitCode};

use crate::engine::EngineOptions;

/// Run the doctor command
///
/// # Returns
/// Exit code: 0 if Blender was found and reports a version, 1 otherwise
pub fn run(engine: &EngineOptions) -> Result<ExitCode> {
    println!("{}", "Autorender Doctor".cyan().bold());
    println!("{}", "=================".cyan());
    println!();

    println!("{}", "Versions:".bold());
    println!(
        "  {} autorender-cli v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    let mut all_ok = true;

    println!("{}", "Blender:".bold());
    let orchestrator = Orchestrator::with_config(engine.orchestrator_config());
    match orchestrator.find_blender() {
        Ok(path) => match blender_version(&path) {
            Ok(version) => {
                println!(
                    "  {} Blender {} ({})",
                    "ok".green(),
                    version,
                    path.display()
                );
            }
            Err(e) => {
                println!("  {} {} could not be started: {}", "!!".red(), path.display(), e);
                all_ok = false;
            }
        },
        Err(e) => {
            println!("  {} {}", "!!".red(), e);
            println!(
                "     {}",
                "Set BLENDER_PATH or pass --blender, or use --engine memory for dry runs.".dimmed()
            );
            all_ok = false;
        }
    }

    let entrypoint = &orchestrator.config().entrypoint_path;
    if entrypoint.exists() {
        println!("  {} entrypoint {}", "ok".green(), entrypoint.display());
    } else if let Ok(path) = std::env::var(ENTRYPOINT_ENV) {
        println!("  {} entrypoint {} (from {})", "ok".green(), path, ENTRYPOINT_ENV);
    } else {
        println!("  {} entrypoint (embedded)", "ok".green());
    }
    println!();

    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

fn parse_blender_version(output: &str) -> Option<String> {
    output
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Blender "))
        .map(|v| v.trim().to_string())
}

fn blender_version(path: &Path) -> Result<String> {
    let output = Command::new(path).arg("--version").output()?;
    if !output.status.success() {
        anyhow::bail!("exited with status {}", output.status);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_blender_version(&stdout).unwrap_or_else(|| "unknown".to_string()))
}
