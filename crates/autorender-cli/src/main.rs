//! Autorender CLI - render game assets from Blender scenes
//!
//! This binary validates asset manifests and renders them into material
//! texture sets, sprite sheets and GLB animation exports.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use autorender_cli::commands;
use autorender_cli::commands::render::OutputOptions;
use autorender_cli::engine::EngineOptions;

/// Autorender - asset rendering pipeline
#[derive(Parser)]
#[command(name = "autorender")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a manifest and every asset document it lists
    Validate {
        /// Path to the manifest file
        manifest: String,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Render every asset of a manifest
    Render {
        /// Path to the manifest file
        manifest: String,

        #[command(flatten)]
        engine: EngineOptions,

        /// Continue with the remaining assets after a failure
        #[arg(long)]
        keep_going: bool,

        /// Write the run summary as JSON to this file
        #[arg(long)]
        summary: Option<String>,

        /// Output the run summary as JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Render a single asset document
    RenderAsset {
        /// Path to the asset document
        asset: String,

        /// Collection output directory
        #[arg(short, long)]
        out: String,

        #[command(flatten)]
        engine: EngineOptions,

        /// Write the run summary as JSON to this file
        #[arg(long)]
        summary: Option<String>,

        /// Output the run summary as JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Check that Blender is installed and usable
    Doctor {
        #[command(flatten)]
        engine: EngineOptions,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { manifest, json } => commands::validate::run(&manifest, json),
        Commands::Render {
            manifest,
            engine,
            keep_going,
            summary,
            json,
        } => commands::render::run(
            &manifest,
            &engine,
            keep_going,
            &OutputOptions {
                json,
                summary_path: summary.as_deref(),
            },
        ),
        Commands::RenderAsset {
            asset,
            out,
            engine,
            summary,
            json,
        } => commands::render::run_asset(
            &asset,
            &out,
            &engine,
            &OutputOptions {
                json,
                summary_path: summary.as_deref(),
            },
        ),
        Commands::Doctor { engine } => commands::doctor::run(&engine),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorender_cli::engine::EngineKind;

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::try_parse_from(["autorender", "validate", "assets/manifest.json"]).unwrap();
        match cli.command {
            Commands::Validate { manifest, json } => {
                assert_eq!(manifest, "assets/manifest.json");
                assert!(!json);
            }
            _ => panic!("expected validate command"),
        }
    }

    #[test]
    fn test_cli_parses_render_defaults() {
        let cli = Cli::try_parse_from(["autorender", "render", "manifest.json"]).unwrap();
        match cli.command {
            Commands::Render {
                manifest,
                engine,
                keep_going,
                summary,
                json,
            } => {
                assert_eq!(manifest, "manifest.json");
                assert_eq!(engine.engine, EngineKind::Blender);
                assert_eq!(engine.timeout, None);
                assert!(!keep_going);
                assert!(summary.is_none());
                assert!(!json);
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_parses_render_with_engine_options() {
        let cli = Cli::try_parse_from([
            "autorender",
            "render",
            "manifest.json",
            "--engine",
            "memory",
            "--timeout",
            "120",
            "--keep-going",
            "--summary",
            "build/summary.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                engine,
                keep_going,
                summary,
                ..
            } => {
                assert_eq!(engine.engine, EngineKind::Memory);
                assert_eq!(engine.timeout, Some(120));
                assert!(keep_going);
                assert_eq!(summary.as_deref(), Some("build/summary.json"));
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_engine() {
        assert!(
            Cli::try_parse_from(["autorender", "render", "m.json", "--engine", "cycles"]).is_err()
        );
    }

    #[test]
    fn test_cli_render_asset_requires_out() {
        let err = Cli::try_parse_from(["autorender", "render-asset", "rock.json"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("--out"));

        let cli =
            Cli::try_parse_from(["autorender", "render-asset", "rock.json", "-o", "build"]).unwrap();
        match cli.command {
            Commands::RenderAsset { asset, out, .. } => {
                assert_eq!(asset, "rock.json");
                assert_eq!(out, "build");
            }
            _ => panic!("expected render-asset command"),
        }
    }
}
