//! Blender subprocess orchestrator.
//!
//! Each engine command runs in its own Blender process against a scene file.
//! The command goes in as a JSON file and the result comes back as a JSON
//! report written by the Python entrypoint.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::engine::EngineReport;
use crate::error::{EngineError, EngineResult};

const EMBEDDED_ENTRYPOINT_PY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../blender/entrypoint.py"
));

/// Environment variable overriding the entrypoint script.
pub const ENTRYPOINT_ENV: &str = "AUTORENDER_BLENDER_ENTRYPOINT";

/// Configuration for the Blender orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Path to the Blender executable.
    pub blender_path: Option<PathBuf>,
    /// Path to the Python entrypoint script.
    pub entrypoint_path: PathBuf,
    /// Per-command timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Whether to capture Blender's stderr.
    pub capture_output: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            blender_path: None,
            entrypoint_path: PathBuf::from("blender/entrypoint.py"),
            timeout: None,
            capture_output: true,
        }
    }
}

impl OrchestratorConfig {
    /// Creates a new config with the given entrypoint path.
    pub fn with_entrypoint(entrypoint_path: impl Into<PathBuf>) -> Self {
        Self {
            entrypoint_path: entrypoint_path.into(),
            ..Default::default()
        }
    }

    /// Sets the Blender executable path.
    pub fn blender_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.blender_path = Some(path.into());
        self
    }

    /// Sets the timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }
}

/// The Blender subprocess orchestrator.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: OrchestratorConfig,
}

struct ResolvedEntrypoint {
    path: PathBuf,
    _tempfile: Option<tempfile::NamedTempFile>,
}

impl Orchestrator {
    /// Creates a new orchestrator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new orchestrator with the given configuration.
    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Finds the Blender executable path.
    pub fn find_blender(&self) -> EngineResult<PathBuf> {
        // Check config override first
        if let Some(ref path) = self.config.blender_path {
            if path.exists() {
                return Ok(path.clone());
            }
        }

        if let Ok(path) = std::env::var("BLENDER_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
        }

        let blender_names = if cfg!(windows) {
            vec!["blender.exe", "blender"]
        } else {
            vec!["blender"]
        };

        for name in blender_names {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        let common_paths = if cfg!(windows) {
            vec![
                "C:\\Program Files\\Blender Foundation\\Blender 4.2\\blender.exe",
                "C:\\Program Files\\Blender Foundation\\Blender 4.1\\blender.exe",
                "C:\\Program Files\\Blender Foundation\\Blender\\blender.exe",
            ]
        } else if cfg!(target_os = "macos") {
            vec![
                "/Applications/Blender.app/Contents/MacOS/Blender",
                "/Applications/Blender.app/Contents/MacOS/blender",
            ]
        } else {
            vec![
                "/usr/bin/blender",
                "/usr/local/bin/blender",
                "/snap/bin/blender",
            ]
        };

        for path_str in common_paths {
            let path = PathBuf::from(path_str);
            if path.exists() {
                return Ok(path);
            }
        }

        Err(EngineError::BlenderNotFound)
    }

    fn resolve_entrypoint(&self) -> EngineResult<ResolvedEntrypoint> {
        if self.config.entrypoint_path.exists() {
            return Ok(ResolvedEntrypoint {
                path: self.config.entrypoint_path.clone(),
                _tempfile: None,
            });
        }

        if let Ok(path) = std::env::var(ENTRYPOINT_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(ResolvedEntrypoint {
                    path,
                    _tempfile: None,
                });
            }
            return Err(EngineError::EntrypointNotFound { path });
        }

        // Last resort: write embedded entrypoint to a temp file.
        let mut file = tempfile::Builder::new()
            .prefix("autorender_blender_entrypoint_")
            .suffix(".py")
            .tempfile()?;
        file.write_all(EMBEDDED_ENTRYPOINT_PY.as_bytes())?;
        file.flush()?;

        Ok(ResolvedEntrypoint {
            path: file.path().to_path_buf(),
            _tempfile: Some(file),
        })
    }

    /// Runs one command file against `scene`.
    ///
    /// `label` names the command in errors.
    pub fn run(
        &self,
        scene: &Path,
        command_path: &Path,
        report_path: &Path,
        label: &str,
    ) -> EngineResult<EngineReport> {
        let blender_path = self.find_blender()?;
        let entrypoint = self.resolve_entrypoint()?;

        // blender --background --factory-startup <scene> --python entrypoint.py -- --command <path> --report <path>
        let mut cmd = Command::new(&blender_path);
        cmd.arg("--background")
            .arg("--factory-startup")
            .arg(scene)
            .arg("--python")
            .arg(&entrypoint.path)
            .arg("--")
            .arg("--command")
            .arg(command_path)
            .arg("--report")
            .arg(report_path);

        if self.config.capture_output {
            cmd.stdout(Stdio::null()).stderr(Stdio::piped());
        }

        log::debug!("running blender command '{}' on {}", label, scene.display());
        let child = cmd.spawn().map_err(EngineError::SpawnFailed)?;

        let (status, stderr) =
            wait_with_timeout(child, self.config.timeout, self.config.capture_output)?;

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            return Err(EngineError::process_failed(exit_code, stderr));
        }

        let report_content =
            std::fs::read_to_string(report_path).map_err(|e| EngineError::ReadReportFailed {
                path: report_path.to_path_buf(),
                source: e,
            })?;

        let report: EngineReport =
            serde_json::from_str(&report_content).map_err(EngineError::ParseReportFailed)?;

        if !report.ok {
            return Err(EngineError::command_failed(
                label,
                report.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(report)
    }

    /// Runs a command given as a JSON string, using temporary files for the
    /// command and the report.
    pub fn run_json(
        &self,
        scene: &Path,
        command_json: &str,
        label: &str,
    ) -> EngineResult<EngineReport> {
        let temp_dir = tempfile::tempdir()?;
        let command_path = temp_dir.path().join("command.json");
        let report_path = temp_dir.path().join("report.json");

        std::fs::write(&command_path, command_json).map_err(EngineError::WriteCommandFailed)?;

        self.run(scene, &command_path, &report_path, label)
    }
}

fn wait_with_timeout(
    mut child: Child,
    timeout: Option<Duration>,
    capture_output: bool,
) -> EngineResult<(ExitStatus, String)> {
    let start = Instant::now();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if let Some(timeout) = timeout {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(EngineError::Timeout {
                            timeout_secs: timeout.as_secs(),
                        });
                    }
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(EngineError::SpawnFailed(e)),
        }
    };

    let stderr = if capture_output {
        let mut buf = String::new();
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut buf);
        }
        buf
    } else {
        String::new()
    };

    Ok((status, stderr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", script]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", script]);
            cmd
        }
    }

    #[test]
    fn test_config_builder() {
        let config = OrchestratorConfig::with_entrypoint("custom/path.py")
            .blender_path("/usr/bin/blender")
            .timeout_secs(600);

        assert_eq!(config.entrypoint_path, PathBuf::from("custom/path.py"));
        assert_eq!(config.blender_path, Some(PathBuf::from("/usr/bin/blender")));
        assert_eq!(config.timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_no_timeout_by_default() {
        assert_eq!(OrchestratorConfig::default().timeout, None);
    }

    #[test]
    fn test_wait_with_timeout_captures_stderr() {
        let mut cmd = shell("echo hello 1>&2");
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let child = cmd.spawn().unwrap();

        let (status, stderr) = wait_with_timeout(child, None, true).unwrap();
        assert!(status.success());
        assert!(stderr.to_lowercase().contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_with_timeout_kills_slow_process() {
        let child = shell("sleep 5").spawn().unwrap();
        let err = wait_with_timeout(child, Some(Duration::from_millis(200)), false).unwrap_err();
        assert!(matches!(err, EngineError::Timeout { .. }));
    }

    #[test]
    fn test_resolve_entrypoint_falls_back_to_embedded() {
        if std::env::var_os(ENTRYPOINT_ENV).is_some() {
            eprintln!("{} is set; skipping embedded entrypoint test", ENTRYPOINT_ENV);
            return;
        }

        let config = OrchestratorConfig::with_entrypoint("this/does/not/exist.py");
        let orchestrator = Orchestrator::with_config(config);

        let entrypoint = orchestrator.resolve_entrypoint().unwrap();
        assert!(entrypoint.path.exists());

        let content = std::fs::read_to_string(&entrypoint.path).unwrap();
        assert!(content.contains("Autorender Blender Entrypoint"));
    }
}
