//! # Version Probe
//!
//! Read-only inspection of an install directory. A driver counts as
//! installed when its entry script `package/cli.js` is a regular file; the
//! installed version is whatever the bundled interpreter prints for
//! `cli.js --version`.
//!
//! Absence is reported as [`DriverState::NotInstalled`], never as an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use colored::Colorize;
use serde::Serialize;

use crate::libs::errors::{ProbeError, RunError};
use crate::schemas::driver::ToolVersion;
use crate::{log_debug, log_warn};

/// Runs an external program and returns its stdout.
///
/// Abstracted so tests can fake the driver without a real Node runtime.
pub trait CommandRunner: Send + Sync {
    fn output(&self, program: &Path, args: &[&str]) -> Result<String, RunError>;
}

/// Runs programs with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn output(&self, program: &Path, args: &[&str]) -> Result<String, RunError> {
        log_debug!("[Probe] Running {} {}", program.display().to_string().blue(), args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| RunError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;
        if !output.status.success() {
            return Err(RunError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// What the probe found in the install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverState {
    NotInstalled,
    Installed { version: String },
}

/// Entry script whose presence marks a complete install.
pub fn marker_path(install_dir: &Path) -> PathBuf {
    install_dir.join("package").join("cli.js")
}

/// The interpreter shipped inside the driver bundle.
pub fn node_path(install_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        install_dir.join("node.exe")
    } else {
        install_dir.join("node")
    }
}

/// Determines whether a driver is installed in `install_dir` and which version.
pub fn probe(install_dir: &Path, runner: &dyn CommandRunner) -> Result<DriverState, ProbeError> {
    let marker = marker_path(install_dir);
    let metadata = match fs::metadata(&marker) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log_debug!("[Probe] No driver at {}", marker.display());
            return Ok(DriverState::NotInstalled);
        }
        Err(source) => return Err(ProbeError::Stat { path: marker, source }),
    };
    if metadata.is_dir() {
        log_debug!("[Probe] {} is a directory, treating as not installed", marker.display());
        return Ok(DriverState::NotInstalled);
    }

    let marker_arg = marker.to_string_lossy();
    let stdout = runner.output(&node_path(install_dir), &[marker_arg.as_ref(), "--version"])?;
    Ok(DriverState::Installed {
        version: stdout.trim_end().to_string(),
    })
}

/// Installed vs. required version, as served by `GET /driver`.
///
/// `current_version` is empty when nothing is installed; `error` is empty
/// unless probing itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionReport {
    pub current_version: String,
    pub required_version: String,
    pub error: String,
}

impl VersionReport {
    /// True when the installed version matches the required one.
    ///
    /// The driver prints `Version 1.49.1`, so only the last token is compared.
    pub fn is_up_to_date(&self) -> bool {
        let Some(installed) = self.current_version.split_whitespace().last() else {
            return false;
        };
        match (
            semver::Version::parse(installed),
            semver::Version::parse(self.required_version.trim()),
        ) {
            (Ok(installed), Ok(required)) => installed == required,
            _ => installed == self.required_version.trim(),
        }
    }

    pub fn is_installed(&self) -> bool {
        !self.current_version.is_empty()
    }
}

/// Probes `install_dir` and folds the outcome into a [`VersionReport`].
pub fn report(install_dir: &Path, required: &ToolVersion, runner: &dyn CommandRunner) -> VersionReport {
    let mut report = VersionReport {
        current_version: String::new(),
        required_version: required.to_string(),
        error: String::new(),
    };
    match probe(install_dir, runner) {
        Ok(DriverState::NotInstalled) => {}
        Ok(DriverState::Installed { version }) => report.current_version = version,
        Err(err) => {
            log_warn!("[Probe] {}", err);
            report.error = err.to_string();
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed result and records invocations.
    struct FakeRunner {
        result: fn() -> Result<String, RunError>,
        calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    }

    impl FakeRunner {
        fn new(result: fn() -> Result<String, RunError>) -> Self {
            Self {
                result,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for FakeRunner {
        fn output(&self, program: &Path, args: &[&str]) -> Result<String, RunError> {
            self.calls.lock().unwrap().push((
                program.to_path_buf(),
                args.iter().map(|arg| arg.to_string()).collect(),
            ));
            (self.result)()
        }
    }

    fn prints_version() -> Result<String, RunError> {
        Ok("Version 1.49.1\n".to_string())
    }

    fn spawn_fails() -> Result<String, RunError> {
        Err(RunError::Spawn {
            program: PathBuf::from("node"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        })
    }

    fn install_marker(dir: &Path) {
        fs::create_dir_all(dir.join("package")).unwrap();
        fs::write(marker_path(dir), b"// cli").unwrap();
    }

    #[test]
    fn test_missing_marker_is_not_installed() {
        let temp = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(prints_version);

        for required in ["1.49.1", "1.50.0-next", ""] {
            let report = report(temp.path(), &ToolVersion::new(required), &runner);
            assert_eq!(report.current_version, "");
            assert_eq!(report.error, "");
            assert_eq!(report.required_version, required);
        }
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_missing_install_dir_is_not_installed() {
        let temp = tempfile::tempdir().unwrap();
        let state = probe(&temp.path().join("nope"), &FakeRunner::new(prints_version)).unwrap();
        assert_eq!(state, DriverState::NotInstalled);
    }

    #[test]
    fn test_marker_directory_is_not_installed() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(marker_path(temp.path())).unwrap();

        let state = probe(temp.path(), &FakeRunner::new(prints_version)).unwrap();
        assert_eq!(state, DriverState::NotInstalled);
    }

    #[test]
    fn test_installed_driver_reports_trimmed_version() {
        let temp = tempfile::tempdir().unwrap();
        install_marker(temp.path());
        let runner = FakeRunner::new(prints_version);

        let report = report(temp.path(), &ToolVersion::new("1.49.1"), &runner);

        assert_eq!(report.current_version, "Version 1.49.1");
        assert_eq!(report.error, "");
        assert!(report.is_up_to_date());

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, node_path(temp.path()));
        assert_eq!(
            calls[0].1,
            vec![marker_path(temp.path()).to_string_lossy().into_owned(), "--version".to_string()]
        );
    }

    #[test]
    fn test_spawn_failure_is_reported_as_error() {
        let temp = tempfile::tempdir().unwrap();
        install_marker(temp.path());

        let err = probe(temp.path(), &FakeRunner::new(spawn_fails)).unwrap_err();
        assert!(matches!(err, ProbeError::Run(RunError::Spawn { .. })));

        let report = report(temp.path(), &ToolVersion::new("1.49.1"), &FakeRunner::new(spawn_fails));
        assert!(report.error.starts_with("could not run tool: "));
        assert_eq!(report.current_version, "");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_separates_spawn_and_exit_failures() {
        let runner = SystemCommandRunner;

        let err = runner.output(Path::new("/definitely/not/a/program"), &[]).unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));

        let err = runner.output(Path::new("/bin/sh"), &["-c", "echo broken >&2; exit 3"]).unwrap_err();
        match err {
            RunError::Exit { status, stderr } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let out = runner.output(Path::new("/bin/sh"), &["-c", "echo 1.49.1"]).unwrap();
        assert_eq!(out, "1.49.1\n");
    }

    #[test]
    fn test_up_to_date_comparison() {
        let report = |current: &str, required: &str| VersionReport {
            current_version: current.to_string(),
            required_version: required.to_string(),
            error: String::new(),
        };
        assert!(report("Version 1.49.1", "1.49.1").is_up_to_date());
        assert!(report("1.49.1", "1.49.1").is_up_to_date());
        assert!(!report("Version 1.48.0", "1.49.1").is_up_to_date());
        assert!(!report("", "1.49.1").is_up_to_date());
        assert!(report("Version 1.50.0-beta-1", "1.50.0-beta-1").is_up_to_date());
        assert!(report("Version dev", "dev").is_up_to_date());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = VersionReport {
            current_version: "Version 1.49.1".to_string(),
            required_version: "1.49.1".to_string(),
            error: String::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "currentVersion": "Version 1.49.1",
                "requiredVersion": "1.49.1",
                "error": "",
            })
        );
    }
}
