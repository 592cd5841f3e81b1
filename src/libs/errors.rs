//! Error types for the driver pipeline.
//!
//! Every terminal variant names the path or URL involved along with the
//! underlying cause, because its `Display` output is exactly what reaches
//! the user as the single `error` progress event of a failed run.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Terminal failures of an install run.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("missing eventID")]
    MissingEventId,

    #[error("an install is already in progress for {}", .dir.display())]
    Busy { dir: PathBuf },

    #[error("creating directory {}: {source}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("fetching file info for {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to download {artifact} from all origins")]
    AllOriginsFailed { artifact: String },

    #[error("opening file for writing {}: {source}", .path.display())]
    OpenForWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("downloading to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("downloading from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("saving to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("opening file for reading {}: {source}", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading archive {}: {source}", .path.display())]
    ReadArchive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported archive format for {}", .path.display())]
    UnsupportedArchive { path: PathBuf },

    #[error("archive entry {name} escapes the destination directory")]
    UnsafeEntry { name: String },

    #[error("creating folder {}: {source}", .path.display())]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unzipping {name}: {source}")]
    Extract {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("closing {}: {source}", .path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("making file executable {}: {source}", .path.display())]
    MakeExecutable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("install cancelled")]
    Cancelled,
}

/// Failures while inspecting the installed driver.
///
/// "Not installed" is not an error; see `DriverState::NotInstalled`.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("fetching file info for {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not run tool: {0}")]
    Run(#[from] RunError),
}

/// Failures of the `--version` subprocess.
///
/// Spawn failures and non-zero exits are kept apart so callers can tell a
/// missing interpreter from a broken install.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("spawning {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{status}{}", stderr_suffix(.stderr))]
    Exit { status: ExitStatus, stderr: String },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Failures of a single HTTP request before any response status is known.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("{0}")]
    Transport(String),

    #[error("reading response: {0}")]
    Io(#[from] io::Error),
}

/// Failures while loading the YAML configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid download origin '{0}': expected an http:// or https:// URL")]
    InvalidOrigin(String),
}
