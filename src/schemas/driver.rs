// Defines the configuration file layout and the resolved settings the driver
// pipeline runs with.
// Serde traits for reading the YAML config file and rendering settings.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::libs::utilities::platform::PlatformTag;

/// Name of the packaged tool, used as the artifact filename prefix.
pub const TOOL_NAME: &str = "playwright";

/// Driver version installed when neither the CLI nor the config file names one.
pub const DEFAULT_DRIVER_VERSION: &str = "1.49.1";

/// Install directory used when neither the CLI nor the config file names one.
pub const DEFAULT_INSTALL_DIR: &str = "~/browserautomate/playwrightdriver";

/// Per-request HTTP timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Address the HTTP surface binds to by default.
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:9246";

/// The driver build a run targets, e.g. `1.49.1` or `1.50.0-beta-1732210972000`.
///
/// Immutable once read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolVersion(String);

impl ToolVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Pre-release builds live under the `next/` path on the CDN.
    ///
    /// This is a case-sensitive substring check, not semver parsing: any
    /// version whose text contains `alpha`, `beta` or `next` anywhere counts.
    pub fn is_prerelease(&self) -> bool {
        ["alpha", "beta", "next"]
            .iter()
            .any(|marker| self.0.contains(marker))
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Top-level layout of the optional YAML configuration file.
///
/// ```yaml
/// driver:
///   version: 1.49.1
///   directory: ~/browserautomate/playwrightdriver
///   download_host: https://mirror.internal.example
///   timeout_secs: 300
/// server:
///   address: 127.0.0.1:9246
/// ```
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub driver: DriverSection,
    pub server: ServerSection,
}

/// The `driver:` block. Every key is optional; missing keys fall back to defaults.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverSection {
    pub version: Option<String>,
    pub directory: Option<String>,
    /// Single origin that replaces the mirror list entirely.
    pub download_host: Option<String>,
    /// Replacement for the built-in mirror list, in priority order.
    pub mirrors: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

/// The `server:` block.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub address: Option<String>,
}

/// Fully resolved settings for one process run.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub version: ToolVersion,
    pub install_dir: PathBuf,
    pub platform: PlatformTag,
    /// Override origin; when set it is the only download candidate.
    pub download_host: Option<String>,
    /// Default mirrors, tried in order when no override is set.
    pub mirrors: Vec<String>,
    pub timeout: Duration,
}
