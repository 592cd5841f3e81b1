use colored::Colorize;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::libs::errors::ConfigError;
use crate::libs::mirrors::default_mirrors;
use crate::libs::paths::resolve_install_dir;
use crate::libs::utilities::platform::PlatformTag;
use crate::schemas::driver::{
    AppConfig, DEFAULT_DRIVER_VERSION, DEFAULT_INSTALL_DIR, DEFAULT_SERVER_ADDRESS, DEFAULT_TIMEOUT_SECS,
    DriverSettings, ToolVersion,
};
use crate::{log_debug, log_warn};

/// Values given on the command line or through the environment.
///
/// Each one, when present, takes precedence over the configuration file.
#[derive(Debug, Default, Clone)]
pub struct SettingsOverrides {
    pub version: Option<String>,
    pub install_dir: Option<String>,
    pub download_host: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Loads the YAML configuration file at `path`.
///
/// A missing file is not an error: every key has a built-in default, so the
/// tool works without any configuration at all.
///
/// # Returns
/// * `Ok(AppConfig)` parsed from the file, or the defaults when it does not exist.
/// * `Err(ConfigError)` when the file exists but cannot be read or parsed.
pub fn load_app_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log_debug!(
                "[Config] No configuration file at {}, using defaults",
                path.display().to_string().yellow()
            );
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    // An empty file is a valid "all defaults" configuration.
    if contents.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let config: AppConfig = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log_debug!("[Config] Loaded {}: {:?}", path.display().to_string().green(), config);
    Ok(config)
}

/// Merges overrides, file values and defaults into the settings for one run.
///
/// Precedence per key: `overrides` > `config` > built-in default. Blank
/// strings count as unset.
pub fn resolve_settings(
    config: &AppConfig,
    overrides: &SettingsOverrides,
    platform: PlatformTag,
) -> Result<DriverSettings, ConfigError> {
    let driver = &config.driver;

    let version = pick(&overrides.version, &driver.version).unwrap_or(DEFAULT_DRIVER_VERSION);
    let directory = pick(&overrides.install_dir, &driver.directory).unwrap_or(DEFAULT_INSTALL_DIR);

    // Passed through as given; a malformed host fails at request time like
    // any other unreachable origin.
    let download_host = pick(&overrides.download_host, &driver.download_host).map(str::to_string);

    let mirrors = match &driver.mirrors {
        Some(mirrors) if !mirrors.is_empty() => mirrors
            .iter()
            .map(|origin| validate_origin(origin))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            log_warn!("[Config] 'driver.mirrors' is empty, using the built-in mirrors");
            default_mirrors()
        }
        None => default_mirrors(),
    };

    let timeout_secs = overrides
        .timeout_secs
        .or(driver.timeout_secs)
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let settings = DriverSettings {
        version: ToolVersion::new(version.trim()),
        install_dir: resolve_install_dir(directory),
        platform,
        download_host,
        mirrors,
        timeout: Duration::from_secs(timeout_secs),
    };
    log_debug!("[Config] Resolved settings: {:?}", settings);
    Ok(settings)
}

/// Address the HTTP server binds to: `cli` > `server.address` > default.
pub fn resolve_server_address(config: &AppConfig, cli: Option<&str>) -> String {
    cli.map(str::trim)
        .filter(|address| !address.is_empty())
        .or_else(|| non_blank(&config.server.address))
        .unwrap_or(DEFAULT_SERVER_ADDRESS)
        .to_string()
}

fn pick<'a>(first: &'a Option<String>, second: &'a Option<String>) -> Option<&'a str> {
    non_blank(first).or_else(|| non_blank(second))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Accepts only absolute `http://` or `https://` origins for `driver.mirrors`.
fn validate_origin(origin: &str) -> Result<String, ConfigError> {
    let origin = origin.trim();
    let rest = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"));
    match rest {
        Some(host) if !host.trim_matches('/').is_empty() => Ok(origin.to_string()),
        _ => Err(ConfigError::InvalidOrigin(origin.to_string())),
    }
}
