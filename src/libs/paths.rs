// Imports the `Colorize` trait for adding color to console output.
use colored::Colorize;
// Provides `PathBuf` for working with file paths.
use std::path::PathBuf;
// Custom logging macros for various log levels.
use crate::{log_debug, log_info};
// Helpers to expand `~` and to locate the application's own directory.
use crate::libs::utilities::path_helpers::{expand_tilde, get_app_dir};

/// Name of the configuration file inside the application directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Determines the absolute path of the configuration file.
///
/// # Arguments
/// * `config_path`: A user-supplied path (from `--config`), possibly starting with `~`.
///
/// # Returns
/// The expanded user path, or `~/.browserautomate/config.yaml` when none was given.
pub fn resolve_config_path(config_path: Option<&str>) -> PathBuf {
    let resolved = match config_path {
        Some(path) => expand_tilde(path),
        None => get_app_dir().join(CONFIG_FILE_NAME),
    };
    log_info!("Using configuration file: {}", resolved.display().to_string().cyan());
    log_debug!("Resolved config_path: {:?}", resolved);
    resolved
}

/// Expands the configured install directory into an absolute path.
pub fn resolve_install_dir(directory: &str) -> PathBuf {
    let resolved = expand_tilde(directory.trim());
    log_debug!("Driver directory resolved to: {}", resolved.display().to_string().yellow());
    resolved
}
