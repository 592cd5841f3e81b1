// Register application subcommands.
// Each module corresponds to a specific `driver-installer` command-line action.

use anyhow::Context;

use crate::cli::cmd_enums::GlobalOptions;
use crate::libs::config_loading::{load_app_config, resolve_settings};
use crate::libs::paths::resolve_config_path;
use crate::libs::utilities::platform::PlatformTag;
use crate::schemas::driver::{AppConfig, DriverSettings};

// Downloads and extracts the driver into the install directory.
pub mod install;
// Serves the HTTP routes.
pub mod serve;
// Reports installed vs. required driver version.
pub mod status;
// Displays the version of driver-installer
pub mod version;

/// Loads the configuration file and resolves the settings for this run.
pub(crate) fn load_settings(global: &GlobalOptions) -> anyhow::Result<(AppConfig, DriverSettings)> {
    let config_path = resolve_config_path(global.config.as_deref());
    let config = load_app_config(&config_path)?;
    let settings = resolve_settings(&config, &global.overrides(), PlatformTag::detect())
        .with_context(|| format!("resolving settings from {}", config_path.display()))?;
    Ok((config, settings))
}
