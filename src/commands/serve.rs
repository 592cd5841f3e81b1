// This file contains the logic for the `driver-installer serve` command.
// It starts the HTTP server on a Tokio runtime owned by this command.

use std::sync::Arc;

use crate::cli::cmd_enums::GlobalOptions;
use crate::commands::load_settings;
use crate::libs::config_loading::resolve_server_address;
use crate::libs::driver_installer::DriverInstaller;
use crate::libs::version_probe::SystemCommandRunner;
use crate::log_debug;
use crate::server::{self, AppState};

/// Serves `/driver` and `/installdriver` until interrupted.
///
/// # Arguments
/// * `global`: Shared CLI options (config path and overrides).
/// * `address`: Bind address; falls back to `server.address`, then `127.0.0.1:9246`.
pub fn run(global: &GlobalOptions, address: Option<&str>) -> anyhow::Result<()> {
    log_debug!("Entered serve::run() function.");
    let (config, settings) = load_settings(global)?;
    let address = resolve_server_address(&config, address);
    let state = Arc::new(AppState::new(
        DriverInstaller::new(settings),
        Arc::new(SystemCommandRunner),
    ));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(&address, state))
}
