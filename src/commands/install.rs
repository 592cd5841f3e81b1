// This file contains the logic for the `driver-installer install` command.
// It runs the install pipeline in the foreground and prints its progress.

use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::cli::cmd_enums::GlobalOptions;
use crate::commands::load_settings;
use crate::libs::driver_installer::DriverInstaller;
use crate::libs::progress::TerminalSink;
use crate::libs::utilities::misc_utils::human_readable_size;
use crate::{log_debug, log_info};

/// Ensures the configured driver is installed.
///
/// # Arguments
/// * `global`: Shared CLI options (config path and overrides).
/// * `event_id`: Correlation id attached to every progress event.
/// * `verbose`: Also print each extracted entry.
pub fn run(global: &GlobalOptions, event_id: &str, verbose: bool) -> anyhow::Result<()> {
    log_debug!("Entered install::run() function.");
    let (_, settings) = load_settings(global)?;
    let installer = DriverInstaller::new(settings);

    let outcome = installer.install(event_id, &TerminalSink { verbose }, &CancellationToken::new())?;

    log_info!(
        "Installed {} files ({}) from {}{}",
        outcome.entries.files,
        human_readable_size(outcome.entries.bytes),
        outcome.archive.display().to_string().cyan(),
        if outcome.downloaded { "" } else { " (reused)" }
    );
    Ok(())
}
