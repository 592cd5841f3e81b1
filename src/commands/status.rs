// This file contains the logic for the `driver-installer status` command.
// It probes the install directory and compares the installed driver with the
// required version.

use colored::Colorize;

use crate::cli::cmd_enums::GlobalOptions;
use crate::commands::load_settings;
use crate::libs::version_probe::{SystemCommandRunner, report};
use crate::log_debug;

/// Prints the installed and required versions.
///
/// # Arguments
/// * `global`: Shared CLI options (config path and overrides).
/// * `json`: Print the same JSON document `GET /driver` serves.
///
/// # Returns
/// An error when the probe itself failed, so the process exits non-zero.
pub fn run(global: &GlobalOptions, json: bool) -> anyhow::Result<()> {
    log_debug!("Entered status::run() function.");
    let (_, settings) = load_settings(global)?;
    let report = report(&settings.install_dir, &settings.version, &SystemCommandRunner);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{:<18} {}", "Install directory:".bold(), settings.install_dir.display());
        println!("{:<18} {}", "Required version:".bold(), report.required_version.cyan());
        let current = if report.is_installed() {
            if report.is_up_to_date() {
                report.current_version.green()
            } else {
                report.current_version.yellow()
            }
        } else {
            "not installed".dimmed()
        };
        println!("{:<18} {}", "Current version:".bold(), current);
    }

    if !report.error.is_empty() {
        anyhow::bail!("{}", report.error);
    }
    Ok(())
}
