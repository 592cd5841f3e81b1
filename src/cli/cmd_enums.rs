use clap::{Args, Parser, Subcommand};

use crate::libs::config_loading::SettingsOverrides;
use crate::libs::mirrors::DOWNLOAD_HOST_ENV;

/// Defines the command-line interface (CLI) for 'driver-installer'.
/// `#[derive(Parser)]` automatically generates argument parsing code via `clap`.
#[derive(Parser, Debug)]
#[command(name = "driver-installer")]
#[command(about = "Fetch, install and serve the Playwright driver bundle", long_about = None)]
pub struct Cli {
    /// Enables detailed debug output for troubleshooting and development.
    #[arg(short, long, global = true)]
    pub(crate) debug: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub(crate) global: GlobalOptions,

    /// Defines available subcommands for 'driver-installer'.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Settings that can override the configuration file for any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Path to the configuration file (defaults to ~/.browserautomate/config.yaml).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Directory the driver is installed into.
    #[arg(long, global = true)]
    pub install_dir: Option<String>,

    /// Driver version to require and install.
    #[arg(long, global = true)]
    pub driver_version: Option<String>,

    /// Single origin to download from, replacing the built-in mirrors.
    #[arg(long, global = true, env = DOWNLOAD_HOST_ENV)]
    pub download_host: Option<String>,

    /// Per-request download timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

impl GlobalOptions {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            version: self.driver_version.clone(),
            install_dir: self.install_dir.clone(),
            download_host: self.download_host.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Enumerates all supported subcommands with their specific arguments and options.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the installed and required driver versions.
    Status {
        /// Print the report as JSON, as served by `GET /driver`.
        #[arg(long)]
        json: bool,
    },
    /// Download (if needed) and extract the driver into the install directory.
    Install {
        /// Correlation id attached to every progress line.
        #[arg(long, default_value = "cli")]
        event_id: String,
        /// Also print every extracted archive entry.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Serve the `/driver` and `/installdriver` HTTP routes.
    Serve {
        /// Address to bind, e.g. 127.0.0.1:9246.
        #[arg(long)]
        address: Option<String>,
    },
    /// Show the current Version of the tool.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_defaults_event_id() {
        let cli = Cli::try_parse_from(["driver-installer", "install"]).unwrap();
        match cli.command {
            Commands::Install { event_id, verbose } => {
                assert_eq!(event_id, "cli");
                assert!(!verbose);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "driver-installer",
            "status",
            "--json",
            "--install-dir",
            "/opt/pw",
            "--driver-version",
            "1.50.0",
            "--timeout-secs",
            "9",
            "--debug",
        ])
        .unwrap();
        assert!(cli.debug);
        let overrides = cli.global.overrides();
        assert_eq!(overrides.install_dir.as_deref(), Some("/opt/pw"));
        assert_eq!(overrides.version.as_deref(), Some("1.50.0"));
        assert_eq!(overrides.timeout_secs, Some(9));
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }
}
