//! # Driver Installer
//!
//! Composes mirror resolution, download and extraction into a single
//! "ensure the driver is installed" operation:
//!
//! 1. **Validate** the caller's event id.
//! 2. **Ensure** the install directory exists.
//! 3. **Lock** the directory against concurrent installs in this process.
//! 4. **Check** for a retained, non-empty archive and reuse it.
//! 5. **Download** the archive from the first available origin otherwise.
//! 6. **Extract** the archive over the install directory.
//!
//! Every step reports through the injected [`ProgressSink`]. A failing step
//! ends the run, and its error is reported exactly once as an `error` event
//! before being returned. Running the installer again is always safe.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::libs::errors::InstallError;
use crate::libs::install_lock::InstallLock;
use crate::libs::mirrors::{artifact_name, candidate_urls};
use crate::libs::progress::{ProgressSink, Reporter};
use crate::libs::utilities::assets::{HttpClient, UreqClient, download_with_failover};
use crate::libs::utilities::compression::{ExtractSummary, extract};
use crate::libs::utilities::misc_utils::human_readable_size;
use crate::libs::utilities::platform::PlatformTag;
use crate::schemas::driver::DriverSettings;
use crate::{log_debug, log_error, log_info, log_warn};

/// Result of a successful install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// The retained archive the tree was extracted from.
    pub archive: PathBuf,
    /// False when an existing archive was reused.
    pub downloaded: bool,
    pub entries: ExtractSummary,
}

/// Installs the configured driver version into the configured directory.
pub struct DriverInstaller {
    settings: DriverSettings,
    client: Arc<dyn HttpClient>,
}

impl DriverInstaller {
    /// Creates an installer that downloads with a [`UreqClient`] bounded by `settings.timeout`.
    pub fn new(settings: DriverSettings) -> Self {
        let client = Arc::new(UreqClient::new(settings.timeout));
        Self::with_client(settings, client)
    }

    pub fn with_client(settings: DriverSettings, client: Arc<dyn HttpClient>) -> Self {
        if settings.platform == PlatformTag::Unknown {
            log_warn!(
                "[Installer] No driver bundle is published for this platform; downloads are expected to fail"
            );
        }
        Self { settings, client }
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Where the downloaded bundle is retained inside the install directory.
    pub fn archive_path(&self) -> PathBuf {
        self.settings
            .install_dir
            .join(artifact_name(&self.settings.version, self.settings.platform))
    }

    /// Creates the install directory and any missing parents.
    pub fn ensure_install_dir(&self) -> Result<(), InstallError> {
        let dir = &self.settings.install_dir;
        fs::create_dir_all(dir).map_err(|source| InstallError::CreateDirectory {
            path: dir.clone(),
            source,
        })
    }

    /// Ensures the driver is installed, reporting progress to `sink` under `event_id`.
    ///
    /// An empty or whitespace-only `event_id` is rejected before anything on
    /// disk is touched; that error is reported with an empty id.
    ///
    /// # Returns
    /// * `Ok(InstallOutcome)` once the archive has been fully extracted.
    /// * `Err(InstallError)` for the first failing step. It has already been
    ///   emitted to `sink` as the run's single `error` event.
    pub fn install(
        &self,
        event_id: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<InstallOutcome, InstallError> {
        if event_id.trim().is_empty() {
            let err = InstallError::MissingEventId;
            log_error!("[Installer] {}", err);
            Reporter::new("", sink).error(err.to_string());
            return Err(err);
        }

        let reporter = Reporter::new(event_id, sink);
        log_info!(
            "[Installer] Ensuring {} {} in {} (event {})",
            crate::schemas::driver::TOOL_NAME,
            self.settings.version.to_string().bold(),
            self.settings.install_dir.display().to_string().cyan(),
            event_id
        );

        self.run(reporter, cancel).inspect_err(|err| {
            log_error!("[Installer] Install failed: {}", err.to_string().red());
            reporter.error(err.to_string());
        })
    }

    fn run(&self, reporter: Reporter<'_>, cancel: &CancellationToken) -> Result<InstallOutcome, InstallError> {
        let dir = &self.settings.install_dir;
        self.ensure_install_dir()?;
        let _lock = InstallLock::acquire(dir)?;

        let archive = self.archive_path();
        let downloaded = if needs_download(&archive, reporter)? {
            let candidates = candidate_urls(
                &self.settings.version,
                self.settings.platform,
                self.settings.download_host.as_deref(),
                &self.settings.mirrors,
            );
            let artifact = artifact_name(&self.settings.version, self.settings.platform);
            download_with_failover(self.client.as_ref(), &candidates, &artifact, &archive, reporter, cancel)?;
            true
        } else {
            false
        };

        let entries = extract(&archive, dir, self.settings.platform, reporter, cancel)?;
        log_info!(
            "[Installer] {} is ready in {}",
            crate::schemas::driver::TOOL_NAME,
            dir.display().to_string().green()
        );
        Ok(InstallOutcome {
            archive,
            downloaded,
            entries,
        })
    }
}

/// A retained archive is reused only when it exists and is non-empty.
fn needs_download(archive: &Path, reporter: Reporter<'_>) -> Result<bool, InstallError> {
    match fs::metadata(archive) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log_debug!("[Installer] No archive at {}", archive.display());
            Ok(true)
        }
        Err(source) => Err(InstallError::Stat {
            path: archive.to_path_buf(),
            source,
        }),
        Ok(metadata) if metadata.len() == 0 => {
            log_debug!("[Installer] Archive {} is empty, downloading again", archive.display());
            Ok(true)
        }
        Ok(metadata) => {
            reporter.info(format!(
                "using existing archive {} ({})",
                archive.display(),
                human_readable_size(metadata.len())
            ));
            Ok(false)
        }
    }
}
