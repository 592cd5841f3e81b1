//! # Downloader
//!
//! Fetches the driver bundle from an ordered list of candidate URLs.
//!
//! - Candidates are tried strictly in order; the first `200 OK` wins.
//! - A request error, timeout or non-200 status on one candidate is reported
//!   as an `info` event and the next candidate is tried.
//! - The body is streamed through a fixed 32 KiB buffer into a temporary
//!   file beside the destination. After every chunk is written a
//!   `downloading` event carries the cumulative byte count.
//! - Only a fully written body is renamed onto the destination path, so a
//!   failed download never leaves a partial archive behind.
//! - Once streaming has begun, a read error is terminal; there is no
//!   fallback to the remaining candidates.

// For working with file paths.
use std::path::{Path, PathBuf};
// For reading response bodies and writing the archive.
use std::io::{self, Read, Write};
use std::time::Duration;

// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::libs::errors::{HttpError, InstallError};
use crate::libs::progress::Reporter;
use crate::libs::utilities::misc_utils::human_readable_size;
use crate::schemas::progress::EventCategory;
use crate::{log_debug, log_info, log_warn};

/// Size of the copy buffer; memory use is independent of the artifact size.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// A response whose status line has been received and whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    /// The URL that finally answered, after redirects.
    pub url: String,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

/// The HTTP capability the downloader needs: a GET with a streaming body.
///
/// Any status code is an `Ok` response; `Err` is reserved for failures where
/// no status was received (DNS, connect, TLS, timeout, malformed URL).
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

/// [`HttpClient`] backed by a blocking `ureq` agent.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Builds a client whose requests, body reads included, give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("driver-installer/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        log_debug!("[Downloader] GET {}", url.blue());
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            // ureq reports 4xx/5xx as errors; for us they are ordinary responses.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(HttpError::Transport(transport.to_string()));
            }
        };

        let content_length = response
            .header("Content-Length")
            .and_then(|value| value.trim().parse::<u64>().ok());
        Ok(HttpResponse {
            status: response.status(),
            status_text: response.status_text().to_string(),
            url: response.get_url().to_string(),
            content_length,
            body: response.into_reader(),
        })
    }
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// The candidate that served the body.
    pub url: String,
    pub bytes: u64,
    pub path: PathBuf,
}

/// Downloads the first available candidate to `dest`.
///
/// # Arguments
/// * `client` - HTTP capability used for every candidate.
/// * `candidates` - Absolute URLs, highest priority first.
/// * `artifact` - Bundle filename, used to name the failure when every candidate is exhausted.
/// * `dest` - Final archive path. Its parent directory must exist.
/// * `reporter` - Progress events for this install run.
/// * `cancel` - Checked between candidates and between chunks.
///
/// # Returns
/// * `Ok(DownloadOutcome)` once the archive has been persisted at `dest`.
/// * `Err(InstallError::AllOriginsFailed)` if no candidate answered `200 OK`.
/// * Any other `Err` is a terminal I/O failure while streaming.
pub fn download_with_failover(
    client: &dyn HttpClient,
    candidates: &[String],
    artifact: &str,
    dest: &Path,
    reporter: Reporter<'_>,
    cancel: &CancellationToken,
) -> Result<DownloadOutcome, InstallError> {
    let response = open_first_available(client, candidates, reporter, cancel)?.ok_or_else(|| {
        InstallError::AllOriginsFailed {
            artifact: artifact.to_string(),
        }
    })?;

    log_info!("[Downloader] Downloading from {}", response.url.blue());
    reporter.info(format!("downloading from {}", response.url));
    stream_to_file(response, dest, reporter, cancel)
}

/// Walks the candidates in order and returns the first `200 OK` response.
///
/// Every failed candidate produces exactly one `info` event.
fn open_first_available(
    client: &dyn HttpClient,
    candidates: &[String],
    reporter: Reporter<'_>,
    cancel: &CancellationToken,
) -> Result<Option<HttpResponse>, InstallError> {
    for url in candidates {
        if cancel.is_cancelled() {
            return Err(InstallError::Cancelled);
        }
        reporter.info(format!("attempting to download from {url}"));

        match client.get(url) {
            Err(err) => {
                log_warn!("[Downloader] GET {} failed: {}", url.yellow(), err);
                reporter.info(format!("GET {url}: {err}"));
            }
            Ok(response) if response.status != 200 => {
                log_warn!(
                    "[Downloader] GET {} answered {} {}",
                    url.yellow(),
                    response.status,
                    response.status_text
                );
                reporter.info(format!(
                    "GET {url}: non 200 status code {} ({})",
                    response.status, response.status_text
                ));
            }
            Ok(response) => return Ok(Some(response)),
        }
    }
    Ok(None)
}

/// Copies the body chunk by chunk into a temp file, then renames it onto `dest`.
///
/// Each chunk is written before its `downloading` event is emitted and
/// before the next chunk is read. Dropping the temp file on any early return
/// deletes it.
fn stream_to_file(
    mut response: HttpResponse,
    dest: &Path,
    reporter: Reporter<'_>,
    cancel: &CancellationToken,
) -> Result<DownloadOutcome, InstallError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|source| InstallError::OpenForWrite {
            path: dest.to_path_buf(),
            source,
        })?;

    if let Some(total) = response.content_length {
        log_debug!("[Downloader] Expecting {} ({} bytes)", human_readable_size(total), total);
    }

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(InstallError::Cancelled);
        }
        let read = match response.body.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(InstallError::Read {
                    url: response.url.clone(),
                    source,
                });
            }
        };
        temp.write_all(&buf[..read])
            .map_err(|source| InstallError::Write {
                path: dest.to_path_buf(),
                source,
            })?;
        written += read as u64;
        reporter.emit(EventCategory::Downloading, written.to_string());
    }

    temp.as_file()
        .sync_all()
        .map_err(|source| InstallError::Persist {
            path: dest.to_path_buf(),
            source,
        })?;
    temp.persist(dest).map_err(|err| InstallError::Persist {
        path: dest.to_path_buf(),
        source: err.error,
    })?;

    log_info!(
        "[Downloader] Saved {} to {}",
        human_readable_size(written),
        dest.display().to_string().green()
    );
    reporter.emit(EventCategory::Downloaded, format!("{written} {}", dest.display()));
    Ok(DownloadOutcome {
        url: response.url,
        bytes: written,
        path: dest.to_path_buf(),
    })
}
