// Resolves where a driver bundle can be downloaded from.
use crate::libs::utilities::platform::PlatformTag;
use crate::log_debug;
use crate::schemas::driver::{TOOL_NAME, ToolVersion};
use colored::Colorize;

/// Environment variable naming a single origin that replaces the mirror list.
pub const DOWNLOAD_HOST_ENV: &str = "PLAYWRIGHT_DOWNLOAD_HOST";

/// CDN hosts serving identical driver bundles, in failover priority order.
pub const DEFAULT_MIRRORS: [&str; 3] = [
    "https://playwright.azureedge.net",
    "https://playwright-akamai.azureedge.net",
    "https://playwright-verizon.azureedge.net",
];

/// Deterministic bundle filename, also used for the retained local archive.
///
/// # Example
/// ```text
/// playwright-1.49.1-mac-arm64.zip
/// ```
pub fn artifact_name(version: &ToolVersion, platform: PlatformTag) -> String {
    format!("{TOOL_NAME}-{version}-{platform}.zip")
}

/// Path of the bundle relative to an origin.
///
/// Pre-release versions (see [`ToolVersion::is_prerelease`]) are published
/// under `next/`.
pub fn artifact_path(version: &ToolVersion, platform: PlatformTag) -> String {
    let artifact = artifact_name(version, platform);
    if version.is_prerelease() {
        format!("/builds/driver/next/{artifact}")
    } else {
        format!("/builds/driver/{artifact}")
    }
}

/// Computes the ordered list of absolute download URLs for a bundle.
///
/// A non-empty `download_host` yields exactly one candidate and fully
/// replaces `mirrors`; otherwise every mirror yields one URL, in order.
///
/// # Arguments
/// * `version` - The required driver version.
/// * `platform` - The bundle variant to fetch.
/// * `download_host` - Optional override origin (normally from `PLAYWRIGHT_DOWNLOAD_HOST`).
/// * `mirrors` - Default origins, highest priority first.
pub fn candidate_urls(
    version: &ToolVersion,
    platform: PlatformTag,
    download_host: Option<&str>,
    mirrors: &[String],
) -> Vec<String> {
    let path = artifact_path(version, platform);
    let join = |origin: &str| format!("{}{}", origin.trim_end_matches('/'), path);

    let urls: Vec<String> = match download_host.map(str::trim).filter(|host| !host.is_empty()) {
        Some(host) => {
            log_debug!("[Mirrors] Using override origin {}", host.blue());
            vec![join(host)]
        }
        None => mirrors.iter().map(|origin| join(origin)).collect(),
    };

    log_debug!("[Mirrors] Candidate URLs for {}: {:?}", version.to_string().bold(), urls);
    urls
}

/// The built-in mirror list as owned strings.
pub fn default_mirrors() -> Vec<String> {
    DEFAULT_MIRRORS.iter().map(|origin| origin.to_string()).collect()
}
