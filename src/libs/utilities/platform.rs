// Our custom logging macros to give us nicely formatted (and colored!) output
// for debugging and warnings.
use crate::{log_debug, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use serde::{Serialize, Serializer};
use std::fmt;

/// Identifies which driver bundle variant to download for a host.
///
/// Derived once from the host OS and architecture at process start and never
/// mutated during a run. The rendered strings are the ones the CDN uses in
/// artifact filenames (`playwright-<version>-<tag>.zip`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformTag {
    Win32X64,
    Mac,
    MacArm64,
    Linux,
    LinuxArm64,
    /// A host the CDN has no bundle for. Renders as the empty string.
    Unknown,
}

impl PlatformTag {
    /// Detects the tag for the machine this binary is running on.
    pub fn detect() -> Self {
        let os = detect_os();
        let arch = detect_architecture();
        let tag = Self::from_os_arch(&os, &arch);
        log_debug!(
            "[Utils] Detected platform OS: {}, ARCH: {} -> tag '{}'",
            os.cyan(),
            arch.magenta(),
            tag.as_str().bold()
        );
        if tag == PlatformTag::Unknown {
            log_warn!(
                "[Utils] No driver bundle is published for OS '{}' / ARCH '{}'. Downloads will likely fail.",
                os.yellow(),
                arch.yellow()
            );
        }
        tag
    }

    /// Maps normalized OS/architecture names (see [`normalize_os`] and
    /// [`normalize_arch`]) to a tag. Windows always maps to the x64 bundle.
    pub fn from_os_arch(os: &str, arch: &str) -> Self {
        match (os, arch) {
            ("windows", _) => PlatformTag::Win32X64,
            ("macos", "arm64") => PlatformTag::MacArm64,
            ("macos", _) => PlatformTag::Mac,
            ("linux", "arm64") => PlatformTag::LinuxArm64,
            ("linux", _) => PlatformTag::Linux,
            _ => PlatformTag::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformTag::Win32X64 => "win32_x64",
            PlatformTag::Mac => "mac",
            PlatformTag::MacArm64 => "mac-arm64",
            PlatformTag::Linux => "linux",
            PlatformTag::LinuxArm64 => "linux-arm64",
            PlatformTag::Unknown => "",
        }
    }

    /// Executable bits are never restored when targeting Windows.
    pub fn is_windows(&self) -> bool {
        matches!(self, PlatformTag::Win32X64)
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PlatformTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Detects the current machine's CPU architecture (e.g., "arm64", "x86_64").
///
/// `std::env::consts::ARCH` is the architecture Rust compiled this binary
/// for, which is what matters when picking a bundle to run on it.
pub fn detect_architecture() -> String {
    normalize_arch(std::env::consts::ARCH)
}

/// Detects the current operating system (e.g., "macos", "linux", "windows").
pub fn detect_os() -> String {
    normalize_os(std::env::consts::OS)
}

/// Normalizes various input strings for operating systems into a consistent, lowercase format.
///
/// # Arguments
/// * `os`: An input string (`&str`) representing an OS (e.g., "macOS", "darwin", "Linux").
///
/// # Returns
/// * `String`: The normalized OS string (e.g., "macos", "linux", "windows").
///   If the input is not a known alias, the lowercase version of the input is returned.
pub fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" | "darwin" | "apple-darwin" => "macos".to_string(),
        "linux" => "linux".to_string(),
        "windows" | "win32" | "win64" => "windows".to_string(),
        other => {
            log_warn!("[Utils] Unknown OS variant '{}', using as-is.", other.purple());
            other.to_string()
        }
    }
}

/// Normalizes various input strings for CPU architectures into a consistent, lowercase format.
///
/// # Arguments
/// * `arch`: An input string (`&str`) representing an architecture (e.g., "AARCH64", "x86_64", "amd64").
///
/// # Returns
/// * `String`: The normalized architecture string (e.g., "arm64", "x86_64").
///   If the input is not a known alias, the lowercase version of the input is returned.
pub fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "aarch64" | "arm64" => "arm64".to_string(),
        "amd64" | "x86_64" => "x86_64".to_string(),
        other => {
            log_warn!("[Utils] Unknown ARCH variant '{}', using as-is.", other.purple());
            other.to_string()
        }
    }
}
