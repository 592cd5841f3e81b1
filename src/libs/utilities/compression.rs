// This module unpacks a downloaded driver bundle onto the filesystem,
// entry by entry, so that every step can be reported and the executable bit
// can be restored on the files that need it.

// For gzip-compressed tarballs.
use flate2::read::GzDecoder;
// For extracting tar archives.
use tar::Archive;
// For extracting zip archives.
use zip::ZipArchive;
// For zip-level errors that need mapping to I/O errors.
use zip::result::ZipError;
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::libs::errors::InstallError;
use crate::libs::progress::Reporter;
use crate::libs::utilities::platform::PlatformTag;
use crate::schemas::progress::EventCategory;
use crate::{log_debug, log_info};

/// Archive layouts the installer can read, picked from the filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Detects the format from the archive's file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

/// Whether an entry is a directory or a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// Read-only view of one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Name as recorded in the archive.
    pub name: String,
    pub kind: EntryKind,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Unix permission bits, when the archive records them.
    pub mode: Option<u32>,
}

impl EntryInfo {
    fn has_exec_bit(&self) -> bool {
        self.mode.is_some_and(|mode| mode & 0o111 != 0)
    }
}

/// Totals of a finished extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub directories: usize,
    pub files: usize,
    pub executables: usize,
    pub bytes: u64,
}

/// Recreates the contents of `archive` under `dest_root`.
///
/// Entries are processed in the archive's own order. Each entry is announced
/// with an `unzipping: <size> <name>` event before it is touched, and a
/// single `success: unzipped <archive>` event follows the last entry. The
/// first failure aborts the run; entries already written stay in place.
///
/// # Arguments
/// * `archive` - Path to a `.zip` or `.tar.gz` bundle.
/// * `dest_root` - Directory the entries are recreated under.
/// * `platform` - Target platform; executable bits are not restored for Windows.
/// * `reporter` - Progress events for this install run.
/// * `cancel` - Checked before every entry.
pub fn extract(
    archive: &Path,
    dest_root: &Path,
    platform: PlatformTag,
    reporter: Reporter<'_>,
    cancel: &CancellationToken,
) -> Result<ExtractSummary, InstallError> {
    log_debug!(
        "[Archive] Extracting {} into {}",
        archive.display().to_string().blue(),
        dest_root.display().to_string().cyan()
    );

    let format = ArchiveFormat::from_path(archive).ok_or_else(|| InstallError::UnsupportedArchive {
        path: archive.to_path_buf(),
    })?;
    let file = File::open(archive).map_err(|source| InstallError::OpenArchive {
        path: archive.to_path_buf(),
        source,
    })?;

    let mut installer = EntryInstaller {
        dest_root,
        restore_exec: !platform.is_windows(),
        reporter,
        cancel,
        summary: ExtractSummary::default(),
    };
    match format {
        ArchiveFormat::Zip => installer.install_zip(archive, file)?,
        ArchiveFormat::TarGz => installer.install_tar_gz(archive, file)?,
    }

    let summary = installer.summary;
    log_info!(
        "[Archive] Unpacked {} files ({} executable) and {} directories from {}",
        summary.files,
        summary.executables,
        summary.directories,
        archive.display().to_string().green()
    );
    reporter.emit(EventCategory::Success, format!("unzipped {}", archive.display()));
    Ok(summary)
}

/// Shared per-entry logic for every archive format.
struct EntryInstaller<'a> {
    dest_root: &'a Path,
    restore_exec: bool,
    reporter: Reporter<'a>,
    cancel: &'a CancellationToken,
    summary: ExtractSummary,
}

impl EntryInstaller<'_> {
    fn install_zip(&mut self, archive_path: &Path, file: File) -> Result<(), InstallError> {
        let mut archive = ZipArchive::new(file).map_err(|err| InstallError::ReadArchive {
            path: archive_path.to_path_buf(),
            source: zip_to_io(err),
        })?;

        for index in 0..archive.len() {
            self.check_cancelled()?;
            let mut entry = archive.by_index(index).map_err(|err| InstallError::ReadArchive {
                path: archive_path.to_path_buf(),
                source: zip_to_io(err),
            })?;
            let info = EntryInfo {
                name: entry.name().to_string(),
                kind: if entry.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: entry.size(),
                mode: entry.unix_mode(),
            };
            self.install_entry(&info, &mut entry)?;
        }
        Ok(())
    }

    fn install_tar_gz(&mut self, archive_path: &Path, file: File) -> Result<(), InstallError> {
        let read_error = |source: io::Error| InstallError::ReadArchive {
            path: archive_path.to_path_buf(),
            source,
        };
        let mut archive = Archive::new(GzDecoder::new(file));

        for entry in archive.entries().map_err(read_error)? {
            self.check_cancelled()?;
            let mut entry = entry.map_err(read_error)?;
            let header = entry.header();
            let kind = if header.entry_type().is_dir() {
                EntryKind::Directory
            } else if header.entry_type().is_file() {
                EntryKind::File
            } else {
                // Links and special files are not part of driver bundles.
                log_debug!("[Archive] Skipping non-regular entry {:?}", entry.path().ok());
                continue;
            };
            let info = EntryInfo {
                name: entry.path().map_err(read_error)?.to_string_lossy().into_owned(),
                kind,
                size: header.size().map_err(read_error)?,
                mode: header.mode().ok(),
            };
            self.install_entry(&info, &mut entry)?;
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), InstallError> {
        if self.cancel.is_cancelled() {
            return Err(InstallError::Cancelled);
        }
        Ok(())
    }

    /// Announces, then recreates, one entry.
    fn install_entry(&mut self, info: &EntryInfo, content: &mut dyn Read) -> Result<(), InstallError> {
        self.reporter
            .emit(EventCategory::Unzipping, format!("{} {}", info.size, info.name));

        let relative = enclosed_path(&info.name).ok_or_else(|| InstallError::UnsafeEntry {
            name: info.name.clone(),
        })?;
        let dest = self.dest_root.join(&relative);

        if info.kind == EntryKind::Directory {
            fs::create_dir_all(&dest).map_err(|source| InstallError::CreateFolder {
                path: dest.clone(),
                source,
            })?;
            self.summary.directories += 1;
            return Ok(());
        }

        // Archives are not required to list a directory before its files.
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| InstallError::CreateFolder {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut out = File::create(&dest).map_err(|source| InstallError::OpenForWrite {
            path: dest.clone(),
            source,
        })?;
        let copied = io::copy(content, &mut out).map_err(|source| InstallError::Extract {
            name: info.name.clone(),
            source,
        })?;
        out.sync_all().map_err(|source| InstallError::Close {
            path: dest.clone(),
            source,
        })?;

        self.summary.files += 1;
        self.summary.bytes += copied;

        if self.restore_exec && info.has_exec_bit() {
            make_executable(&dest)?;
            self.summary.executables += 1;
        }
        Ok(())
    }
}

/// Turns an archive entry name into a relative path that stays inside the
/// destination: no absolute paths, drive prefixes or `..` components.
fn enclosed_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut path = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if path.as_os_str().is_empty() {
        return None;
    }
    Some(path)
}

/// Adds execute permission for owner, group and other to the existing mode.
#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;

    let exec_error = |source| InstallError::MakeExecutable {
        path: path.to_path_buf(),
        source,
    };
    let mode = fs::metadata(path).map_err(exec_error)?.permissions().mode();
    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o111)).map_err(exec_error)?;
    log_debug!("[Archive] Marked {} executable", path.display());
    Ok(())
}

/// Non-unix hosts have no mode bits to restore.
#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}

fn zip_to_io(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(err) => err,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
