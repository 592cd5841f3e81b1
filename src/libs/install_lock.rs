//! In-process mutual exclusion for install directories.
//!
//! Two installs writing the same archive path and tree would corrupt each
//! other, so each run claims its destination directory here first. A claim
//! is released when its [`InstallLock`] guard is dropped.
//!
//! This only coordinates installs inside one process; separate processes
//! pointed at the same directory are not guarded.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::libs::errors::InstallError;
use crate::log_debug;

static ACTIVE_INSTALLS: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashSet<PathBuf>> {
    ACTIVE_INSTALLS.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Normalizes a destination so `dir`, `dir/` and `./dir` share one claim.
///
/// The directory may not exist yet, so this canonicalizes when possible and
/// otherwise falls back to an absolute, component-normalized path.
fn lock_key(dir: &Path) -> PathBuf {
    if let Ok(canonical) = dir.canonicalize() {
        return canonical;
    }
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    };
    absolute.components().collect()
}

/// Guard for a claimed install directory.
#[derive(Debug)]
pub struct InstallLock {
    key: PathBuf,
}

impl InstallLock {
    /// Claims `dir`, failing fast with [`InstallError::Busy`] if another
    /// install in this process already holds it.
    pub fn acquire(dir: &Path) -> Result<Self, InstallError> {
        let key = lock_key(dir);
        // A poisoned registry only means another install panicked while
        // holding the mutex; the set itself is still consistent.
        let mut active = registry()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(key.clone()) {
            return Err(InstallError::Busy {
                dir: dir.to_path_buf(),
            });
        }
        log_debug!("[InstallLock] Claimed {}", key.display());
        Ok(Self { key })
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let mut active = registry()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.key);
        log_debug!("[InstallLock] Released {}", self.key.display());
    }
}
