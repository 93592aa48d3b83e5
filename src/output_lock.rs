//! Exclusive, in-process claims on output paths.
//!
//! Two writers must never stream into the same file. Every writer takes an
//! [`OutputLease`] for its canonical output path when it opens and releases it
//! when dropped; a second writer asking for a leased path fails fast with
//! [`FramedeckError::OutputPathInUse`].
//!
//! The key is the canonical parent directory joined with the file name, or
//! the canonical file itself when it already exists, so `..` segments and
//! symlinked directories or files all name the same lease.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, OnceLock},
};

use crate::error::FramedeckError;

fn registry() -> MutexGuard<'static, HashSet<PathBuf>> {
    static LEASED: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    // A writer that panicked while holding the lock leaves the set intact.
    LEASED
        .get_or_init(|| Mutex::new(HashSet::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Resolve `path` to the key every alias of the same file shares.
fn canonical_key(path: &Path) -> Result<PathBuf, FramedeckError> {
    let invalid = |reason: String| FramedeckError::OutputPathInvalid {
        path: path.to_path_buf(),
        reason,
    };

    if let Ok(existing) = fs::canonicalize(path) {
        return Ok(existing);
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| invalid("path does not name a file".to_string()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = fs::canonicalize(parent).map_err(|error| {
        invalid(format!(
            "parent directory {} cannot be resolved: {error}",
            parent.display()
        ))
    })?;
    Ok(parent.join(file_name))
}

/// Claim on an output path, released on drop.
#[derive(Debug)]
pub(crate) struct OutputLease {
    path: PathBuf,
}

impl OutputLease {
    /// Lease `path`, resolved against the current directory.
    ///
    /// # Errors
    ///
    /// [`FramedeckError::OutputPathInUse`] if another writer holds it, or
    /// [`FramedeckError::OutputPathInvalid`] if its directory cannot be
    /// resolved.
    pub(crate) fn acquire(path: &Path) -> Result<Self, FramedeckError> {
        let canonical = canonical_key(path)?;

        if !registry().insert(canonical.clone()) {
            return Err(FramedeckError::OutputPathInUse(path.to_path_buf()));
        }
        log::debug!("Leased output path {}", canonical.display());
        Ok(Self { path: canonical })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputLease {
    fn drop(&mut self) {
        registry().remove(&self.path);
        log::debug!("Released output path {}", self.path.display());
    }
}
