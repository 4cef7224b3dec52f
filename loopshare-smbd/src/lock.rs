//! Exclusive ownership of a state directory.
//!
//! Two supervisors sharing one state directory would race on smb.conf and run
//! two daemons over the same lock and pid files. The first supervisor takes an
//! advisory lock on `loopshare.lock`; later ones are turned away.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Lock file name inside the state directory.
pub const LOCK_FILE: &str = "loopshare.lock";

/// Held advisory lock on a state directory. Released on drop.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Try to lock `state_dir` without blocking.
    ///
    /// # Errors
    ///
    /// [`Error::StateDirLocked`] if another holder has it, [`Error::Lock`] if
    /// the lock file cannot be opened or locked for any other reason.
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| Error::Lock {
                path: path.clone(),
                source,
            })?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(Error::StateDirLocked {
                    path: state_dir.to_path_buf(),
                });
            }
            return Err(Error::Lock { path, source: e });
        }

        debug!(path = %path.display(), "Acquired state directory lock");
        Ok(Self { file, path })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        // The file stays behind; only the lock is released.
        let _ = FileExt::unlock(&self.file);
    }
}
