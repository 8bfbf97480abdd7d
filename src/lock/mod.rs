use log::warn;
use mockall::automock;
use std::{fs, path::PathBuf};
use thiserror::Error;

/// A lock backed by a file that records the holder's process id.
pub mod file;

/// A custom error for describing the error cases for locks
#[derive(Debug, Error)]
pub enum LockError {
    /// Another live process already holds the lock.
    #[error("another instance is already running with pid {0}")]
    AlreadyHeld(u32),
    /// The lock artifact cannot be created, read or removed.
    #[error("cannot access the lock file: {0}")]
    LockFailure(#[from] std::io::Error),
    /// The lock artifact exists but does not contain a process id.
    #[error("the lock file contains invalid content: {0}")]
    InvalidLockFile(String),
}

/// A lock prevents two instances of the monitor from running at the same time.
///
/// Locks may include:
///   - a lock file recording the holder pid ([file::FileLock])
///   - etc.
#[automock]
pub trait Lock {
    /// Acquire the lock, failing if another live holder exists.
    /// The returned guard releases the lock when it is dropped.
    fn acquire(&self) -> Result<LockGuard, LockError>;
}

/// Releases the underlying lock artifact when dropped, so the lock is
/// given up on every exit path of the monitor, clean or failed.
#[derive(Debug)]
pub struct LockGuard {
    path: Option<PathBuf>,
}

impl LockGuard {
    pub(crate) fn new(path: PathBuf) -> Self {
        LockGuard { path: Some(path) }
    }

    /// A guard that does not own any artifact.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        LockGuard { path: None }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(err) = fs::remove_file(&path) {
                warn!("Failed to remove the lock file {}: {err}.", path.display());
            }
        }
    }
}
