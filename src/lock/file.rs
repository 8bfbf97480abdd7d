use super::{Lock, LockError, LockGuard};
use log::{debug, warn};
use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::PathBuf,
    process,
};

/// A lock over a file that records the holder's process id.
///
/// Acquisition creates the file exclusively, so two racing instances cannot
/// both win. If the file already exists, the recorded process is checked for
/// liveness: a live holder blocks the acquisition, while a file left behind
/// by a dead process (e.g. after a kill) is removed and the acquisition is
/// retried. On platforms without a liveness check every existing lock file
/// counts as held.
pub struct FileLock {
    path: PathBuf,
}

impl FileLock {
    /// Creates a lock over the given file path.
    pub fn new(path: PathBuf) -> Self {
        FileLock { path }
    }

    fn read_holder(&self) -> Result<u32, LockError> {
        let contents = fs::read_to_string(&self.path)?;
        contents
            .trim()
            .parse()
            .map_err(|_| LockError::InvalidLockFile(contents.trim().to_string()))
    }

    fn try_create(&self) -> Result<Option<LockGuard>, LockError> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                write!(file, "{}", process::id())?;
                debug!("Acquired the lock file {}.", self.path.display());
                Ok(Some(LockGuard::new(self.path.clone())))
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl Lock for FileLock {
    fn acquire(&self) -> Result<LockGuard, LockError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        if let Some(guard) = self.try_create()? {
            return Ok(guard);
        }

        let holder = self.read_holder()?;
        if is_process_alive(holder) {
            return Err(LockError::AlreadyHeld(holder));
        }

        warn!("Removing the stale lock file left behind by dead process {holder}.");
        fs::remove_file(&self.path)?;
        match self.try_create()? {
            Some(guard) => Ok(guard),
            // Lost the race against another instance reclaiming the same file.
            None => Err(LockError::AlreadyHeld(self.read_holder()?)),
        }
    }
}

/// Check if the process with the given pid is alive, by sending it signal 0.
#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    use nix::{sys::signal::kill, unistd::Pid};

    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Without a liveness check every recorded holder counts as alive.
#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    true
}
