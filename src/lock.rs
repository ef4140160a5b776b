//! Advisory lock on the state directory.
//!
//! `write` and `apply` hold an exclusive lock on `<state dir>/.lock` for the
//! whole run. The holder records who it is so a second run can say what it
//! is waiting on.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions, TryLockError};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
    pub pid: u32,
    pub command: String,
    pub started_at: DateTime<Local>,
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error(
        "state is locked by another archnix process: {command} (PID {pid}, started {started_at})\n\
         If you're sure no archnix process is running, remove the lock file:\n  {}",
        lock_path.display()
    )]
    Contention {
        command: String,
        pid: u32,
        started_at: String,
        lock_path: PathBuf,
    },

    #[error(
        "state is locked (could not read lock metadata)\n\
         If you're sure no archnix process is running, remove the lock file:\n  {}",
        lock_path.display()
    )]
    ContentionUnknown { lock_path: PathBuf },

    #[error("failed to create state directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open lock file: {0}")]
    OpenFile(#[source] io::Error),

    #[error("failed to write lock metadata: {0}")]
    WriteMetadata(#[source] io::Error),

    #[error("failed to acquire lock: {0}")]
    LockFailed(#[source] io::Error),
}

/// Held lock; released when dropped.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    lock_path: PathBuf,
}

impl StateLock {
    /// Take the lock without waiting, creating the directory if needed.
    pub fn acquire(lock_path: &Path, command: &str) -> Result<Self, LockError> {
        if let Some(dir) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| LockError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .map_err(LockError::OpenFile)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(read_contention_error(lock_path)),
            Err(TryLockError::Error(e)) => return Err(LockError::LockFailed(e)),
        }

        let lock = Self {
            file,
            lock_path: lock_path.to_path_buf(),
        };
        lock.write_metadata(command)?;
        log::debug!("Acquired state lock {}", lock_path.display());
        Ok(lock)
    }

    fn write_metadata(&self, command: &str) -> Result<(), LockError> {
        let metadata = LockMetadata {
            pid: std::process::id(),
            command: command.to_string(),
            started_at: Local::now(),
        };

        let mut file = &self.file;
        file.set_len(0).map_err(LockError::WriteMetadata)?;
        file.seek(SeekFrom::Start(0))
            .map_err(LockError::WriteMetadata)?;
        serde_json::to_writer_pretty(&mut file, &metadata)
            .map_err(|e| LockError::WriteMetadata(io::Error::other(e)))?;
        file.flush().map_err(LockError::WriteMetadata)?;
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            log::warn!("Failed to release {}: {e}", self.lock_path.display());
        } else {
            log::debug!("Released state lock {}", self.lock_path.display());
        }
    }
}

fn read_contention_error(lock_path: &Path) -> LockError {
    if let Ok(contents) = std::fs::read_to_string(lock_path)
        && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
    {
        return LockError::Contention {
            command: metadata.command,
            pid: metadata.pid,
            started_at: metadata.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            lock_path: lock_path.to_path_buf(),
        };
    }

    LockError::ContentionUnknown {
        lock_path: lock_path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn holder(lock_path: &Path) -> LockMetadata {
        serde_json::from_str(&std::fs::read_to_string(lock_path).unwrap()).unwrap()
    }

    #[test]
    fn test_acquire_writes_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state").join(".lock");

        let _lock = StateLock::acquire(&path, "archnix apply").unwrap();

        let metadata = holder(&path);
        assert_eq!(metadata.pid, std::process::id());
        assert_eq!(metadata.command, "archnix apply");
    }

    #[test]
    fn test_second_acquire_reports_holder() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".lock");

        let _held = StateLock::acquire(&path, "archnix write").unwrap();
        let err = StateLock::acquire(&path, "archnix apply").unwrap_err();

        match err {
            LockError::Contention { command, pid, .. } => {
                assert_eq!(command, "archnix write");
                assert_eq!(pid, std::process::id());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_released_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".lock");

        drop(StateLock::acquire(&path, "archnix write").unwrap());
        assert!(StateLock::acquire(&path, "archnix apply").is_ok());
    }
}
