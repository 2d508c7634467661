//! Machine-wide run lock.
//!
//! Every command that may invoke a mutating package-manager operation holds
//! this lock, so two runs on one machine never drive the package manager at
//! the same time.

use crate::error::{Result, SyncError};
use crate::project_identity;
use crate::utils::paths;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

pub fn acquire() -> Result<RunLock> {
    acquire_at(paths::lock_file()?)
}

/// Take the lock at `lock_path`.
///
/// The OS releases the lock when its holder exits, so a file left behind
/// by a crashed run is simply locked again.
pub(crate) fn acquire_at(lock_path: PathBuf) -> Result<RunLock> {
    let io_error = |source| SyncError::IoError {
        path: lock_path.clone(),
        source,
    };

    if let Some(dir) = lock_path.parent() {
        fs::create_dir_all(dir).map_err(|source| SyncError::IoError {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(io_error)?;

    if file.try_lock_exclusive().is_err() {
        let holder = holder_pid(&mut file)
            .map(|pid| format!(" (pid {})", pid))
            .unwrap_or_default();
        return Err(SyncError::LockError(format!(
            "Another {} process is currently running{}.\n\
             Lock file: {}\n\
             Wait for it to finish, or delete the lock file if no other run is active.",
            project_identity::BINARY_NAME,
            holder,
            lock_path.display()
        )));
    }

    file.set_len(0).map_err(io_error)?;
    writeln!(file, "{}", std::process::id()).map_err(io_error)?;
    debug!(path = %lock_path.display(), "run lock acquired");

    Ok(RunLock {
        file,
        path: lock_path,
    })
}

fn holder_pid(file: &mut File) -> Option<u32> {
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    content.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lock_contention_returns_error() {
        let dir = tempdir().expect("tempdir");
        let lock_path = dir.path().join("run").join("pkgsync.lock");

        let _lock = acquire_at(lock_path.clone()).expect("first lock");
        match acquire_at(lock_path) {
            Ok(_) => panic!("second lock should fail"),
            Err(err) => {
                assert!(matches!(err, SyncError::LockError(_)));
                let message = err.to_string();
                assert!(message.contains("currently running"));
                assert!(message.contains(&format!("pid {}", std::process::id())));
            }
        }
    }

    #[test]
    fn lock_file_is_removed_on_drop() {
        let dir = tempdir().expect("tempdir");
        let lock_path = dir.path().join("pkgsync.lock");

        {
            let lock = acquire_at(lock_path.clone()).expect("lock");
            assert!(lock.path().exists());
        }
        assert!(!lock_path.exists());
        acquire_at(lock_path).expect("relock after release");
    }

    #[test]
    fn leftover_unlocked_file_is_reclaimed() {
        let dir = tempdir().expect("tempdir");
        let lock_path = dir.path().join("pkgsync.lock");
        fs::write(&lock_path, "12345\n").expect("write");

        let lock = acquire_at(lock_path).expect("reclaim");
        let content = fs::read_to_string(lock.path()).expect("read");
        assert_eq!(content.trim(), std::process::id().to_string());
    }
}
