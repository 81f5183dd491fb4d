use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const LOCK_FILE_NAME: &str = "rname.lock";
const STALE_LOCK_TIMEOUT_SECS: u64 = 300;

/// `pid:timestamp` written into the lock file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LockOwner {
    pid: u32,
    timestamp: u64,
}

impl LockOwner {
    fn current() -> Self {
        Self {
            pid: process::id(),
            timestamp: now_secs(),
        }
    }

    fn parse(content: &str) -> Option<Self> {
        let (pid, timestamp) = content.trim().split_once(':')?;
        Some(Self {
            pid: pid.parse().ok()?,
            timestamp: timestamp.parse().ok()?,
        })
    }

    fn is_stale(self) -> bool {
        now_secs().saturating_sub(self.timestamp) > STALE_LOCK_TIMEOUT_SECS
            || !is_process_running(self.pid)
    }

    fn content(self) -> String {
        format!("{}:{}", self.pid, self.timestamp)
    }
}

/// Guards the history and favorites files while a batch or undo runs.
/// Removed on drop.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    owner: LockOwner,
}

impl LockFile {
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        let lock_path = data_dir.join(LOCK_FILE_NAME);

        if let Ok(content) = fs::read_to_string(&lock_path) {
            match LockOwner::parse(&content) {
                Some(owner) if !owner.is_stale() => {
                    return Err(anyhow!(
                        "Another rname process is already running (PID: {}). \
                        If this is incorrect, remove the lock file at: {}",
                        owner.pid,
                        lock_path.display()
                    ));
                },
                _ => {
                    debug!("Removing stale lock file {}", lock_path.display());
                    fs::remove_file(&lock_path).context("Failed to remove stale lock file")?;
                },
            }
        }

        fs::create_dir_all(data_dir).context("Failed to create rname data directory")?;

        let owner = LockOwner::current();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;
        file.write_all(owner.content().as_bytes())
            .context("Failed to write lock file")?;

        Ok(Self {
            path: lock_path,
            owner,
        })
    }

    fn is_ours(&self) -> bool {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|c| LockOwner::parse(&c))
            == Some(self.owner)
    }

    /// Release the lock, leaving the file alone if another process took it
    pub fn release(self) -> Result<()> {
        if self.is_ours() {
            fs::remove_file(&self.path).context("Failed to remove lock file")?;
        }
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if self.is_ours() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    #[allow(clippy::cast_possible_wrap)]
    unsafe {
        libc::kill(pid as libc::pid_t, 0) == 0
    }
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::OpenProcess;
    use winapi::um::winnt::PROCESS_QUERY_INFORMATION;

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_INFORMATION, 0, pid);
        if handle.is_null() {
            false
        } else {
            CloseHandle(handle);
            true
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn is_process_running(_pid: u32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        let lock = LockFile::acquire(&data_dir).unwrap();
        assert!(data_dir.join(LOCK_FILE_NAME).exists());
        lock.release().unwrap();
        assert!(!data_dir.join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn test_second_acquire_fails() {
        let temp_dir = TempDir::new().unwrap();
        let _lock = LockFile::acquire(temp_dir.path()).unwrap();
        let err = LockFile::acquire(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("already running"));
    }

    #[test]
    fn test_stale_and_orphaned_locks_reclaimed() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(LOCK_FILE_NAME);

        let old = now_secs() - (STALE_LOCK_TIMEOUT_SECS + 100);
        fs::write(&lock_path, format!("{}:{}", process::id(), old)).unwrap();
        LockFile::acquire(temp_dir.path()).unwrap().release().unwrap();

        fs::write(&lock_path, format!("999999:{}", now_secs())).unwrap();
        LockFile::acquire(temp_dir.path()).unwrap().release().unwrap();

        fs::write(&lock_path, "garbage").unwrap();
        let lock = LockFile::acquire(temp_dir.path()).unwrap();
        assert!(lock_path.exists());
        drop(lock);
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_foreign_lock_left_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let lock = LockFile::acquire(temp_dir.path()).unwrap();
        let lock_path = temp_dir.path().join(LOCK_FILE_NAME);
        fs::write(&lock_path, "1:1").unwrap();

        lock.release().unwrap();
        assert!(lock_path.exists());
    }

    #[test]
    fn test_process_running_detection() {
        assert!(is_process_running(process::id()));
        assert!(!is_process_running(999_999));
    }
}
