//! Cross-process mutual exclusion over a target's single-instance UI.
//!
//! One lock file per resource, holding the owner's PID; staleness is computed
//! from the file's modification time. This is a cooperating-process
//! discipline, not a security boundary: it only excludes other processes that
//! go through the same lock manager.

use crate::config::AutomationConfig;
use crate::errors::AutomationError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

pub struct LockManager {
    dir: PathBuf,
    stale_after: Duration,
}

impl LockManager {
    pub fn new(config: &AutomationConfig) -> Self {
        Self {
            dir: config.lock_dir.clone(),
            stale_after: config.lock_timeout(),
        }
    }

    fn lock_path(&self, resource: &str) -> PathBuf {
        self.dir.join(format!("chatctl-{resource}.lock"))
    }

    /// Non-blocking acquire. Succeeds immediately when no live lock exists;
    /// a lock older than the staleness threshold is forcibly released and
    /// acquisition retried exactly once. A live lock, or losing the create
    /// race to a concurrent reclaimer, is `ResourceBusy`; the caller decides
    /// whether to retry.
    pub fn acquire(&self, resource: &str) -> Result<LockGuard, AutomationError> {
        let path = self.lock_path(resource);

        for attempt in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = write!(file, "{}", std::process::id()) {
                        warn!(error = %e, "failed to write holder pid into lock file");
                    }
                    debug!(resource, path = %path.display(), "lock acquired");
                    return Ok(LockGuard {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    let age = match lock_age(&path) {
                        Some(age) => age,
                        // Holder released between our probe and the stat;
                        // loop around and try to create again.
                        None => continue,
                    };
                    if attempt == 0 && age > self.stale_after {
                        warn!(
                            resource,
                            age_ms = age.as_millis() as u64,
                            "reclaiming stale lock"
                        );
                        match fs::remove_file(&path) {
                            Ok(()) => {}
                            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                            Err(e) => {
                                return Err(AutomationError::Internal(format!(
                                    "failed to reclaim stale lock {}: {e}",
                                    path.display()
                                )));
                            }
                        }
                        continue;
                    }
                    return Err(AutomationError::ResourceBusy(format!(
                        "resource '{resource}' is locked by another process ({}ms old)",
                        age.as_millis()
                    )));
                }
                Err(e) => {
                    return Err(AutomationError::Internal(format!(
                        "failed to create lock file {}: {e}",
                        path.display()
                    )));
                }
            }
        }

        // A concurrent reclaimer won the race after our stale release.
        Err(AutomationError::ResourceBusy(format!(
            "resource '{resource}' was reclaimed by another process"
        )))
    }
}

fn lock_age(path: &PathBuf) -> Option<Duration> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

/// Held lock over one resource. Releasing is idempotent and a missing lock
/// file is a no-op, never an error; `Drop` is the backstop guaranteeing no
/// exit path leaks a held lock.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "lock released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, path = %self.path.display(), "failed to remove lock file"),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(dir: &std::path::Path, stale_ms: u64) -> LockManager {
        let config = AutomationConfig {
            lock_dir: dir.to_path_buf(),
            lock_timeout_ms: stale_ms,
            ..AutomationConfig::default()
        };
        LockManager::new(&config)
    }

    #[test]
    fn second_acquire_on_live_lock_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let locks = manager(dir.path(), 120_000);

        let mut guard = locks.acquire("claude").unwrap();
        let err = locks.acquire("claude").unwrap_err();
        assert!(matches!(err, AutomationError::ResourceBusy(_)), "{err:?}");

        guard.release();
        let _reacquired = locks.acquire("claude").unwrap();
    }

    #[test]
    fn targets_lock_independently() {
        let dir = tempfile::tempdir().unwrap();
        let locks = manager(dir.path(), 120_000);

        let _claude = locks.acquire("claude").unwrap();
        let _chatgpt = locks.acquire("chatgpt").unwrap();
    }

    #[test]
    fn stale_lock_is_reclaimable_without_release() {
        let dir = tempfile::tempdir().unwrap();
        let locks = manager(dir.path(), 1);

        let guard = locks.acquire("claude").unwrap();
        // Simulate a crashed holder: never release, just let it age past the
        // 1ms threshold.
        std::mem::forget(guard);
        std::thread::sleep(Duration::from_millis(20));

        let _reclaimed = locks.acquire("claude").unwrap();
    }

    #[test]
    fn release_is_idempotent_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let locks = manager(dir.path(), 120_000);

        let mut guard = locks.acquire("claude").unwrap();
        guard.release();
        guard.release();

        let mut other = locks.acquire("claude").unwrap();
        // Remove the file out from under the guard.
        fs::remove_file(dir.path().join("chatctl-claude.lock")).unwrap();
        other.release();
    }

    #[test]
    fn drop_releases_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let locks = manager(dir.path(), 120_000);

        {
            let _guard = locks.acquire("claude").unwrap();
        }
        let _second = locks.acquire("claude").unwrap();
    }
}
