//! Per-suite mutual exclusion for summary updates
//!
//! [`with_suite_lock`] combines an in-process mutex keyed by summary path with an
//! advisory lock file next to the summary, so that writers in the same
//! process and writers in other processes are both serialized.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

/// Lock files older than this are assumed to belong to a crashed writer.
pub const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn registry() -> &'static Mutex<HashMap<PathBuf, Arc<Mutex<()>>>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    LOCKS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn process_mutex(key: &Path) -> Arc<Mutex<()>> {
    let mut locks = registry().lock().unwrap_or_else(|e| e.into_inner());
    locks
        .entry(key.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Run `f` while holding the lock guarding `summary_path`.
///
/// The in-process mutex is taken first, then the lock file, waiting up to
/// `timeout` for another process to release it. Both are released when `f`
/// returns, whether it succeeded or not.
pub fn with_suite_lock<T>(
    summary_path: &Path,
    timeout: Duration,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let lock_path = lock_path_for(summary_path);
    let mutex = process_mutex(&lock_path);
    let _guard = mutex.lock().unwrap_or_else(|e| e.into_inner());

    let _file = LockFile::acquire(&lock_path, timeout)?;
    tracing::debug!(lock = %lock_path.display(), "acquired suite lock");
    f()
}

/// Advisory lock file owned by this process, removed on drop.
///
/// The file holds a token unique to this acquisition so that a holder never
/// removes a lock that has since been taken over by someone else.
struct LockFile {
    path: PathBuf,
    token: String,
}

impl LockFile {
    fn acquire(lock_path: &Path, timeout: Duration) -> Result<Self> {
        let token = next_token();
        acquire_lock_file(lock_path, &token, timeout)?;
        Ok(LockFile {
            path: lock_path.to_path_buf(),
            token,
        })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim() == self.token => {
                if let Err(e) = fs::remove_file(&self.path) {
                    if e.kind() != ErrorKind::NotFound {
                        tracing::warn!(lock = %self.path.display(), error = %e, "failed to remove lock file");
                    }
                }
            }
            Ok(_) => {
                tracing::warn!(lock = %self.path.display(), "lock was taken over while held");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(lock = %self.path.display(), error = %e, "failed to read lock file");
            }
        }
    }
}

/// Path of the advisory lock file for a summary file.
pub fn lock_path_for(summary_path: &Path) -> PathBuf {
    sibling_path(summary_path, ".lock")
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// `<pid>-<seq>`, unique across every acquisition on this machine.
fn next_token() -> String {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    format!(
        "{}-{}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    )
}

fn acquire_lock_file(lock_path: &Path, token: &str, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(lock_path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", token) {
                    let _ = fs::remove_file(lock_path);
                    return Err(e.into());
                }
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if is_stale(lock_path) && break_stale_lock(lock_path, token)? {
                    continue;
                }
                if Instant::now() >= deadline {
                    return Err(Error::LockTimeout(lock_path.to_path_buf()));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Remove a stale lock file. Returns whether anything was removed.
///
/// Only the contender that creates the `.takeover` guard may break a lock. It
/// re-checks staleness under the guard and moves the lock aside to a name
/// only it knows before deleting it. Contenders that lose the guard race
/// keep polling.
fn break_stale_lock(lock_path: &Path, token: &str) -> Result<bool> {
    let guard_path = sibling_path(lock_path, ".takeover");
    let _guard = match OpenOptions::new().write(true).create_new(true).open(&guard_path) {
        Ok(_) => TakeoverGuard { path: guard_path },
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            // A guard left by a crashed contender.
            if is_stale(&guard_path) {
                let _ = fs::remove_file(&guard_path);
            }
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    // Another contender may have broken the lock and re-acquired it already.
    if !is_stale(lock_path) {
        return Ok(false);
    }

    let side_path = sibling_path(lock_path, &format!(".{}.stale", token));
    match fs::rename(lock_path, &side_path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    }
    tracing::warn!(lock = %lock_path.display(), "removed stale lock file");
    fs::remove_file(&side_path)?;
    Ok(true)
}

struct TakeoverGuard {
    path: PathBuf,
}

impl Drop for TakeoverGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn is_stale(lock_path: &Path) -> bool {
    fs::metadata(lock_path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map(|age| age > STALE_LOCK_AGE)
        .unwrap_or(false)
}
