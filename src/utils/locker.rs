//! File-based locking to prevent concurrent rotation passes
//!
//! Rotation is quota-sensitive: two passes reading the same backup list and
//! both deciding to delete would violate the one-eviction-per-server rule, so
//! whole passes are serialized through an exclusive lock file.

use anyhow::{Context, Result};
use fd_lock::RwLock;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Run `f` while holding an exclusive lock named `name`.
///
/// Fails immediately if another process holds the lock; there is no waiting.
pub fn with_run_lock<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let lock_path = lock_path(name);

    debug!("Attempting to acquire lock: {:?}", lock_path);

    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create lock directory")?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {:?}", lock_path))?;

    let mut lock = RwLock::new(file);
    let guard = lock.try_write().with_context(|| {
        format!("Another rotation pass is already running (lock held: {:?})", lock_path)
    })?;

    info!("Acquired run lock: {:?}", lock_path);

    let result = f();

    drop(guard);
    if let Err(e) = std::fs::remove_file(&lock_path) {
        debug!("Failed to remove lock file: {}", e);
    }
    info!("Released run lock: {:?}", lock_path);

    result
}

fn lock_path(name: &str) -> PathBuf {
    #[cfg(unix)]
    let base = Path::new("/tmp");

    #[cfg(windows)]
    let base = std::env::temp_dir();

    base.join(format!("backup-rotator-{}.lock", name))
}
