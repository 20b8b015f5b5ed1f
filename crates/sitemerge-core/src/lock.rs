//! Single-writer guard for the local sitemap.
//!
//! A run holds `<local_path>.lock` (created with create-new semantics) until the
//! guard is dropped. The path is also recorded process-wide so an interrupt
//! handler can remove it before exiting.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

static ACTIVE_LOCK: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Releases the lock file when dropped.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

/// `<path>.lock`
pub fn lock_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".lock");
    PathBuf::from(s)
}

impl RunLock {
    /// Take the lock for `target`. Fails if another run holds it.
    pub fn acquire(target: &Path) -> Result<Self> {
        let path = lock_path(target);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path).unwrap_or_default();
                anyhow::bail!(
                    "another run holds {} (pid {}); remove it if that run is gone",
                    path.display(),
                    holder.trim()
                );
            }
            Err(e) => {
                return Err(e).with_context(|| format!("create lock file {}", path.display()))
            }
        };
        writeln!(file, "{}", std::process::id())
            .with_context(|| format!("write lock file {}", path.display()))?;

        if let Ok(mut active) = ACTIVE_LOCK.lock() {
            *active = Some(path.clone());
        }
        tracing::debug!("acquired {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Ok(mut active) = ACTIVE_LOCK.lock() {
            if active.as_deref() == Some(self.path.as_path()) {
                *active = None;
            }
        }
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}

/// Remove the lock held by this process, if any. For interrupt handlers,
/// where the guard will never be dropped.
pub fn release_active() {
    let path = match ACTIVE_LOCK.lock() {
        Ok(mut active) => active.take(),
        Err(_) => None,
    };
    if let Some(path) = path {
        let _ = fs::remove_file(path);
    }
}
