//! Ctrl+C coordination.
//!
//! The interrupt handler runs on its own thread and exits the process. The
//! file replacement (rename to `.backup`, then move the new file in) must not
//! be cut in half, so it runs inside a [`CriticalSection`] and the handler
//! waits for any open section before exiting.

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Interrupt flag plus the lock guarding the file replacement.
pub struct Interrupt {
    requested: AtomicBool,
    critical: Mutex<()>,
}

/// Held while the local sitemap is being replaced.
pub struct CriticalSection<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl Interrupt {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            critical: Mutex::new(()),
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Fails once an interrupt was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_requested() {
            bail!("interrupted");
        }
        Ok(())
    }

    /// Open a critical section. Fails if an interrupt came first.
    pub fn enter_critical(&self) -> Result<CriticalSection<'_>> {
        let guard = self.critical.lock().unwrap_or_else(|e| e.into_inner());
        self.check()?;
        Ok(CriticalSection { _guard: guard })
    }

    /// Block until no critical section is open. Returns the guard so the
    /// caller can exit while still holding it.
    pub fn wait_for_critical(&self) -> MutexGuard<'_, ()> {
        self.critical.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Interrupt = Interrupt::new();

/// Process-wide instance used by the pipeline and the CLI handler.
pub fn global() -> &'static Interrupt {
    &GLOBAL
}
