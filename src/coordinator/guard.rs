//! Single-flight guard for license acquisition

use std::sync::atomic::{AtomicBool, Ordering};

/// Set while one cache-consulting acquisition is outstanding
///
/// Owned by one coordinator; there is no process-wide instance.
#[derive(Debug, Default)]
pub struct SingleFlightGuard {
    pending: AtomicBool,
}

impl SingleFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically mark a request as pending.
    /// Returns `false` if one already was.
    pub fn try_acquire(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    pub fn release(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
