//! Watchdog and delay doubles. Both are cheap to clone; clones share one
//! counter so a test can keep a copy while the terminal owns the other.

use crate::traits::{Delay, Watchdog};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Watchdog that counts kicks.
#[derive(Debug, Clone, Default)]
pub struct CountingWatchdog {
    kicks: Arc<AtomicU64>,
}

impl CountingWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kicks(&self) -> u64 {
        self.kicks.load(Ordering::Relaxed)
    }
}

impl Watchdog for CountingWatchdog {
    fn kick(&mut self) {
        self.kicks.fetch_add(1, Ordering::Relaxed);
    }
}

/// Delay that returns at once and accumulates the requested time.
#[derive(Debug, Clone, Default)]
pub struct VirtualDelay {
    elapsed_ms: Arc<AtomicU64>,
}

impl VirtualDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms.load(Ordering::Relaxed)
    }
}

impl Delay for VirtualDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms.fetch_add(u64::from(ms), Ordering::Relaxed);
    }
}
