// src/scheduler/time_interface.rs - Time sources for the monitor loop
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicU64, Ordering};

pub trait TimeInterface: Send + Sync {
    /// Milliseconds elapsed on a monotonic clock since the source was created.
    fn now_millis(&self) -> u64;
    /// Wall-clock time, only used for human-readable messages.
    fn now_wallclock(&self) -> DateTime<Local>;
}

/// Monotonic clock backed by `tokio::time::Instant`, so it follows paused
/// virtual time inside tokio tests.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: tokio::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: tokio::time::Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeInterface for MonotonicClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn now_wallclock(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self { millis: AtomicU64::new(start_millis) }
    }

    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeInterface for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn now_wallclock(&self) -> DateTime<Local> {
        Local::now()
    }
}
