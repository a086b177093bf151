// src/scheduler/duty_cycle.rs - Fast-poll / long-sleep duty cycle
use crate::config::ScheduleConfig;
use std::time::Duration;

/// What the loop should do before its next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    /// Short pause; keep sampling densely.
    FastPoll(Duration),
    /// Long power-saving sleep. The caller reports back with
    /// [`DutyCycleScheduler::woke`] once it is awake again.
    Sleep(Duration),
}

impl Delay {
    pub fn duration(&self) -> Duration {
        match self {
            Delay::FastPoll(d) | Delay::Sleep(d) => *d,
        }
    }

    pub fn is_sleep(&self) -> bool {
        matches!(self, Delay::Sleep(_))
    }
}

/// Samples densely while there is vibration or a wake window is open, otherwise
/// sleeps for a long interval. Every wake-up opens a new window, so a burst of
/// samples always follows a sleep before the loop may go back to sleep.
#[derive(Debug, Clone)]
pub struct DutyCycleScheduler {
    fast_poll: Duration,
    sleep_interval: Duration,
    wake_window_ms: u64,
    stay_awake_threshold: u32,
    last_wake_ms: u64,
}

impl DutyCycleScheduler {
    /// The window opened at `now_ms` covers process start.
    pub fn new(config: &ScheduleConfig, now_ms: u64) -> Self {
        Self {
            fast_poll: config.fast_poll(),
            sleep_interval: config.sleep_interval(),
            wake_window_ms: config.wake_window_ms,
            stay_awake_threshold: config.stay_awake_threshold,
            last_wake_ms: now_ms,
        }
    }

    pub fn next_delay(&self, counter: u32, now_ms: u64) -> Delay {
        let in_wake_window = now_ms.saturating_sub(self.last_wake_ms) < self.wake_window_ms;
        if counter > self.stay_awake_threshold || in_wake_window {
            Delay::FastPoll(self.fast_poll)
        } else {
            Delay::Sleep(self.sleep_interval)
        }
    }

    /// Re-arm the wake window after a long sleep.
    pub fn woke(&mut self, now_ms: u64) {
        tracing::debug!("Awake after long sleep, sampling densely for {} ms", self.wake_window_ms);
        self.last_wake_ms = now_ms;
    }

    pub fn last_wake_ms(&self) -> u64 {
        self.last_wake_ms
    }
}
