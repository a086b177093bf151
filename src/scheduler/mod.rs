// src/scheduler/mod.rs - Loop timing: clocks and the duty cycle
pub mod duty_cycle;
pub mod time_interface;

pub use duty_cycle::{Delay, DutyCycleScheduler};
pub use time_interface::{ManualClock, MonotonicClock, TimeInterface};
