//! Washing machine vibration monitor.
//!
//! Samples a 3-axis accelerometer, keeps windowed statistics of the motion,
//! decides when a wash starts and finishes, and reports to a dashboard /
//! push-notification endpoint.

pub mod config;
pub mod hardware;
pub mod monitor;
pub mod replay;
pub mod reporter;
pub mod runner;
pub mod scheduler;
pub mod stats;
pub mod telemetry;

pub use config::{load_config, Config, ConfigError};
pub use monitor::{MachineState, Monitor, TickReport, Transition};
pub use runner::{MonitorError, RunSummary, Runner};
