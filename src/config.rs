//! # Monitor Configuration
//!
//! All thresholds, window sizes and delays live in one TOML file. Every field has a
//! default, so an empty file reproduces the reference tuning (50 Hz sampling,
//! 50-sample variance window, ~100 s of vibration to detect a run, 10 minutes of
//! stillness to declare it finished).
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [sensor]
//! i2c_bus = "/dev/i2c-2"
//! address = 0x19
//!
//! [detection]
//! vibration_threshold = 0.05
//! machine_on_threshold = 5000
//! machine_off_delay_ms = 600000
//!
//! [schedule]
//! sleep_interval_ms = 180000
//!
//! [reporter]
//! endpoint = "http://blynk-cloud.com"
//! token = "your-device-token"
//! ```

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the sensor, filters, detection, scheduling and reporting.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub reporter: ReporterConfig,
}

/// Accelerometer bus settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SensorConfig {
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: String,
    #[serde(default = "default_address")]
    pub address: u8,
    /// Register counts per g.
    #[serde(default = "default_scale")]
    pub scale_lsb_per_g: f64,
    /// Consecutive failed reads tolerated before the sensor is declared dead.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            i2c_bus: default_i2c_bus(),
            address: default_address(),
            scale_lsb_per_g: default_scale(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// Window lengths of the per-axis filters.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FilterConfig {
    #[serde(default = "default_median_window")]
    pub median_window: usize,
    #[serde(default = "default_variance_window")]
    pub variance_window: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            median_window: default_median_window(),
            variance_window: default_variance_window(),
        }
    }
}

/// Vibration counter and machine state thresholds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DetectionConfig {
    /// Peak-to-peak amplitude (g) above which a tick counts as vibrating.
    #[serde(default = "default_vibration_threshold")]
    pub vibration_threshold: f64,
    /// Counter value above which the machine is considered running.
    #[serde(default = "default_machine_on_threshold")]
    pub machine_on_threshold: u32,
    /// Saturation point of the counter.
    #[serde(default = "default_vibration_ceiling")]
    pub vibration_ceiling: u32,
    #[serde(default = "default_machine_off_delay_ms")]
    pub machine_off_delay_ms: u64,
    #[serde(default = "default_push_interval_ms")]
    pub push_interval_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            vibration_threshold: default_vibration_threshold(),
            machine_on_threshold: default_machine_on_threshold(),
            vibration_ceiling: default_vibration_ceiling(),
            machine_off_delay_ms: default_machine_off_delay_ms(),
            push_interval_ms: default_push_interval_ms(),
        }
    }
}

/// Duty cycle between fast polling and long sleeps.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScheduleConfig {
    #[serde(default = "default_fast_poll_ms")]
    pub fast_poll_ms: u64,
    #[serde(default = "default_sleep_interval_ms")]
    pub sleep_interval_ms: u64,
    #[serde(default = "default_wake_window_ms")]
    pub wake_window_ms: u64,
    #[serde(default = "default_stay_awake_threshold")]
    pub stay_awake_threshold: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fast_poll_ms: default_fast_poll_ms(),
            sleep_interval_ms: default_sleep_interval_ms(),
            wake_window_ms: default_wake_window_ms(),
            stay_awake_threshold: default_stay_awake_threshold(),
        }
    }
}

impl ScheduleConfig {
    pub fn fast_poll(&self) -> Duration {
        Duration::from_millis(self.fast_poll_ms)
    }

    pub fn sleep_interval(&self) -> Duration {
        Duration::from_millis(self.sleep_interval_ms)
    }
}

/// Dashboard / push notification endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReporterConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Device auth token. Without one, reports are only logged.
    #[serde(default)]
    pub token: Option<String>,
    /// Virtual pin that receives the live vibration counter.
    #[serde(default = "default_progress_channel")]
    pub progress_channel: u8,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    #[serde(default)]
    pub notify_on_start: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            progress_channel: default_progress_channel(),
            timeout_ms: default_timeout_ms(),
            queue_depth: default_queue_depth(),
            notify_on_start: false,
        }
    }
}

impl ReporterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Reject settings the detection loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.sensor.scale_lsb_per_g.is_finite() && self.sensor.scale_lsb_per_g > 0.0) {
            return invalid(format!(
                "sensor.scale_lsb_per_g must be > 0 (got {})",
                self.sensor.scale_lsb_per_g
            ));
        }
        if self.filter.median_window == 0 {
            return invalid("filter.median_window must be at least 1".to_string());
        }
        if self.filter.variance_window < 2 {
            return invalid("filter.variance_window must be at least 2".to_string());
        }
        let threshold = self.detection.vibration_threshold;
        if !(threshold.is_finite() && threshold > 0.0) {
            return invalid(format!("detection.vibration_threshold must be > 0 (got {})", threshold));
        }
        if self.detection.machine_on_threshold == 0 {
            return invalid("detection.machine_on_threshold must be > 0".to_string());
        }
        if self.detection.vibration_ceiling <= self.detection.machine_on_threshold {
            return invalid(format!(
                "detection.vibration_ceiling ({}) must exceed machine_on_threshold ({})",
                self.detection.vibration_ceiling, self.detection.machine_on_threshold
            ));
        }
        if self.schedule.fast_poll_ms == 0 {
            return invalid("schedule.fast_poll_ms must be > 0".to_string());
        }
        if self.schedule.sleep_interval_ms < self.schedule.fast_poll_ms {
            return invalid("schedule.sleep_interval_ms must not be shorter than fast_poll_ms".to_string());
        }
        if self.reporter.timeout_ms == 0 {
            return invalid("reporter.timeout_ms must be > 0".to_string());
        }
        if self.reporter.queue_depth == 0 {
            return invalid("reporter.queue_depth must be > 0".to_string());
        }
        if !(self.reporter.endpoint.starts_with("http://") || self.reporter.endpoint.starts_with("https://")) {
            return invalid(format!(
                "reporter.endpoint must start with http:// or https:// (got '{}')",
                self.reporter.endpoint
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_i2c_bus() -> String { "/dev/i2c-2".to_string() }
fn default_address() -> u8 { crate::hardware::lis3dh::DEFAULT_ADDRESS }
fn default_scale() -> f64 { 16000.0 }
fn default_max_consecutive_failures() -> u32 { 100 }
fn default_median_window() -> usize { 3 }
fn default_variance_window() -> usize { 50 }
fn default_vibration_threshold() -> f64 { 0.05 }
fn default_machine_on_threshold() -> u32 { 5000 }
fn default_vibration_ceiling() -> u32 { 6000 }
fn default_machine_off_delay_ms() -> u64 { 10 * 60 * 1000 }
fn default_push_interval_ms() -> u64 { 1000 }
fn default_fast_poll_ms() -> u64 { 15 }
fn default_sleep_interval_ms() -> u64 { 180 * 1000 }
fn default_wake_window_ms() -> u64 { 5 * 1000 }
fn default_stay_awake_threshold() -> u32 { 50 }
fn default_endpoint() -> String { "http://blynk-cloud.com".to_string() }
fn default_progress_channel() -> u8 { 1 }
fn default_timeout_ms() -> u64 { 5000 }
fn default_queue_depth() -> usize { 32 }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path, e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}
