// src/reporter/mod.rs - Notification and dashboard sinks
pub mod blynk;
pub mod queue;

use async_trait::async_trait;
use thiserror::Error;

pub use blynk::BlynkReporter;
pub use queue::{drain_budget, shutdown, spawn_reporter, ReporterHandle, ReporterStats};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Timed out after {0} ms")]
    Timeout(u64),
    #[error("Reporter task failed: {0}")]
    Worker(String),
}

/// Something the monitor wants delivered off the sampling path.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Notify(String),
    Push { channel: u8, value: f64 },
}

/// Remote endpoint for alerts and live metrics. Failures are reported back to
/// the queue worker, never to the sampling loop.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), ReportError>;
    async fn push(&self, channel: u8, value: f64) -> Result<(), ReportError>;
}

/// Reporter that only writes to the log. Used for dry runs and when no device
/// token is configured.
#[derive(Debug, Default)]
pub struct LogReporter;

#[async_trait]
impl Reporter for LogReporter {
    async fn notify(&self, message: &str) -> Result<(), ReportError> {
        tracing::info!("notify: {}", message);
        Ok(())
    }

    async fn push(&self, channel: u8, value: f64) -> Result<(), ReportError> {
        tracing::debug!("push V{} = {}", channel, value);
        Ok(())
    }
}
