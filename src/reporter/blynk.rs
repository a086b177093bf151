//! Blynk cloud HTTP reporter.
//!
//! - `notify`: `POST {endpoint}/{token}/notify` with `{"body": message}`
//! - `push`: `PUT {endpoint}/{token}/update/V{pin}` with body `[value]`
//!
//! `ureq` is blocking, so each request runs on tokio's blocking pool. The agent
//! carries the configured timeout as a second line of defence behind the queue
//! worker's own timeout.

use super::{ReportError, Reporter};
use crate::config::ReporterConfig;
use async_trait::async_trait;

#[derive(Clone)]
pub struct BlynkReporter {
    agent: ureq::Agent,
    base_url: String,
}

impl BlynkReporter {
    pub fn new(config: &ReporterConfig, token: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .user_agent(&format!("washwatch/{}", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: format!("{}/{}", config.endpoint.trim_end_matches('/'), token),
        }
    }

    pub fn notify_url(&self) -> String {
        format!("{}/notify", self.base_url)
    }

    pub fn push_url(&self, channel: u8) -> String {
        format!("{}/update/V{}", self.base_url, channel)
    }

    async fn send(&self, method: &'static str, url: String, body: String) -> Result<(), ReportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            agent
                .request(method, &url)
                .set("Content-Type", "application/json")
                .send_string(&body)
        })
        .await
        .map_err(|e| ReportError::Worker(e.to_string()))?
        .map(|_| ())
        .map_err(|e| match e {
            ureq::Error::Status(status, resp) => ReportError::Status {
                status,
                message: resp.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(t) => ReportError::Transport(t.to_string()),
        })
    }
}

/// JSON body of a notification.
pub fn notify_body(message: &str) -> String {
    serde_json::json!({ "body": message }).to_string()
}

/// Virtual pin update body. Whole numbers print without a fraction.
pub fn push_body(value: f64) -> String {
    format!("[{}]", value)
}

#[async_trait]
impl Reporter for BlynkReporter {
    async fn notify(&self, message: &str) -> Result<(), ReportError> {
        self.send("POST", self.notify_url(), notify_body(message)).await
    }

    async fn push(&self, channel: u8, value: f64) -> Result<(), ReportError> {
        self.send("PUT", self.push_url(channel), push_body(value)).await
    }
}
