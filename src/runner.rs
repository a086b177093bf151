// src/runner.rs - The sampling loop
use crate::config::{Config, ConfigError};
use crate::hardware::{ReadStats, SampleReadError, SampleSource};
use crate::monitor::{Monitor, TickReport, Transition};
use crate::reporter::{ReportEvent, ReporterHandle};
use crate::scheduler::{Delay, TimeInterface};
use crate::telemetry::TelemetryWriter;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Sensor unresponsive after {failures} consecutive failed reads")]
    SensorUnresponsive { failures: u32 },
    #[error("Sensor error: {0}")]
    Sensor(SampleReadError),
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] csv::Error),
}

/// Totals for one call to [`Runner::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub reads: ReadStats,
    pub long_sleeps: u64,
    pub runs_started: u64,
    pub runs_finished: u64,
}

/// Drives a [`Monitor`] from a sample source in real (or tokio virtual) time.
///
/// Not `Sync`; meant to be awaited from a single task. Reporting goes through
/// a [`ReporterHandle`] so a slow endpoint only delays the reporter task.
pub struct Runner<S, W: Write> {
    config: Config,
    source: S,
    clock: Arc<dyn TimeInterface>,
    telemetry: TelemetryWriter<W>,
    reporter: ReporterHandle,
    max_ticks: Option<u64>,
    time_limit_ms: Option<u64>,
}

impl<S: SampleSource, W: Write> Runner<S, W> {
    pub fn new(
        config: Config,
        source: S,
        clock: Arc<dyn TimeInterface>,
        telemetry: TelemetryWriter<W>,
        reporter: ReporterHandle,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            clock,
            telemetry,
            reporter,
            max_ticks: None,
            time_limit_ms: None,
        })
    }

    /// Stop after this many processed ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Stop once this much clock time has passed since the loop started.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    pub async fn run(&mut self) -> Result<RunSummary, MonitorError> {
        let started_ms = self.clock.now_millis();
        let mut monitor = Monitor::new(&self.config, started_ms);
        let mut summary = RunSummary::default();
        let fast_poll = self.config.schedule.fast_poll();
        let max_failures = self.config.sensor.max_consecutive_failures;

        tracing::info!("Monitoring started");
        loop {
            if self.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }
            if self
                .time_limit_ms
                .is_some_and(|limit| self.clock.now_millis().saturating_sub(started_ms) >= limit)
            {
                break;
            }

            let raw = match self.source.read() {
                Ok(raw) => {
                    summary.reads.record_success();
                    raw
                }
                Err(SampleReadError::Exhausted) => {
                    tracing::info!("Sample source exhausted");
                    break;
                }
                Err(e) if e.is_transient() => {
                    summary.reads.record_failure();
                    let failures = summary.reads.consecutive_failures;
                    tracing::warn!("Skipping tick, sample read failed ({} in a row): {}", failures, e);
                    if failures > max_failures {
                        tracing::error!("Giving up on the sensor after {} failed reads", failures);
                        return Err(MonitorError::SensorUnresponsive { failures });
                    }
                    tokio::time::sleep(fast_poll).await;
                    continue;
                }
                Err(e) => return Err(MonitorError::Sensor(e)),
            };

            let report = monitor.tick(raw, self.clock.now_millis());
            summary.ticks += 1;
            self.telemetry.write_tick(&report)?;
            self.publish(&report, &mut summary)?;

            match report.delay {
                Delay::FastPoll(pause) => tokio::time::sleep(self.clip_to_limit(pause, started_ms)).await,
                Delay::Sleep(pause) => {
                    let pause = self.clip_to_limit(pause, started_ms);
                    tracing::info!("No vibration, sleeping for {} s", pause.as_secs());
                    tokio::time::sleep(pause).await;
                    monitor.woke(self.clock.now_millis());
                    summary.long_sleeps += 1;
                }
            }
        }
        tracing::info!(
            "Monitoring stopped after {} ticks ({} failed reads, {} runs finished)",
            summary.ticks,
            summary.reads.failed_reads,
            summary.runs_finished
        );
        Ok(summary)
    }

    /// Shorten a pause so the loop never sleeps past its time limit.
    fn clip_to_limit(&self, pause: Duration, started_ms: u64) -> Duration {
        match self.time_limit_ms {
            Some(limit) => {
                let elapsed = self.clock.now_millis().saturating_sub(started_ms);
                pause.min(Duration::from_millis(limit.saturating_sub(elapsed)))
            }
            None => pause,
        }
    }

    fn publish(&mut self, report: &TickReport, summary: &mut RunSummary) -> Result<(), MonitorError> {
        match report.transition {
            Some(Transition::Started { .. }) => {
                summary.runs_started += 1;
                if self.config.reporter.notify_on_start {
                    let message = format!("Washing started at {}", self.human_time());
                    self.reporter.submit(ReportEvent::Notify(message));
                }
            }
            Some(Transition::Finished { at_ms, .. }) => {
                summary.runs_finished += 1;
                self.telemetry.write_finished(&format!("Washing done at {}", at_ms))?;
                let message = format!("Washing done at {}", self.human_time());
                self.reporter.submit(ReportEvent::Notify(message));
            }
            None => {}
        }
        if let Some(counter) = report.progress {
            self.reporter.submit(ReportEvent::Push {
                channel: self.config.reporter.progress_channel,
                value: counter as f64,
            });
        }
        Ok(())
    }

    fn human_time(&self) -> String {
        self.clock.now_wallclock().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn into_telemetry(self) -> TelemetryWriter<W> {
        self.telemetry
    }
}
