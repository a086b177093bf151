// src/reporter/queue.rs - Background delivery so network I/O never stalls sampling
use super::{ReportError, ReportEvent, Reporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// Delivery counters returned by the worker once the queue closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReporterStats {
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
}

/// Sending side of the reporter queue, owned by the monitor loop.
#[derive(Debug, Clone)]
pub struct ReporterHandle {
    tx: mpsc::Sender<ReportEvent>,
}

impl ReporterHandle {
    /// Queue an event without waiting. When the queue is full the event is
    /// dropped, which only costs a dashboard point or a late alert.
    pub fn submit(&self, event: ReportEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!("Reporter queue full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!("Reporter stopped, dropping {:?}", event);
                false
            }
        }
    }
}

/// Start the delivery task. It runs until every [`ReporterHandle`] is dropped and
/// the queue has drained, then yields its statistics.
pub fn spawn_reporter(
    reporter: Arc<dyn Reporter>,
    queue_depth: usize,
    timeout: Duration,
) -> (ReporterHandle, JoinHandle<ReporterStats>) {
    let (tx, mut rx) = mpsc::channel::<ReportEvent>(queue_depth.max(1));
    let worker = tokio::spawn(async move {
        let mut stats = ReporterStats::default();
        while let Some(event) = rx.recv().await {
            match deliver(reporter.as_ref(), &event, timeout).await {
                Ok(()) => stats.delivered += 1,
                Err(ReportError::Timeout(ms)) => {
                    tracing::warn!("Reporter timed out after {} ms on {:?}", ms, event);
                    stats.timed_out += 1;
                }
                Err(e) => {
                    tracing::warn!("Reporter failed on {:?}: {}", event, e);
                    stats.failed += 1;
                }
            }
        }
        tracing::debug!("Reporter queue closed: {:?}", stats);
        stats
    });
    (ReporterHandle { tx }, worker)
}

/// Time to allow for the worker to empty a full queue on shutdown: one timeout
/// per queued event plus the one in flight.
pub fn drain_budget(timeout: Duration, queue_depth: usize) -> Duration {
    let calls = queue_depth.max(1).saturating_add(1);
    timeout.saturating_mul(u32::try_from(calls).unwrap_or(u32::MAX))
}

/// Wait for the worker to deliver what is still queued. Every [`ReporterHandle`]
/// must already be dropped or this only returns once `budget` runs out.
pub async fn shutdown(worker: JoinHandle<ReporterStats>, budget: Duration) -> Result<ReporterStats, ReportError> {
    match tokio::time::timeout(budget, worker).await {
        Ok(Ok(stats)) => Ok(stats),
        Ok(Err(e)) => Err(ReportError::Worker(e.to_string())),
        Err(_) => Err(ReportError::Timeout(budget.as_millis() as u64)),
    }
}

async fn deliver(reporter: &dyn Reporter, event: &ReportEvent, timeout: Duration) -> Result<(), ReportError> {
    let call = async {
        match event {
            ReportEvent::Notify(message) => reporter.notify(message).await,
            ReportEvent::Push { channel, value } => reporter.push(*channel, *value).await,
        }
    };
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| ReportError::Timeout(timeout.as_millis() as u64))?
}
