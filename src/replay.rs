// src/replay.rs - Offline detection over recorded telemetry
use crate::config::Config;
use crate::hardware::RawSample;
use crate::monitor::{Monitor, Transition};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Columns in a tick row: timestamp, x, y, z, magnitude, activity, counter.
const TICK_FIELDS: usize = 7;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Bad row {line}: {reason}")]
    BadRow { line: u64, reason: String },
}

/// What the detection engine saw in a recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub rows: u64,
    pub skipped: u64,
    pub runs_started: u64,
    pub runs_finished: u64,
    pub peak_counter: u32,
    pub finished_at_ms: Vec<u64>,
}

/// Run a recording through the engine at its own timestamps. A header before the
/// first data row and finished-run marker rows are skipped. Any other row that is
/// not seven finite numbers is a [`ReplayError::BadRow`]. The scheduler's delays
/// are ignored since the sampling already happened.
pub fn replay<R: Read>(input: R, config: &Config) -> Result<ReplaySummary, ReplayError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);
    let scale = config.sensor.scale_lsb_per_g;
    let mut monitor: Option<Monitor> = None;
    let mut summary = ReplaySummary::default();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if is_finish_row(&record) || (monitor.is_none() && is_header(&record)) {
            summary.skipped += 1;
            continue;
        }
        let (timestamp, raw) = parse_row(&record, scale).map_err(|reason| ReplayError::BadRow { line, reason })?;
        let engine = monitor.get_or_insert_with(|| Monitor::new(config, timestamp));
        let report = engine.tick(raw, timestamp);
        summary.rows += 1;
        summary.peak_counter = summary.peak_counter.max(report.counter);
        match report.transition {
            Some(Transition::Started { .. }) => summary.runs_started += 1,
            Some(Transition::Finished { at_ms, .. }) => {
                summary.runs_finished += 1;
                summary.finished_at_ms.push(at_ms);
            }
            None => {}
        }
    }
    tracing::info!(
        "Replayed {} rows ({} skipped): {} runs started, {} finished, peak counter {}",
        summary.rows,
        summary.skipped,
        summary.runs_started,
        summary.runs_finished,
        summary.peak_counter
    );
    Ok(summary)
}

pub fn replay_file(path: &Path, config: &Config) -> Result<ReplaySummary, ReplayError> {
    tracing::info!("Replaying {}", path.display());
    let file = std::fs::File::open(path)?;
    replay(std::io::BufReader::new(file), config)
}

/// `0,0,0,0,0,0,0,<message>` as written by the telemetry stream.
fn is_finish_row(record: &StringRecord) -> bool {
    record.len() == TICK_FIELDS + 1 && record.iter().take(TICK_FIELDS).all(|f| f == "0")
}

fn is_header(record: &StringRecord) -> bool {
    record.get(0).is_some_and(|first| first.parse::<f64>().is_err())
}

fn parse_row(record: &StringRecord, scale: f64) -> Result<(u64, RawSample), String> {
    if record.len() < 4 || record.len() > TICK_FIELDS {
        return Err(format!("expected 4 to {} fields, got {}", TICK_FIELDS, record.len()));
    }
    let field = |i: usize| -> Result<f64, String> {
        let text = record.get(i).unwrap_or("");
        let value = text.parse::<f64>().map_err(|e| format!("field {} ('{}'): {}", i, text, e))?;
        if !value.is_finite() {
            return Err(format!("field {} is not finite ('{}')", i, text));
        }
        Ok(value)
    };
    let timestamp = field(0)?;
    if timestamp < 0.0 {
        return Err(format!("negative timestamp {}", timestamp));
    }
    Ok((timestamp as u64, RawSample::from_g(field(1)?, field(2)?, field(3)?, scale)))
}
