// Runner loop in tokio virtual time
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use washwatch::hardware::{RawSample, SampleReadError, SampleSource, SyntheticSource, WashProfile};
use washwatch::reporter::{spawn_reporter, ReportError, ReportEvent, Reporter};
use washwatch::scheduler::{MonotonicClock, TimeInterface};
use washwatch::telemetry::TelemetryWriter;
use washwatch::{Config, MonitorError, Runner};

#[derive(Default)]
struct Recording {
    events: Mutex<Vec<ReportEvent>>,
}

impl Recording {
    fn notifications(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Notify(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn pushes(&self) -> Vec<(u8, f64)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Push { channel, value } => Some((*channel, *value)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Reporter for Recording {
    async fn notify(&self, message: &str) -> Result<(), ReportError> {
        self.events.lock().unwrap().push(ReportEvent::Notify(message.to_string()));
        Ok(())
    }

    async fn push(&self, channel: u8, value: f64) -> Result<(), ReportError> {
        self.events.lock().unwrap().push(ReportEvent::Push { channel, value });
        Ok(())
    }
}

/// Plays back a fixed list of read results, then reports exhaustion.
struct Scripted {
    reads: VecDeque<Result<RawSample, SampleReadError>>,
}

impl Scripted {
    fn new(reads: impl IntoIterator<Item = Result<RawSample, SampleReadError>>) -> Self {
        Self { reads: reads.into_iter().collect() }
    }
}

impl SampleSource for Scripted {
    fn read(&mut self) -> Result<RawSample, SampleReadError> {
        self.reads.pop_front().unwrap_or(Err(SampleReadError::Exhausted))
    }
}

struct Broken;

impl SampleSource for Broken {
    fn read(&mut self) -> Result<RawSample, SampleReadError> {
        Err(SampleReadError::Bus("Remote I/O error".into()))
    }
}

const STILL: RawSample = RawSample { x: 0, y: 0, z: 16000 };

fn bus_error() -> Result<RawSample, SampleReadError> {
    Err(SampleReadError::Bus("NACK".into()))
}

#[tokio::test(start_paused = true)]
async fn test_simulated_wash_reports_one_finish() {
    let config = Config::default();
    let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
    let profile = WashProfile { idle_before_ms: 1_000, ..WashProfile::default() };
    let source = SyntheticSource::new(profile, clock.clone(), config.sensor.scale_lsb_per_g, 11);
    let reporter = Arc::new(Recording::default());
    let (handle, worker) = spawn_reporter(reporter.clone(), 32, Duration::from_secs(5));

    let mut runner = Runner::new(config, source, clock, TelemetryWriter::new(Vec::new()), handle)
        .unwrap()
        .with_time_limit(Duration::from_secs(20 * 60));
    let summary = runner.run().await.unwrap();
    let csv = String::from_utf8(runner.into_telemetry().into_inner().unwrap()).unwrap();
    worker.await.unwrap();

    assert_eq!(summary.runs_started, 1);
    assert_eq!(summary.runs_finished, 1);
    assert!(summary.long_sleeps >= 3);
    assert_eq!(summary.reads.failed_reads, 0);

    let notes = reporter.notifications();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].starts_with("Washing done at "));

    let pushes = reporter.pushes();
    assert!(!pushes.is_empty());
    assert!(pushes.iter().all(|&(channel, value)| channel == 1 && value > 0.0));
    assert!(pushes.iter().any(|&(_, value)| value == 6000.0));

    let lines: Vec<&str> = csv.lines().collect();
    let markers: Vec<&&str> = lines.iter().filter(|l| l.starts_with("0,0,0,0,0,0,0,")).collect();
    assert_eq!(markers.len(), 1);
    assert!(markers[0].contains("Washing done at "));
    assert_eq!(lines.len() as u64, summary.ticks + 1);
    assert!(lines.iter().filter(|l| !l.starts_with("0,0,0,0,0,0,0,")).all(|l| l.split(',').count() == 7));
}

#[tokio::test(start_paused = true)]
async fn test_start_notification_is_optional() {
    let mut config = Config::default();
    config.reporter.notify_on_start = true;
    let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
    let profile = WashProfile { idle_before_ms: 1_000, ..WashProfile::default() };
    let source = SyntheticSource::new(profile, clock.clone(), config.sensor.scale_lsb_per_g, 5);
    let reporter = Arc::new(Recording::default());
    let (handle, worker) = spawn_reporter(reporter.clone(), 32, Duration::from_secs(5));

    let mut runner = Runner::new(config, source, clock, TelemetryWriter::new(Vec::new()), handle)
        .unwrap()
        .with_time_limit(Duration::from_secs(20 * 60));
    runner.run().await.unwrap();
    drop(runner);
    worker.await.unwrap();

    let notes = reporter.notifications();
    assert_eq!(notes.len(), 2);
    assert!(notes[0].starts_with("Washing started at "));
    assert!(notes[1].starts_with("Washing done at "));
}

#[tokio::test(start_paused = true)]
async fn test_long_sleep_is_cut_short_by_time_limit() {
    let config = Config::default();
    let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
    let still = WashProfile { vibration_ms: 0, ..WashProfile::default() };
    let source = SyntheticSource::new(still, clock.clone(), config.sensor.scale_lsb_per_g, 2);
    let (handle, _worker) = spawn_reporter(Arc::new(Recording::default()), 8, Duration::from_secs(1));
    let mut runner = Runner::new(config, source, clock, TelemetryWriter::new(Vec::new()), handle)
        .unwrap()
        .with_time_limit(Duration::from_secs(10));

    let began = tokio::time::Instant::now();
    let summary = runner.run().await.unwrap();
    // 5 s wake window, then a 180 s sleep trimmed to the remaining 5 s
    assert_eq!(summary.long_sleeps, 1);
    let elapsed = began.elapsed();
    assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_millis(10_100), "ran for {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_failure_budget() {
    let mut config = Config::default();
    config.sensor.max_consecutive_failures = 3;
    let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
    let (handle, _worker) = spawn_reporter(Arc::new(Recording::default()), 8, Duration::from_secs(1));
    let mut runner = Runner::new(config, Broken, clock, TelemetryWriter::new(Vec::new()), handle).unwrap();

    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, MonitorError::SensorUnresponsive { failures: 4 }));
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_skip_ticks() {
    let config = Config::default();
    let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
    let (handle, _worker) = spawn_reporter(Arc::new(Recording::default()), 8, Duration::from_secs(1));
    let reads = vec![Ok(STILL), bus_error(), bus_error(), Ok(STILL), bus_error(), Ok(STILL), Ok(STILL)];
    let mut runner =
        Runner::new(config, Scripted::new(reads), clock, TelemetryWriter::new(Vec::new()), handle).unwrap();

    let summary = runner.run().await.unwrap();
    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.reads.total_reads, 7);
    assert_eq!(summary.reads.failed_reads, 3);
    assert_eq!(summary.reads.consecutive_failures, 0);

    let csv = String::from_utf8(runner.into_telemetry().into_inner().unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_max_ticks_stops_the_loop() {
    let config = Config::default();
    let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
    let (handle, _worker) = spawn_reporter(Arc::new(Recording::default()), 8, Duration::from_secs(1));
    let mut runner = Runner::new(config, Scripted::new(vec![Ok(STILL); 100]), clock, TelemetryWriter::new(Vec::new()), handle)
        .unwrap()
        .with_max_ticks(25);

    let summary = runner.run().await.unwrap();
    assert_eq!(summary.ticks, 25);
    assert_eq!(summary.runs_started, 0);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_sensor_error_is_returned() {
    let config = Config::default();
    let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
    let (handle, _worker) = spawn_reporter(Arc::new(Recording::default()), 8, Duration::from_secs(1));
    let reads = vec![Ok(STILL), Err(SampleReadError::WrongDevice { found: 0x00, expected: 0x33 })];
    let mut runner =
        Runner::new(config, Scripted::new(reads), clock, TelemetryWriter::new(Vec::new()), handle).unwrap();

    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, MonitorError::Sensor(SampleReadError::WrongDevice { .. })));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = Config::default();
    config.filter.variance_window = 1;
    let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
    let (handle, _worker) = spawn_reporter(Arc::new(Recording::default()), 8, Duration::from_secs(1));
    let result = Runner::new(config, Scripted::new(vec![]), clock, TelemetryWriter::new(Vec::new()), handle);
    assert!(matches!(result, Err(MonitorError::Config(_))));
}
