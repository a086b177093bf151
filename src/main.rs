// src/main.rs - CLI entry point
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use washwatch::config::{self, Config};
use washwatch::hardware::{SampleSource, SyntheticSource, WashProfile};
use washwatch::replay;
use washwatch::reporter::{self, spawn_reporter, BlynkReporter, LogReporter, Reporter};
use washwatch::runner::Runner;
use washwatch::scheduler::{MonotonicClock, TimeInterface};
use washwatch::telemetry::TelemetryWriter;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Parser)]
#[command(name = "washwatch", version, about = "Washing machine vibration monitor")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "washwatch.toml")]
    config: PathBuf,
    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Monitor the LIS3DH accelerometer on the configured I2C bus
    Run {
        /// Log reports instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the monitor loop against a generated wash cycle
    Simulate {
        #[arg(long)]
        dry_run: bool,
        /// Stop after this many seconds
        #[arg(long, default_value_t = 900)]
        duration_secs: u64,
        #[arg(long, default_value_t = 110)]
        vibration_secs: u64,
        /// Peak vibration amplitude in g
        #[arg(long, default_value_t = 0.6)]
        amplitude: f64,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Feed a recorded telemetry CSV through the detector
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the telemetry CSV
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting washwatch {}", env!("CARGO_PKG_VERSION"));
    let config = load_or_default(&cli.config)?;

    match cli.command {
        Command::Run { dry_run } => {
            let source = open_sensor(&config)?;
            let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
            monitor(config, source, clock, dry_run, None).await
        }
        Command::Simulate { dry_run, duration_secs, vibration_secs, amplitude, seed } => {
            let clock: Arc<dyn TimeInterface> = Arc::new(MonotonicClock::new());
            let profile = WashProfile {
                vibration_ms: vibration_secs * 1000,
                amplitude_g: amplitude,
                ..WashProfile::default()
            };
            tracing::info!("Simulating {:?} for {} s", profile, duration_secs);
            let source = SyntheticSource::new(profile, clock.clone(), config.sensor.scale_lsb_per_g, seed);
            monitor(config, source, clock, dry_run, Some(Duration::from_secs(duration_secs))).await
        }
        Command::Replay { file } => {
            let summary = replay::replay_file(&file, &config)?;
            for at_ms in &summary.finished_at_ms {
                println!("finished,{}", at_ms);
            }
            Ok(())
        }
    }
}

fn load_or_default(path: &Path) -> Result<Config, BoxError> {
    if !path.exists() {
        tracing::warn!("Config file '{}' not found, using defaults", path.display());
        return Ok(Config::default());
    }
    tracing::info!("Loading configuration from: {}", path.display());
    let config = config::load_config(&path.to_string_lossy())?;
    Ok(config)
}

fn build_reporter(config: &Config, dry_run: bool) -> Arc<dyn Reporter> {
    match (&config.reporter.token, dry_run) {
        (Some(token), false) => {
            tracing::info!("Reporting to {}", config.reporter.endpoint);
            Arc::new(BlynkReporter::new(&config.reporter, token))
        }
        (None, false) => {
            tracing::warn!("No reporter token configured, reports will only be logged");
            Arc::new(LogReporter)
        }
        (_, true) => Arc::new(LogReporter),
    }
}

async fn monitor<S: SampleSource>(
    config: Config,
    source: S,
    clock: Arc<dyn TimeInterface>,
    dry_run: bool,
    time_limit: Option<Duration>,
) -> Result<(), BoxError> {
    let sink = build_reporter(&config, dry_run);
    let timeout = config.reporter.timeout();
    let drain = reporter::drain_budget(timeout, config.reporter.queue_depth);
    let (handle, worker) = spawn_reporter(sink, config.reporter.queue_depth, timeout);

    let telemetry = TelemetryWriter::new(std::io::stdout());
    let mut runner = Runner::new(config, source, clock, telemetry, handle)?;
    if let Some(limit) = time_limit {
        runner = runner.with_time_limit(limit);
    }

    let outcome = tokio::select! {
        result = runner.run() => Some(result),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            None
        }
    };
    // Dropping the runner closes the reporter queue
    drop(runner);
    match reporter::shutdown(worker, drain).await {
        Ok(stats) => tracing::info!(
            "Reports delivered: {}, failed: {}, timed out: {}",
            stats.delivered,
            stats.failed,
            stats.timed_out
        ),
        Err(e) => tracing::warn!("Gave up on pending reports: {}", e),
    }

    if let Some(result) = outcome {
        let summary = result?;
        tracing::info!("{:?}", summary);
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn open_sensor(config: &Config) -> Result<washwatch::hardware::Lis3dh<linux_embedded_hal::I2cdev>, BoxError> {
    tracing::info!("Opening accelerometer on {} at 0x{:02x}", config.sensor.i2c_bus, config.sensor.address);
    let bus = linux_embedded_hal::I2cdev::new(&config.sensor.i2c_bus)?;
    let mut sensor = washwatch::hardware::Lis3dh::new(bus, config.sensor.address);
    sensor.probe()?;
    Ok(sensor)
}

#[cfg(not(target_os = "linux"))]
fn open_sensor(_config: &Config) -> Result<washwatch::hardware::SyntheticSource, BoxError> {
    Err("I2C accelerometers are only supported on Linux; try `simulate`".into())
}
