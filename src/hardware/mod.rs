// src/hardware/mod.rs - Accelerometer sample sources
pub mod lis3dh;
pub mod synthetic;

use thiserror::Error;

pub use lis3dh::Lis3dh;
pub use synthetic::{SyntheticSource, WashProfile};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleReadError {
    #[error("Bus error: {0}")]
    Bus(String),
    #[error("Unexpected device id 0x{found:02x} (expected 0x{expected:02x})")]
    WrongDevice { found: u8, expected: u8 },
    #[error("Sample source exhausted")]
    Exhausted,
}

impl SampleReadError {
    /// Whether skipping the tick and reading again can help.
    pub fn is_transient(&self) -> bool {
        matches!(self, SampleReadError::Bus(_))
    }
}

/// One raw reading: two's-complement register counts per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawSample {
    pub fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Decode three little-endian register pairs (X_L, X_H, Y_L, Y_H, Z_L, Z_H).
    pub fn from_le_bytes(bytes: [u8; 6]) -> Self {
        Self {
            x: i16::from_le_bytes([bytes[0], bytes[1]]),
            y: i16::from_le_bytes([bytes[2], bytes[3]]),
            z: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    pub fn to_g(self, scale_lsb_per_g: f64, timestamp_ms: u64) -> Sample {
        Sample {
            x: self.x as f64 / scale_lsb_per_g,
            y: self.y as f64 / scale_lsb_per_g,
            z: self.z as f64 / scale_lsb_per_g,
            timestamp_ms,
        }
    }

    /// Inverse of [`RawSample::to_g`], saturating at the register limits.
    pub fn from_g(x: f64, y: f64, z: f64, scale_lsb_per_g: f64) -> Self {
        let count = |g: f64| (g * scale_lsb_per_g).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        Self {
            x: count(x),
            y: count(y),
            z: count(z),
        }
    }
}

/// Acceleration in g plus the monotonic time it was taken at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp_ms: u64,
}

impl Sample {
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Anything that can hand the loop one 3-axis reading per tick.
pub trait SampleSource {
    fn read(&mut self) -> Result<RawSample, SampleReadError>;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read(&mut self) -> Result<RawSample, SampleReadError> {
        (**self).read()
    }
}

/// Counters kept by the runner about the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub total_reads: u64,
    pub failed_reads: u64,
    pub consecutive_failures: u32,
}

impl ReadStats {
    pub fn record_success(&mut self) {
        self.total_reads += 1;
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.total_reads += 1;
        self.failed_reads += 1;
        self.consecutive_failures += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twos_complement_decoding() {
        let raw = RawSample::from_le_bytes([0x80, 0x3e, 0x80, 0xc1, 0x00, 0x00]);
        assert_eq!(raw, RawSample::new(16000, -16000, 0));
    }

    #[test]
    fn test_conversion_to_g() {
        let sample = RawSample::new(16000, -8000, 0).to_g(16000.0, 42);
        assert_eq!(sample.x, 1.0);
        assert_eq!(sample.y, -0.5);
        assert_eq!(sample.z, 0.0);
        assert_eq!(sample.timestamp_ms, 42);
        assert!((sample.magnitude() - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_from_g_saturates() {
        let raw = RawSample::from_g(5.0, -5.0, 0.25, 16000.0);
        assert_eq!(raw, RawSample::new(i16::MAX, i16::MIN, 4000));
    }

    #[test]
    fn test_read_stats_reset_on_success() {
        let mut stats = ReadStats::default();
        stats.record_failure();
        stats.record_failure();
        assert_eq!(stats.consecutive_failures, 2);
        stats.record_success();
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(stats.failed_reads, 2);
        assert_eq!(stats.total_reads, 3);
    }

    #[test]
    fn test_only_bus_errors_are_transient() {
        assert!(SampleReadError::Bus("nack".into()).is_transient());
        assert!(!SampleReadError::Exhausted.is_transient());
        assert!(!SampleReadError::WrongDevice { found: 0, expected: 0x33 }.is_transient());
    }
}
