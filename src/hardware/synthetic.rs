// src/hardware/synthetic.rs - Generated wash cycle for dry runs
use super::{RawSample, SampleReadError, SampleSource};
use crate::scheduler::TimeInterface;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::sync::Arc;

/// Shape of the generated signal, relative to the source's creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct WashProfile {
    /// Stillness before the drum starts.
    pub idle_before_ms: u64,
    pub vibration_ms: u64,
    pub amplitude_g: f64,
    pub frequency_hz: f64,
    /// Uniform sensor noise, kept well below the vibration threshold.
    pub noise_g: f64,
}

impl Default for WashProfile {
    fn default() -> Self {
        Self {
            idle_before_ms: 10_000,
            vibration_ms: 110_000,
            amplitude_g: 0.6,
            frequency_hz: 7.0,
            noise_g: 0.004,
        }
    }
}

/// Accelerometer stand-in: gravity on Z, a sinusoidal drum vibration during the
/// profile's vibration phase, stillness otherwise.
pub struct SyntheticSource {
    profile: WashProfile,
    clock: Arc<dyn TimeInterface>,
    started_ms: u64,
    scale_lsb_per_g: f64,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(profile: WashProfile, clock: Arc<dyn TimeInterface>, scale_lsb_per_g: f64, seed: u64) -> Self {
        let started_ms = clock.now_millis();
        Self {
            profile,
            clock,
            started_ms,
            scale_lsb_per_g,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Acceleration in g at `elapsed_ms` after creation, without noise.
    pub fn signal_at(&self, elapsed_ms: u64) -> (f64, f64, f64) {
        let p = &self.profile;
        let vibrating = elapsed_ms >= p.idle_before_ms && elapsed_ms < p.idle_before_ms + p.vibration_ms;
        if !vibrating {
            return (0.0, 0.0, 1.0);
        }
        let phase = TAU * p.frequency_hz * (elapsed_ms as f64 / 1000.0);
        (p.amplitude_g * phase.sin(), 0.5 * p.amplitude_g * phase.cos(), 1.0)
    }

    fn noise(&mut self) -> f64 {
        if self.profile.noise_g > 0.0 {
            self.rng.random_range(-self.profile.noise_g..self.profile.noise_g)
        } else {
            0.0
        }
    }
}

impl SampleSource for SyntheticSource {
    fn read(&mut self) -> Result<RawSample, SampleReadError> {
        let elapsed = self.clock.now_millis().saturating_sub(self.started_ms);
        let (x, y, z) = self.signal_at(elapsed);
        let (nx, ny, nz) = (self.noise(), self.noise(), self.noise());
        Ok(RawSample::from_g(x + nx, y + ny, z + nz, self.scale_lsb_per_g))
    }
}
