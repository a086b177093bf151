// src/monitor/classifier.rs - Vibration counter with hysteresis
use crate::config::DetectionConfig;

/// Saturating up/down counter of vibrating ticks.
///
/// Each tick above the threshold adds one, each quiet tick takes one away, so a
/// short pause in the wash only drains as much as it lasted.
#[derive(Debug, Clone)]
pub struct VibrationClassifier {
    threshold: f64,
    ceiling: u32,
    counter: u32,
}

impl VibrationClassifier {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            threshold: config.vibration_threshold,
            ceiling: config.vibration_ceiling,
            counter: 0,
        }
    }

    /// Feed one tick's activity metric and return the updated counter.
    pub fn update(&mut self, activity: f64) -> u32 {
        if self.is_vibrating(activity) {
            self.counter = (self.counter + 1).min(self.ceiling);
        } else {
            self.counter = self.counter.saturating_sub(1);
        }
        self.counter
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Strictly above the threshold.
    pub fn is_vibrating(&self, activity: f64) -> bool {
        activity > self.threshold
    }
}
