// src/monitor/pipeline.rs - Per-tick sample conditioning
use crate::config::FilterConfig;
use crate::hardware::{RawSample, Sample};
use crate::stats::{MedianFilter, VarianceTracker};

/// Median filter followed by a variance tracker, for one axis.
#[derive(Debug, Clone)]
struct AxisChain {
    median: MedianFilter,
    variance: VarianceTracker,
}

impl AxisChain {
    fn new(config: &FilterConfig) -> Self {
        Self {
            median: MedianFilter::new(config.median_window),
            variance: VarianceTracker::new(config.variance_window),
        }
    }

    fn feed(&mut self, value: f64) -> f64 {
        self.median.add(value);
        let filtered = self.median.median().unwrap_or(value);
        self.variance.add(filtered);
        filtered
    }
}

/// Result of pushing one reading through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOutput {
    /// Converted, unfiltered reading.
    pub sample: Sample,
    /// Median-filtered x, y, z.
    pub filtered: [f64; 3],
    /// Magnitude of the unfiltered reading.
    pub magnitude: f64,
    /// Largest per-axis peak-to-peak range over the variance window.
    pub activity: f64,
    /// Largest per-axis sample variance over the variance window.
    pub max_variance: f64,
}

#[derive(Debug, Clone)]
pub struct SamplePipeline {
    scale_lsb_per_g: f64,
    axes: [AxisChain; 3],
}

impl SamplePipeline {
    pub fn new(filter: &FilterConfig, scale_lsb_per_g: f64) -> Self {
        Self {
            scale_lsb_per_g,
            axes: [AxisChain::new(filter), AxisChain::new(filter), AxisChain::new(filter)],
        }
    }

    pub fn process(&mut self, raw: RawSample, timestamp_ms: u64) -> PipelineOutput {
        let sample = raw.to_g(self.scale_lsb_per_g, timestamp_ms);
        let filtered = [
            self.axes[0].feed(sample.x),
            self.axes[1].feed(sample.y),
            self.axes[2].feed(sample.z),
        ];
        let activity = self
            .axes
            .iter()
            .map(|axis| axis.variance.range())
            .fold(0.0, f64::max);
        let max_variance = self
            .axes
            .iter()
            .map(|axis| axis.variance.variance())
            .fold(0.0, f64::max);
        PipelineOutput {
            sample,
            filtered,
            magnitude: sample.magnitude(),
            activity,
            max_variance,
        }
    }
}
