//! Streaming statistics used by the vibration pipeline.
//!
//! - [`SlidingWindow`]: bounded FIFO storage
//! - [`MedianFilter`]: spike rejection ahead of the statistics
//! - [`VarianceTracker`]: windowed mean, variance and peak-to-peak range

pub mod median;
pub mod variance;
pub mod window;

pub use median::MedianFilter;
pub use variance::VarianceTracker;
pub use window::SlidingWindow;
