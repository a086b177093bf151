// src/stats/median.rs - Short median pre-filter for spike rejection
use super::window::SlidingWindow;

/// Median of the last `capacity` samples. Used ahead of the variance tracker so a
/// single glitched register read cannot register as vibration.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    window: SlidingWindow<f64>,
}

impl MedianFilter {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: SlidingWindow::new(capacity),
        }
    }

    pub fn add(&mut self, value: f64) {
        self.window.push(value);
    }

    /// Middle element for odd lengths, mean of the two middle elements for even
    /// lengths. `None` until the first sample arrives.
    pub fn median(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            Some(sorted[mid])
        } else {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_median() {
        let filter = MedianFilter::new(3);
        assert_eq!(filter.median(), None);
    }

    #[test]
    fn test_odd_window_median() {
        let mut filter = MedianFilter::new(3);
        for v in [1.0, 5.0, 3.0] {
            filter.add(v);
        }
        assert_eq!(filter.median(), Some(3.0));
    }

    #[test]
    fn test_oldest_sample_is_evicted() {
        let mut filter = MedianFilter::new(3);
        for v in [1.0, 5.0, 3.0, 100.0] {
            filter.add(v);
        }
        // window is now [5, 3, 100]
        assert_eq!(filter.median(), Some(5.0));
    }

    #[test]
    fn test_even_length_averages_middle_pair() {
        let mut filter = MedianFilter::new(3);
        filter.add(2.0);
        filter.add(4.0);
        assert_eq!(filter.median(), Some(3.0));

        let mut wide = MedianFilter::new(4);
        for v in [10.0, -2.0, 7.0, 1.0] {
            wide.add(v);
        }
        assert_eq!(wide.median(), Some(4.0));
    }

    #[test]
    fn test_single_spike_is_suppressed() {
        let mut filter = MedianFilter::new(3);
        filter.add(0.01);
        filter.add(1.9);
        filter.add(0.02);
        assert_eq!(filter.median(), Some(0.02));
    }
}
