// src/stats/variance.rs - Windowed mean/variance with shifted sums
use super::window::SlidingWindow;

/// Running mean and sample variance over the last `capacity` values.
///
/// Sums are kept relative to a reference value `k` (the first value seen while
/// empty), which keeps `ex2 - ex²/n` well conditioned for signals that sit on a
/// large offset such as gravity. Every value that leaves the window has its
/// exact contribution subtracted again, so the accumulators always describe the
/// window contents.
#[derive(Debug, Clone)]
pub struct VarianceTracker {
    window: SlidingWindow<f64>,
    k: f64,
    n: usize,
    ex: f64,
    ex2: f64,
}

impl VarianceTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: SlidingWindow::new(capacity),
            k: 0.0,
            n: 0,
            ex: 0.0,
            ex2: 0.0,
        }
    }

    pub fn add(&mut self, x: f64) {
        if self.n == 0 {
            self.k = x;
        }
        self.n += 1;
        let d = x - self.k;
        self.ex += d;
        self.ex2 += d * d;
        if let Some(evicted) = self.window.push(x) {
            self.retire(evicted);
        }
    }

    /// Drop the oldest value and reverse its contribution.
    pub fn pop_oldest(&mut self) -> Option<f64> {
        let oldest = self.window.pop_oldest()?;
        self.retire(oldest);
        Some(oldest)
    }

    fn retire(&mut self, y: f64) {
        self.n -= 1;
        if self.n == 0 {
            self.ex = 0.0;
            self.ex2 = 0.0;
            return;
        }
        let d = y - self.k;
        self.ex -= d;
        self.ex2 -= d * d;
    }

    /// `None` while the window is empty.
    pub fn mean(&self) -> Option<f64> {
        if self.n == 0 {
            None
        } else {
            Some(self.k + self.ex / self.n as f64)
        }
    }

    /// Sample variance (n - 1 denominator); 0 with fewer than two values.
    pub fn variance(&self) -> f64 {
        if self.n > 1 {
            let n = self.n as f64;
            (self.ex2 - (self.ex * self.ex) / n) / (n - 1.0)
        } else {
            0.0
        }
    }

    /// Peak-to-peak amplitude of the window; 0 while empty.
    pub fn range(&self) -> f64 {
        let mut values = self.window.iter().copied();
        let Some(first) = values.next() else {
            return 0.0;
        };
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        max - min
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn values(&self) -> impl Iterator<Item = &f64> {
        self.window.iter()
    }
}
