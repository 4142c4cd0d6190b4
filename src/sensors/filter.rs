//! Moving-average filter for temperature readings.
//!
//! Single-board temperature sensors are noisy and coarse. Averaging the last
//! few successful readings hides single-sample spikes while only lagging by
//! `capacity` cycles.

use std::collections::VecDeque;

/// Bounded FIFO of the most recent successful readings.
#[derive(Debug, Clone)]
pub struct SmoothedTemperatureFilter {
    history: VecDeque<f64>,
    capacity: usize,
}

impl SmoothedTemperatureFilter {
    /// Create an empty filter holding at most `capacity` samples.
    ///
    /// A zero capacity is treated as one; configuration validation rejects it
    /// before it gets here.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn record(&mut self, sample: f64) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(sample);
    }

    /// Arithmetic mean of the current history, `None` while empty.
    pub fn average(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let sum: f64 = self.history.iter().sum();
        Some(sum / self.history.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SmoothedTemperatureFilter {
    fn default() -> Self {
        Self::new(5)
    }
}
