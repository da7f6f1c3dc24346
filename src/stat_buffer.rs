//! Fixed-capacity ring buffers with incrementally maintained statistics.
//!
//! Every push updates running sums, the decaying peak and the zero-crossing
//! count in O(1). Reported mean, variance and energy always describe exactly
//! the last `min(capacity, pushes)` values; nothing is ever rescanned.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PEAK_DECAY, DEFAULT_SAMPLE_RATE, LONG_CAPACITY, MAX_ZERO_CROSSING_WINDOW, MEDIUM_CAPACITY,
    MICRO_CAPACITY, SHORT_CAPACITY,
};

/// The four scalar analysis timescales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timescale {
    /// ~83 ms at 60 Hz
    Micro,
    /// ~0.57 s
    Short,
    /// ~3.9 s
    Medium,
    /// ~26.6 s
    Long,
}

impl Timescale {
    pub const ALL: [Self; 4] = [Self::Micro, Self::Short, Self::Medium, Self::Long];

    /// Default Fibonacci capacity for this timescale
    #[must_use]
    pub const fn default_capacity(self) -> usize {
        match self {
            Self::Micro => MICRO_CAPACITY,
            Self::Short => SHORT_CAPACITY,
            Self::Medium => MEDIUM_CAPACITY,
            Self::Long => LONG_CAPACITY,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Micro => 0,
            Self::Short => 1,
            Self::Medium => 2,
            Self::Long => 3,
        }
    }
}

/// Statistical summary of a buffer at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    /// Mean value of the window
    pub mean: f64,
    /// Population variance of the window
    pub variance: f64,
    /// Root mean square of the window
    pub energy: f64,
    /// Decaying running maximum of |value|
    pub peak: f64,
    /// Mean crossings within the zero-crossing sub-window
    pub zero_crossings: usize,
    /// Estimated oscillation frequency in Hz
    pub frequency: f64,
}

/// Ring buffer with running mean/variance/energy/peak/zero-crossing statistics
#[derive(Debug, Clone)]
pub struct StatBuffer {
    values: Vec<f64>,
    times: Vec<f64>,
    crossings: Vec<bool>,
    // Next slot to write; the oldest value once full
    head: usize,
    len: usize,
    sum: f64,
    sum_sq: f64,
    peak: f64,
    peak_decay: f64,
    zc_window: usize,
    zc_count: usize,
    nominal_rate: f64,
}

impl StatBuffer {
    /// Create a buffer with default peak decay and crossing window
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_params(capacity, DEFAULT_PEAK_DECAY, MAX_ZERO_CROSSING_WINDOW, DEFAULT_SAMPLE_RATE)
    }

    /// Create a buffer with explicit tuning.
    ///
    /// The zero-crossing sub-window is `min(capacity, zero_crossing_window)`;
    /// `nominal_rate` only sizes windows whose timestamps span no time.
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0
    #[must_use]
    pub fn with_params(capacity: usize, peak_decay: f64, zero_crossing_window: usize, nominal_rate: f64) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            values: vec![0.0; capacity],
            times: vec![0.0; capacity],
            crossings: vec![false; capacity],
            head: 0,
            len: 0,
            sum: 0.0,
            sum_sq: 0.0,
            peak: 0.0,
            peak_decay,
            zc_window: zero_crossing_window.clamp(1, capacity),
            zc_count: 0,
            nominal_rate,
        }
    }

    /// Push a value observed at time `t` (seconds)
    pub fn push(&mut self, value: f64, t: f64) {
        let capacity = self.values.len();

        let crossed = match self.get(0) {
            Some(prev) => {
                let m = self.mean();
                (prev - m) * (value - m) < 0.0
            }
            None => false,
        };

        // The flag leaving the crossing window, read before its slot can be reused
        if self.len >= self.zc_window {
            let leaving = (self.head + capacity - self.zc_window) % capacity;
            if self.crossings[leaving] {
                self.zc_count -= 1;
            }
        }

        if self.len == capacity {
            let old = self.values[self.head];
            self.sum -= old;
            self.sum_sq -= old * old;
        } else {
            self.len += 1;
        }

        self.values[self.head] = value;
        self.times[self.head] = t;
        self.crossings[self.head] = crossed;
        self.head = (self.head + 1) % capacity;

        self.sum += value;
        self.sum_sq += value * value;
        if crossed {
            self.zc_count += 1;
        }
        self.peak = (self.peak * self.peak_decay).max(value.abs());
    }

    /// Value pushed `age` pushes ago (0 = newest)
    #[must_use]
    pub fn get(&self, age: usize) -> Option<f64> {
        (age < self.len).then(|| self.values[self.slot(age)])
    }

    /// The last `n` values, newest first
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<f64> {
        (0..n.min(self.len)).map(|age| self.values[self.slot(age)]).collect()
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        self.sum / self.len as f64
    }

    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.len as f64 - mean * mean).max(0.0)
    }

    /// Root mean square
    #[must_use]
    pub fn energy(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        (self.sum_sq / self.len as f64).max(0.0).sqrt()
    }

    #[must_use]
    pub fn peak(&self) -> f64 {
        self.peak
    }

    #[must_use]
    pub fn zero_crossings(&self) -> usize {
        self.zc_count
    }

    /// Duration in seconds covered by the zero-crossing sub-window
    #[must_use]
    pub fn window_seconds(&self) -> f64 {
        let n = self.len.min(self.zc_window);
        if n >= 2 {
            let newest = self.times[self.slot(0)];
            let oldest = self.times[self.slot(n - 1)];
            let span = newest - oldest;
            if span > 0.0 {
                // n samples cover n intervals, the span only n - 1
                return span * n as f64 / (n - 1) as f64;
            }
        }
        n as f64 / self.nominal_rate
    }

    /// Oscillation frequency in Hz: crossings / (2 · window seconds)
    #[must_use]
    pub fn frequency_estimate(&self) -> f64 {
        let window = self.window_seconds();
        if window <= 0.0 {
            return 0.0;
        }
        self.zc_count as f64 / (2.0 * window)
    }

    #[must_use]
    pub fn stats(&self) -> Statistics {
        Statistics {
            mean: self.mean(),
            variance: self.variance(),
            energy: self.energy(),
            peak: self.peak,
            zero_crossings: self.zc_count,
            frequency: self.frequency_estimate(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.values.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Size of the zero-crossing sub-window
    #[must_use]
    pub fn crossing_window(&self) -> usize {
        self.zc_window
    }

    /// Empty the buffer
    pub fn clear(&mut self) {
        self.values.fill(0.0);
        self.times.fill(0.0);
        self.crossings.fill(false);
        self.head = 0;
        self.len = 0;
        self.sum = 0.0;
        self.sum_sq = 0.0;
        self.peak = 0.0;
        self.zc_count = 0;
    }

    fn slot(&self, age: usize) -> usize {
        let capacity = self.values.len();
        (self.head + capacity - 1 - age) % capacity
    }
}
