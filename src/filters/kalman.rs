use super::SignalFilter;
use crate::constants::{DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE};

/// Scalar Kalman filter for one acceleration axis
///
/// Random-walk model: predict grows the covariance by the process noise,
/// update blends the measurement in with gain `p / (p + r)`.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    // None until the first measurement seeds it
    estimate: Option<f64>,
    // Estimate covariance
    covariance: f64,
    // Measurement noise
    measurement_noise: f64,
    // Process noise
    process_noise: f64,
}

impl KalmanFilter {
    /// Create a filter with measurement noise `r` and process noise `q`
    #[must_use]
    pub fn new(measurement_noise: f64, process_noise: f64) -> Self {
        Self {
            estimate: None,
            covariance: 1.0,
            measurement_noise,
            process_noise,
        }
    }

    /// Current estimate, zero before the first measurement
    #[must_use]
    pub fn estimate(&self) -> f64 {
        self.estimate.unwrap_or(0.0)
    }

    /// Current estimate covariance
    #[must_use]
    pub fn covariance(&self) -> f64 {
        self.covariance
    }

    /// Predict then correct with one measurement
    pub fn update(&mut self, measurement: f64) -> f64 {
        let Some(x) = self.estimate else {
            self.estimate = Some(measurement);
            return measurement;
        };

        // Predict
        self.covariance += self.process_noise;

        // Update
        let gain = self.covariance / (self.covariance + self.measurement_noise);
        let x = gain.mul_add(measurement - x, x);
        self.covariance *= 1.0 - gain;
        self.estimate = Some(x);
        x
    }
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE)
    }
}

impl SignalFilter for KalmanFilter {
    fn apply(&mut self, value: f64) -> f64 {
        self.update(value)
    }

    fn reset(&mut self) {
        self.estimate = None;
        self.covariance = 1.0;
    }

    fn name(&self) -> &str {
        "KalmanFilter"
    }
}
