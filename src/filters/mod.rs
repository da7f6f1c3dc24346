//! Signal filtering algorithms for accelerometer axes.
//!
//! Each acceleration axis runs through its own scalar filter before gravity
//! separation. The Kalman filter is the default; the others exist for
//! comparison and for sensors that are already smoothed upstream.

/// One-dimensional Kalman filter (the default axis filter)
pub mod kalman;

/// Exponential filter for responsive smoothing
pub mod exponential;

/// Complementary filter separating gravity from linear acceleration
pub mod gravity;

use crate::{Error, Result};

/// Trait for all per-axis filters
pub trait SignalFilter: Send + Sync {
    /// Apply filter to one measurement and return the new estimate
    fn apply(&mut self, value: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl SignalFilter for NoFilter {
    fn apply(&mut self, value: f64) -> f64 {
        value
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

fn parse_param(filter_type: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::FilterError(format!("Invalid parameter '{raw}' for filter {filter_type}")))
}

/// Create an axis filter from a spec such as `kalman`, `kalman:0.1:0.05`,
/// `exponential:0.5` or `none`.
///
/// # Errors
///
/// Returns `Error::FilterError` for unknown names or out-of-range parameters.
pub fn create_filter(spec: &str) -> Result<Box<dyn SignalFilter>> {
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let params = parts.map(|p| parse_param(&name, p)).collect::<Result<Vec<f64>>>()?;

    match (name.as_str(), params.as_slice()) {
        ("none" | "nofilter", []) => Ok(Box::new(NoFilter)),
        ("kalman", []) => Ok(Box::new(kalman::KalmanFilter::default())),
        ("kalman", &[r, q]) => {
            if r <= 0.0 || q <= 0.0 {
                return Err(Error::FilterError(format!(
                    "Kalman noise parameters must be positive, got R={r} Q={q}"
                )));
            }
            Ok(Box::new(kalman::KalmanFilter::new(r, q)))
        }
        ("exponential", []) => Ok(Box::new(exponential::ExponentialFilter::default())),
        ("exponential", &[alpha]) => {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {spec}"))),
    }
}
