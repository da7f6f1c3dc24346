//! Input sanitation helpers for sensor values.

/// Replace NaN and infinities with zero
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Wrap an angle difference in degrees into [-180, 180)
#[must_use]
pub fn wrap_degrees(delta: f64) -> f64 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}
