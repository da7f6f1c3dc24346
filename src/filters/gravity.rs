use nalgebra::Vector3;

use crate::constants::DEFAULT_GRAVITY_ALPHA;

/// Complementary filter splitting filtered acceleration into a slowly
/// tracked gravity vector and the linear residual.
#[derive(Debug, Clone)]
pub struct GravityEstimator {
    alpha: f64,
    gravity: Option<Vector3<f64>>,
    linear: Vector3<f64>,
}

impl GravityEstimator {
    /// Create an estimator; `alpha` is the weight kept on the previous gravity
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            gravity: None,
            linear: Vector3::zeros(),
        }
    }

    /// Blend `filtered` into gravity and return the linear acceleration.
    ///
    /// The first vector seen is taken as gravity.
    pub fn update(&mut self, filtered: Vector3<f64>) -> Vector3<f64> {
        let gravity = match self.gravity {
            Some(g) => g * self.alpha + filtered * (1.0 - self.alpha),
            None => filtered,
        };
        self.gravity = Some(gravity);
        self.linear = filtered - gravity;
        self.linear
    }

    /// Current gravity estimate, zero before the first update
    #[must_use]
    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity.unwrap_or_else(Vector3::zeros)
    }

    /// Linear acceleration from the last update
    #[must_use]
    pub fn linear(&self) -> Vector3<f64> {
        self.linear
    }

    pub fn reset(&mut self) {
        self.gravity = None;
        self.linear = Vector3::zeros();
    }
}

impl Default for GravityEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_gravity() {
        let mut estimator = GravityEstimator::default();
        let linear = estimator.update(Vector3::new(0.0, 0.0, 9.81));
        assert_eq!(linear, Vector3::zeros());
        assert_eq!(estimator.gravity(), Vector3::new(0.0, 0.0, 9.81));
    }

    #[test]
    fn test_converges_after_reorientation() {
        let mut estimator = GravityEstimator::default();
        estimator.update(Vector3::new(9.81, 0.0, 0.0));

        // Device turned: gravity now on z
        let mut linear = Vector3::zeros();
        for _ in 0..600 {
            linear = estimator.update(Vector3::new(0.0, 0.0, 9.81));
        }
        assert!(linear.norm() < 0.05);
        assert!((estimator.gravity().z - 9.81).abs() < 0.05);
    }

    #[test]
    fn test_impulse_shows_up_as_linear() {
        let mut estimator = GravityEstimator::default();
        estimator.update(Vector3::new(0.0, 0.0, 9.81));
        let linear = estimator.update(Vector3::new(5.0, 0.0, 9.81));
        assert!((linear.x - 4.9).abs() < 1e-9);
    }
}
