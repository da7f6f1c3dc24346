//! Per-sample feature derivation.
//!
//! Seven scalars are computed once per sample from the buffer statistics and
//! shared across the gesture neurons. Every feature is non-negative.

use nalgebra::Vector3;
use serde::Serialize;

use crate::config::FeatureConfig;
use crate::neurons::GestureKind;
use crate::pipeline::Orientation;
use crate::stat_buffer::StatBuffer;
use crate::utils::wrap_degrees;

/// Neuron inputs for one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Features {
    pub stillness: f64,
    pub shake: f64,
    pub sweep: f64,
    pub circle: f64,
    pub pendulum: f64,
    pub rock: f64,
    pub toss: f64,
}

impl Features {
    /// Input destined for one gesture neuron
    #[must_use]
    pub fn get(&self, kind: GestureKind) -> f64 {
        match kind {
            GestureKind::Stillness => self.stillness,
            GestureKind::Shake => self.shake,
            GestureKind::Sweep => self.sweep,
            GestureKind::Circle => self.circle,
            GestureKind::Pendulum => self.pendulum,
            GestureKind::Rock => self.rock,
            GestureKind::Toss => self.toss,
        }
    }
}

/// Buffers a feature pass reads from
pub struct FeatureInputs<'a> {
    pub micro: &'a StatBuffer,
    pub short: &'a StatBuffer,
    pub medium: &'a StatBuffer,
    /// Per-axis linear acceleration, x/y/z
    pub axes: [&'a StatBuffer; 3],
    pub orientation: Option<Orientation>,
}

/// Derives neuron inputs and keeps the little state rocking needs
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    deadzone: f64,
    tilt: f64,
    last_orientation: Option<Orientation>,
}

impl FeatureExtractor {
    #[must_use]
    pub fn new(config: FeatureConfig, deadzone: f64) -> Self {
        Self {
            config,
            deadzone,
            tilt: 0.0,
            last_orientation: None,
        }
    }

    /// Compute all seven features from the freshly updated buffers
    pub fn extract(&mut self, inputs: &FeatureInputs<'_>) -> Features {
        let short = inputs.short.stats();

        let stillness = 1.0 - (short.energy / self.deadzone).min(1.0);

        let shake = short.variance * short.frequency * self.config.shake_gain;

        let abs_mean = short.mean.abs();
        let jitter = (short.variance / (abs_mean + self.config.sweep_epsilon)).min(1.0);
        let sweep = abs_mean * (1.0 - jitter);

        let circle = Self::rotation(&inputs.axes) * self.config.circle_gain;

        let in_band = (self.config.pendulum_min_hz..=self.config.pendulum_max_hz).contains(&short.frequency);
        let pendulum = if in_band { short.energy } else { 0.0 };

        let rock = self.rock(inputs.orientation, inputs.medium.energy());

        let toss = if inputs.micro.peak() > self.config.toss_peak_threshold && abs_mean < self.config.toss_mean_ceiling
        {
            self.config.toss_input
        } else {
            0.0
        };

        Features {
            stillness,
            shake,
            sweep,
            circle,
            pendulum,
            rock,
            toss,
        }
    }

    /// Current smoothed tilt amplitude in degrees per sample
    #[must_use]
    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    pub fn reset(&mut self) {
        self.tilt = 0.0;
        self.last_orientation = None;
    }

    // |previous × current| of the linear acceleration vector
    fn rotation(axes: &[&StatBuffer; 3]) -> f64 {
        let at = |age: usize| -> Option<Vector3<f64>> {
            Some(Vector3::new(axes[0].get(age)?, axes[1].get(age)?, axes[2].get(age)?))
        };
        match (at(1), at(0)) {
            (Some(previous), Some(current)) => previous.cross(&current).norm(),
            _ => 0.0,
        }
    }

    fn rock(&mut self, orientation: Option<Orientation>, medium_energy: f64) -> f64 {
        let delta = match (self.last_orientation, orientation) {
            (Some(last), Some(now)) => {
                let beta = wrap_degrees(now.beta - last.beta);
                let gamma = wrap_degrees(now.gamma - last.gamma);
                beta.hypot(gamma)
            }
            _ => 0.0,
        };
        self.last_orientation = orientation;
        self.tilt += self.config.rock_smoothing * (delta - self.tilt);

        let gate = 1.0 - (medium_energy / self.config.rock_energy_ceiling).min(1.0);
        self.tilt * gate * self.config.rock_gain
    }
}
