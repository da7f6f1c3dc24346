//! Configuration management for the motion pipeline

use crate::constants::{
    DEFAULT_BREATH_RATE, DEFAULT_DEADZONE, DEFAULT_DEPTH_SMOOTHING, DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_GRAVITY_ALPHA,
    DEFAULT_MAX_ACCEL, DEFAULT_MEASUREMENT_NOISE, DEFAULT_PEAK_DECAY, DEFAULT_PROCESS_NOISE, DEFAULT_SAMPLE_RATE,
    DEFAULT_SAVE_INTERVAL_SECS, FINGERPRINT_KEY, LONG_CAPACITY, MAX_DT_SECS, MAX_FINGERPRINT_RATE,
    MAX_STILLNESS_SECS, MAX_ZERO_CROSSING_WINDOW, MEDIUM_CAPACITY, MICRO_CAPACITY, SETTLING_SECS, SHORT_CAPACITY,
    TRANSCENDENT_SECS, VOID_SECS,
};
use crate::filters::SignalFilter;
use crate::neurons::GestureKind;
use crate::stat_buffer::Timescale;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Axis filter and gravity separation
    pub filter: FilterConfig,

    /// Ring buffer sizing
    pub buffers: BufferConfig,

    /// Feature derivation tuning
    pub features: FeatureConfig,

    /// Gesture neuron parameters
    pub neurons: NeuronConfig,

    /// Stillness state machine
    pub stillness: StillnessConfig,

    /// Motion fingerprint learning and persistence
    pub fingerprint: FingerprintConfig,
}

/// Axis filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Axis filter type (kalman, exponential, none, or a full filter spec)
    pub axis_filter: String,

    /// Kalman measurement noise R
    pub measurement_noise: f64,

    /// Kalman process noise Q
    pub process_noise: f64,

    /// Exponential filter alpha
    pub exponential_alpha: f64,

    /// Weight kept on the previous gravity estimate each sample
    pub gravity_alpha: f64,

    /// Raw acceleration is clamped to ±this bound (m/s²) before filtering
    pub max_accel: f64,
}

/// Buffer capacities and statistics tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub micro: usize,
    pub short: usize,
    pub medium: usize,
    pub long: usize,

    /// Per-sample decay of the running peak
    pub peak_decay: f64,

    /// Upper bound of the zero-crossing sub-window
    pub zero_crossing_window: usize,

    /// Sample rate assumed until timestamps span real time
    pub nominal_sample_rate: f64,
}

/// Feature derivation constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Scale applied to variance × frequency
    pub shake_gain: f64,

    /// Guards the sweep jitter ratio against a zero mean
    pub sweep_epsilon: f64,

    /// Scale applied to the cross-product magnitude
    pub circle_gain: f64,

    /// Natural pendulum band in Hz
    pub pendulum_min_hz: f64,
    pub pendulum_max_hz: f64,

    /// Blend of each new tilt delta into the smoothed tilt amplitude
    pub rock_smoothing: f64,

    /// Scale applied to the gated tilt amplitude
    pub rock_gain: f64,

    /// Medium-timescale energy at which rocking is fully gated off
    pub rock_energy_ceiling: f64,

    /// Micro peak (m/s²) that counts as a toss impulse
    pub toss_peak_threshold: f64,

    /// Short mean below which the device counts as airborne or caught
    pub toss_mean_ceiling: f64,

    /// Input delivered to the toss neuron while the toss condition holds
    pub toss_input: f64,
}

/// Leaky-integrate-and-fire parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuronParams {
    /// Membrane retention per sample, in (0, 1)
    pub leak: f64,

    /// Firing threshold
    pub threshold: f64,

    /// Samples of lockout after a spike
    pub refractory_period: u32,
}

impl NeuronParams {
    #[must_use]
    pub const fn new(leak: f64, threshold: f64, refractory_period: u32) -> Self {
        Self {
            leak,
            threshold,
            refractory_period,
        }
    }
}

/// Per-gesture neuron parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuronConfig {
    pub stillness: NeuronParams,
    pub shake: NeuronParams,
    pub sweep: NeuronParams,
    pub circle: NeuronParams,
    pub pendulum: NeuronParams,
    pub rock: NeuronParams,
    pub toss: NeuronParams,
}

impl NeuronConfig {
    /// Parameters of one gesture neuron
    #[must_use]
    pub fn params(&self, kind: GestureKind) -> NeuronParams {
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

/// Stillness machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StillnessConfig {
    /// Linear magnitude (m/s²) below which a sample counts as still
    pub deadzone: f64,

    /// Stillness seconds at which SETTLING begins
    pub settling_secs: f64,

    /// Stillness seconds at which VOID begins
    pub void_secs: f64,

    /// Stillness seconds at which TRANSCENDENT begins
    pub transcendent_secs: f64,

    /// Ceiling of the stillness timer
    pub max_stillness_secs: f64,

    /// Per-sample blend of depth toward its target
    pub depth_smoothing: f64,

    /// Breath oscillator rate in Hz
    pub breath_rate_hz: f64,

    /// Largest time step accepted between two samples
    pub max_dt_secs: f64,
}

/// Fingerprint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Exponential averaging rate, capped at 0.01
    pub learning_rate: f64,

    /// Seconds between saves
    pub save_interval_secs: f64,

    /// Key the fingerprint is stored under
    pub storage_key: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            axis_filter: "kalman".to_string(),
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            process_noise: DEFAULT_PROCESS_NOISE,
            exponential_alpha: DEFAULT_EXPONENTIAL_ALPHA,
            gravity_alpha: DEFAULT_GRAVITY_ALPHA,
            max_accel: DEFAULT_MAX_ACCEL,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            micro: MICRO_CAPACITY,
            short: SHORT_CAPACITY,
            medium: MEDIUM_CAPACITY,
            long: LONG_CAPACITY,
            peak_decay: DEFAULT_PEAK_DECAY,
            zero_crossing_window: MAX_ZERO_CROSSING_WINDOW,
            nominal_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl BufferConfig {
    /// Capacity of one scalar timescale
    #[must_use]
    pub fn capacity(&self, timescale: Timescale) -> usize {
        match timescale {
            Timescale::Micro => self.micro,
            Timescale::Short => self.short,
            Timescale::Medium => self.medium,
            Timescale::Long => self.long,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            shake_gain: 0.1,
            sweep_epsilon: 1e-3,
            circle_gain: 1.0,
            pendulum_min_hz: 0.3,
            pendulum_max_hz: 3.0,
            rock_smoothing: 0.1,
            rock_gain: 0.5,
            rock_energy_ceiling: 1.0,
            toss_peak_threshold: 15.0,
            toss_mean_ceiling: 2.0,
            toss_input: 2.0,
        }
    }
}

impl Default for NeuronConfig {
    fn default() -> Self {
        Self {
            stillness: NeuronParams::new(0.95, 15.0, 60),
            shake: NeuronParams::new(0.85, 4.0, 20),
            sweep: NeuronParams::new(0.9, 8.0, 30),
            circle: NeuronParams::new(0.9, 10.0, 30),
            pendulum: NeuronParams::new(0.97, 30.0, 60),
            rock: NeuronParams::new(0.95, 5.0, 45),
            toss: NeuronParams::new(0.5, 1.0, 60),
        }
    }
}

impl Default for StillnessConfig {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            settling_secs: SETTLING_SECS,
            void_secs: VOID_SECS,
            transcendent_secs: TRANSCENDENT_SECS,
            max_stillness_secs: MAX_STILLNESS_SECS,
            depth_smoothing: DEFAULT_DEPTH_SMOOTHING,
            breath_rate_hz: DEFAULT_BREATH_RATE,
            max_dt_secs: MAX_DT_SECS,
        }
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            learning_rate: MAX_FINGERPRINT_RATE,
            save_interval_secs: DEFAULT_SAVE_INTERVAL_SECS,
            storage_key: FINGERPRINT_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the YAML is malformed
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create one axis filter from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::FilterError` if the filter name is unknown
    pub fn create_axis_filter(&self) -> Result<Box<dyn SignalFilter>> {
        use crate::filters::{create_filter, exponential::ExponentialFilter, kalman::KalmanFilter, NoFilter};

        match self.filter.axis_filter.as_str() {
            "kalman" => Ok(Box::new(KalmanFilter::new(
                self.filter.measurement_noise,
                self.filter.process_noise,
            ))),
            "exponential" => Ok(Box::new(ExponentialFilter::new(self.filter.exponential_alpha))),
            "none" => Ok(Box::new(NoFilter)),
            spec => create_filter(spec),
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        // Filter parameters
        if self.filter.measurement_noise <= 0.0 || self.filter.process_noise <= 0.0 {
            return Err(Error::ConfigError("Kalman noise parameters must be positive".to_string()));
        }
        if !(self.filter.exponential_alpha > 0.0 && self.filter.exponential_alpha <= 1.0) {
            return Err(Error::ConfigError("Exponential alpha must be in (0, 1]".to_string()));
        }
        if !(0.0..1.0).contains(&self.filter.gravity_alpha) {
            return Err(Error::ConfigError("Gravity alpha must be in [0, 1)".to_string()));
        }
        if !(self.filter.max_accel.is_finite() && self.filter.max_accel > 0.0) {
            return Err(Error::ConfigError("Acceleration bound must be positive and finite".to_string()));
        }

        // Buffers
        for timescale in Timescale::ALL {
            if self.buffers.capacity(timescale) == 0 {
                return Err(Error::ConfigError(format!(
                    "Buffer capacity for {} must be greater than 0",
                    timescale.as_str()
                )));
            }
        }
        if !(self.buffers.peak_decay > 0.0 && self.buffers.peak_decay <= 1.0) {
            return Err(Error::ConfigError("Peak decay must be in (0, 1]".to_string()));
        }
        if self.buffers.zero_crossing_window == 0 {
            return Err(Error::ConfigError("Zero-crossing window must be greater than 0".to_string()));
        }
        if self.buffers.nominal_sample_rate <= 0.0 {
            return Err(Error::ConfigError("Nominal sample rate must be positive".to_string()));
        }

        // Features
        if self.features.pendulum_min_hz >= self.features.pendulum_max_hz {
            return Err(Error::ConfigError("Pendulum band minimum must be below its maximum".to_string()));
        }
        if !(self.features.rock_smoothing > 0.0 && self.features.rock_smoothing <= 1.0) {
            return Err(Error::ConfigError("Rock smoothing must be in (0, 1]".to_string()));
        }
        if self.features.rock_energy_ceiling <= 0.0 || self.features.toss_peak_threshold <= 0.0 {
            return Err(Error::ConfigError("Feature thresholds must be positive".to_string()));
        }

        // Neurons
        for kind in GestureKind::ALL {
            let params = self.neurons.params(kind);
            if !(params.leak > 0.0 && params.leak < 1.0) {
                return Err(Error::ConfigError(format!("Leak of {} neuron must be in (0, 1)", kind.as_str())));
            }
            if params.threshold <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "Threshold of {} neuron must be positive",
                    kind.as_str()
                )));
            }
        }

        // Stillness
        let s = &self.stillness;
        if s.deadzone <= 0.0 {
            return Err(Error::ConfigError("Deadzone must be positive".to_string()));
        }
        if !(0.0 < s.settling_secs
            && s.settling_secs < s.void_secs
            && s.void_secs < s.transcendent_secs
            && s.transcendent_secs <= s.max_stillness_secs)
        {
            return Err(Error::ConfigError(
                "Stillness thresholds must be positive and strictly increasing".to_string(),
            ));
        }
        if !(s.depth_smoothing > 0.0 && s.depth_smoothing <= 1.0) {
            return Err(Error::ConfigError("Depth smoothing must be in (0, 1]".to_string()));
        }
        if s.max_dt_secs <= 0.0 {
            return Err(Error::ConfigError("Maximum time step must be positive".to_string()));
        }

        // Fingerprint
        if !(self.fingerprint.learning_rate > 0.0 && self.fingerprint.learning_rate <= MAX_FINGERPRINT_RATE) {
            return Err(Error::ConfigError(format!(
                "Fingerprint learning rate must be in (0, {MAX_FINGERPRINT_RATE}]"
            )));
        }
        if self.fingerprint.save_interval_secs <= 0.0 {
            return Err(Error::ConfigError("Save interval must be positive".to_string()));
        }
        if self.fingerprint.storage_key.is_empty() {
            return Err(Error::ConfigError("Storage key must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Motion pipeline configuration

# Per-axis filtering and gravity separation
filter:
  axis_filter: "kalman"
  measurement_noise: 0.1
  process_noise: 0.05
  exponential_alpha: 0.5
  gravity_alpha: 0.98
  max_accel: 160.0

# Ring buffer capacities (Fibonacci timescales)
buffers:
  micro: 5
  short: 34
  medium: 233
  long: 1597
  peak_decay: 0.995
  zero_crossing_window: 60
  nominal_sample_rate: 60.0

# Feature derivation
features:
  shake_gain: 0.1
  sweep_epsilon: 0.001
  circle_gain: 1.0
  pendulum_min_hz: 0.3
  pendulum_max_hz: 3.0
  rock_smoothing: 0.1
  rock_gain: 0.5
  rock_energy_ceiling: 1.0
  toss_peak_threshold: 15.0
  toss_mean_ceiling: 2.0
  toss_input: 2.0

# Gesture neurons (leak, threshold, refractory period in samples)
neurons:
  stillness: { leak: 0.95, threshold: 15.0, refractory_period: 60 }
  shake: { leak: 0.85, threshold: 4.0, refractory_period: 20 }
  sweep: { leak: 0.9, threshold: 8.0, refractory_period: 30 }
  circle: { leak: 0.9, threshold: 10.0, refractory_period: 30 }
  pendulum: { leak: 0.97, threshold: 30.0, refractory_period: 60 }
  rock: { leak: 0.95, threshold: 5.0, refractory_period: 45 }
  toss: { leak: 0.5, threshold: 1.0, refractory_period: 60 }

# Stillness / void state
stillness:
  deadzone: 0.3
  settling_secs: 2.0
  void_secs: 5.0
  transcendent_secs: 15.0
  max_stillness_secs: 60.0
  depth_smoothing: 0.05
  breath_rate_hz: 0.15
  max_dt_secs: 1.0

# Motion fingerprint
fingerprint:
  learning_rate: 0.01
  save_interval_secs: 30.0
  storage_key: "motion_fingerprint"
"#;
