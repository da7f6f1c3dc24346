//! Constants used throughout the library

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Nominal sensor rate, used only before real timestamps are available
pub const DEFAULT_SAMPLE_RATE: f64 = 60.0;

/// Fibonacci buffer capacities for the four scalar timescales
pub const MICRO_CAPACITY: usize = 5;
pub const SHORT_CAPACITY: usize = 34;
pub const MEDIUM_CAPACITY: usize = 233;
pub const LONG_CAPACITY: usize = 1597;

/// Per-sample multiplicative decay of the running peak
pub const DEFAULT_PEAK_DECAY: f64 = 0.995;

/// Upper bound on the zero-crossing sub-window
pub const MAX_ZERO_CROSSING_WINDOW: usize = 60;

/// Default axis filter noise parameters
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 0.1;
pub const DEFAULT_PROCESS_NOISE: f64 = 0.05;

/// Default complementary filter coefficient for gravity
pub const DEFAULT_GRAVITY_ALPHA: f64 = 0.98;

/// Bound on raw acceleration per axis, about 16 g (full scale of common IMUs)
pub const DEFAULT_MAX_ACCEL: f64 = 160.0;

/// Default exponential filter alpha
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.5;

/// Linear acceleration magnitude (m/s²) below which the device counts as still
pub const DEFAULT_DEADZONE: f64 = 0.3;

/// Stillness thresholds in seconds
pub const SETTLING_SECS: f64 = 2.0;
pub const VOID_SECS: f64 = 5.0;
pub const TRANSCENDENT_SECS: f64 = 15.0;
pub const MAX_STILLNESS_SECS: f64 = 60.0;

/// Per-sample blend of void depth toward its target
pub const DEFAULT_DEPTH_SMOOTHING: f64 = 0.05;

/// Breath oscillator rate in Hz
pub const DEFAULT_BREATH_RATE: f64 = 0.15;

/// Largest time step accepted between samples
pub const MAX_DT_SECS: f64 = 1.0;

/// Trailing window for neuron firing rates
pub const FIRING_RATE_WINDOW_SECS: f64 = 2.0;

/// Spike timestamps kept per neuron
pub const SPIKE_HISTORY_LEN: usize = 30;

/// Membrane decay applied while refractory
pub const REFRACTORY_DECAY: f64 = 0.5;

/// Fingerprint learning rate ceiling
pub const MAX_FINGERPRINT_RATE: f64 = 0.01;

/// Decay applied to peak variance when no new maximum is seen
pub const PEAK_VARIANCE_DECAY: f64 = 0.99;

/// Fingerprint persistence interval
pub const DEFAULT_SAVE_INTERVAL_SECS: f64 = 30.0;

/// Storage key of the persisted fingerprint
pub const FINGERPRINT_KEY: &str = "motion_fingerprint";
