//! Per-sample motion pipeline.
//!
//! `MotionPipeline` owns every piece of mutable state: axis filters, gravity
//! estimator, statistics buffers, gesture neurons, stillness machine and the
//! fingerprint. Each call to [`MotionPipeline::process`] runs the full chain
//! once in bounded time:
//!
//! raw → axis filters → gravity separation → buffers → features → neurons
//! → stillness machine → fingerprint (periodically persisted)
//!
//! Events go to the injected [`EventSink`]. Persistence goes through the
//! injected [`FingerprintStore`], which runs on a background [`StoreWriter`]
//! thread so saves never block `process`. Nothing in `process` returns an
//! error or panics on bad input.

use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::events::{EventSink, MotionEvent, NullSink, SpikeEvent, VoidEvent};
use crate::features::{FeatureExtractor, FeatureInputs, Features};
use crate::filters::gravity::GravityEstimator;
use crate::filters::SignalFilter;
use crate::fingerprint::{Axis, FingerprintStore, MotionFingerprint};
use crate::neurons::{GestureBank, GestureKind, Neuron};
use crate::stat_buffer::{StatBuffer, Timescale};
use crate::stillness::{StillnessMachine, VoidState};
use crate::utils::finite_or_zero;
use crate::writer::StoreWriter;
use crate::Result;

/// Device orientation in degrees (alpha: heading, beta/gamma: tilt)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Orientation {
    /// The orientation if every field is finite
    #[must_use]
    pub fn sanitized(self) -> Option<Self> {
        [self.alpha, self.beta, self.gamma]
            .iter()
            .all(|v| v.is_finite())
            .then_some(self)
    }
}

/// One accelerometer reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Raw acceleration in m/s², gravity included
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub orientation: Option<Orientation>,
    /// Seconds
    pub timestamp: f64,
}

impl Sample {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64, timestamp: f64) -> Self {
        Self {
            x,
            y,
            z,
            orientation: None,
            timestamp,
        }
    }

    #[must_use]
    pub fn with_orientation(mut self, alpha: f64, beta: f64, gamma: f64) -> Self {
        self.orientation = Some(Orientation { alpha, beta, gamma });
        self
    }
}

/// The motion analysis context
pub struct MotionPipeline {
    config: Config,
    axis_filters: Vec<Box<dyn SignalFilter>>,
    gravity: GravityEstimator,
    scalars: [StatBuffer; 4],
    axes: [StatBuffer; 3],
    extractor: FeatureExtractor,
    neurons: GestureBank,
    stillness: StillnessMachine,
    fingerprint: MotionFingerprint,
    writer: Option<StoreWriter>,
    sink: Box<dyn EventSink>,
    initialized: bool,
    last_t: Option<f64>,
    last_save_t: Option<f64>,
    features: Features,
    magnitude: f64,
}

impl MotionPipeline {
    /// Build a pipeline with no event sink and no persistence
    ///
    /// # Errors
    ///
    /// Returns `Error::FilterError` if the configured axis filter is unknown
    pub fn new(config: Config) -> Result<Self> {
        let axis_filters = (0..3).map(|_| config.create_axis_filter()).collect::<Result<Vec<_>>>()?;

        let buffer = |capacity: usize| {
            StatBuffer::with_params(
                capacity,
                config.buffers.peak_decay,
                config.buffers.zero_crossing_window,
                config.buffers.nominal_sample_rate,
            )
        };
        let scalars = Timescale::ALL.map(|timescale| buffer(config.buffers.capacity(timescale)));
        let axes = Axis::ALL.map(|_| buffer(config.buffers.short));

        Ok(Self {
            axis_filters,
            gravity: GravityEstimator::new(config.filter.gravity_alpha),
            scalars,
            axes,
            extractor: FeatureExtractor::new(config.features.clone(), config.stillness.deadzone),
            neurons: GestureBank::new(&config.neurons),
            stillness: StillnessMachine::new(config.stillness.clone()),
            fingerprint: MotionFingerprint::new(),
            writer: None,
            sink: Box::new(NullSink),
            initialized: false,
            last_t: None,
            last_save_t: None,
            features: Features::default(),
            magnitude: 0.0,
            config,
        })
    }

    /// Route events to `sink`
    #[must_use]
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Persist the fingerprint through `store` on a background thread
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the writer thread cannot be spawned
    pub fn with_store(mut self, store: impl FingerprintStore + Send + 'static) -> Result<Self> {
        self.writer = Some(StoreWriter::spawn(store)?);
        Ok(self)
    }

    /// Load a previously saved fingerprint. Idempotent; failures leave a new-user profile.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let loaded = self.writer.as_ref().map_or(Ok(None), StoreWriter::load);
        match loaded {
            Ok(Some(fingerprint)) => {
                info!(
                    "Loaded motion fingerprint ({} samples, preferred axis {:?})",
                    fingerprint.sample_count, fingerprint.preferred_axis
                );
                self.fingerprint = fingerprint;
            }
            Ok(None) => info!("No stored motion fingerprint, starting fresh"),
            Err(e) => warn!("Ignoring unreadable motion fingerprint: {e}"),
        }
    }

    /// Run one sample through the whole pipeline
    pub fn process(&mut self, sample: &Sample) {
        self.init();

        let t = self.timestamp(sample.timestamp);
        let max = self.config.filter.max_accel;
        let raw = [sample.x, sample.y, sample.z].map(|v| finite_or_zero(v).max(-max).min(max));
        let orientation = sample.orientation.and_then(Orientation::sanitized);

        let filtered = Vector3::from_iterator(
            self.axis_filters
                .iter_mut()
                .zip(raw)
                .map(|(filter, value)| filter.apply(value)),
        );
        let linear = self.gravity.update(filtered);
        self.magnitude = linear.norm();

        for buffer in &mut self.scalars {
            buffer.push(self.magnitude, t);
        }
        for (buffer, value) in self.axes.iter_mut().zip(linear.iter()) {
            buffer.push(*value, t);
        }

        self.features = self.extractor.extract(&FeatureInputs {
            micro: &self.scalars[Timescale::Micro.index()],
            short: &self.scalars[Timescale::Short.index()],
            medium: &self.scalars[Timescale::Medium.index()],
            axes: [&self.axes[0], &self.axes[1], &self.axes[2]],
            orientation,
        });

        let energy = self.scalars[Timescale::Micro.index()].energy();
        for kind in self.neurons.integrate(&self.features, t) {
            self.fingerprint.record_gesture(kind);
            let firing_rate = self.neurons.firing_rate(kind, t);
            debug!("Spike: {} (rate {:.2} Hz, energy {:.3})", kind.as_str(), firing_rate, energy);
            self.sink.emit(MotionEvent::Spike(SpikeEvent {
                neuron: kind,
                firing_rate,
                energy,
                magnitude: self.magnitude,
                timestamp: t,
            }));
        }

        if let Some(transition) = self.stillness.update(self.magnitude, t) {
            self.sink.emit(MotionEvent::Void(VoidEvent {
                state: transition.to,
                prev_state: transition.from,
                depth: transition.depth,
                stillness_time: transition.stillness_time,
                timestamp: t,
            }));
        }

        let short = self.scalars[Timescale::Short.index()].stats();
        self.fingerprint.update(
            short.energy,
            short.frequency,
            short.variance,
            &linear,
            self.config.fingerprint.learning_rate,
        );

        match self.last_save_t {
            None => self.last_save_t = Some(t),
            Some(last) if t - last >= self.config.fingerprint.save_interval_secs => {
                self.last_save_t = Some(t);
                self.save();
            }
            Some(_) => {}
        }
    }

    /// Save the fingerprint and wait for the write to finish. Failures are
    /// logged, never returned.
    pub fn flush(&mut self) {
        self.save();
        if let Some(writer) = &self.writer {
            writer.sync();
        }
    }

    /// Clear all signal state; the learned fingerprint is kept
    pub fn reset(&mut self) {
        for filter in &mut self.axis_filters {
            filter.reset();
        }
        self.gravity.reset();
        for buffer in self.scalars.iter_mut().chain(self.axes.iter_mut()) {
            buffer.clear();
        }
        self.extractor.reset();
        self.neurons.reset();
        self.stillness.reset();
        self.last_t = None;
        self.features = Features::default();
        self.magnitude = 0.0;
    }

    /// Statistics buffer of one scalar timescale
    #[must_use]
    pub fn buffer(&self, timescale: Timescale) -> &StatBuffer {
        &self.scalars[timescale.index()]
    }

    /// Short-capacity buffer of one linear acceleration axis
    #[must_use]
    pub fn axis_buffer(&self, axis: Axis) -> &StatBuffer {
        &self.axes[axis.index()]
    }

    #[must_use]
    pub fn void_state(&self) -> VoidState {
        self.stillness.state()
    }

    #[must_use]
    pub fn void_depth(&self) -> f64 {
        self.stillness.depth()
    }

    #[must_use]
    pub fn void_breath_phase(&self) -> f64 {
        self.stillness.breath_phase()
    }

    #[must_use]
    pub fn void_stillness_time(&self) -> f64 {
        self.stillness.stillness_time()
    }

    /// Linear acceleration of the last sample
    #[must_use]
    pub fn linear_accel(&self) -> Vector3<f64> {
        self.gravity.linear()
    }

    #[must_use]
    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity.gravity()
    }

    /// Linear magnitude of the last sample
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// The user's motion fingerprint
    #[must_use]
    pub fn signature(&self) -> &MotionFingerprint {
        &self.fingerprint
    }

    #[must_use]
    pub fn is_returning_user(&self) -> bool {
        self.fingerprint.is_returning
    }

    /// Features computed for the last sample
    #[must_use]
    pub fn features(&self) -> &Features {
        &self.features
    }

    #[must_use]
    pub fn neuron(&self, kind: GestureKind) -> &Neuron {
        self.neurons.neuron(kind)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn timestamp(&mut self, raw: f64) -> f64 {
        let t = match (raw.is_finite(), self.last_t) {
            (true, _) => raw,
            (false, Some(last)) => last,
            (false, None) => 0.0,
        };
        if let Some(last) = self.last_t {
            if t < last {
                warn!("Timestamp went backwards ({t:.3}s after {last:.3}s)");
                // Re-anchor so the save interval counts from the new clock
                self.last_save_t = Some(t);
            }
        }
        self.last_t = Some(t);
        t
    }

    fn save(&self) {
        if let Some(writer) = &self.writer {
            writer.save(&self.fingerprint);
        }
    }
}
