//! Helper functions and utilities for tests
#![allow(dead_code)]

use std::f64::consts::TAU;

use motion_sense::constants::STANDARD_GRAVITY;
use motion_sense::{Config, MotionEvent, MotionPipeline, Result, Sample, GestureKind, VoidState};
use std::sync::mpsc::{self, Receiver};

/// Standard gravity along +z, device lying flat
pub const REST: [f64; 3] = [0.0, 0.0, STANDARD_GRAVITY];

/// Pipeline with default configuration whose events arrive on the returned channel
pub fn create_test_pipeline() -> Result<(MotionPipeline, Receiver<MotionEvent>)> {
    create_pipeline_with(Config::default())
}

pub fn create_pipeline_with(config: Config) -> Result<(MotionPipeline, Receiver<MotionEvent>)> {
    let (tx, rx) = mpsc::channel::<MotionEvent>();
    Ok((MotionPipeline::new(config)?.with_sink(tx), rx))
}

/// `seconds` of samples at `rate_hz`, starting at `start`, shaped by `accel(t)`
pub fn generate<F>(rate_hz: f64, seconds: f64, start: f64, accel: F) -> Vec<Sample>
where
    F: Fn(f64) -> [f64; 3],
{
    let count = (seconds * rate_hz).round() as usize;
    (0..count)
        .map(|i| {
            let t = start + i as f64 / rate_hz;
            let [x, y, z] = accel(t - start);
            Sample::new(x, y, z, t)
        })
        .collect()
}

/// Device at rest with tiny sensor noise
pub fn still_samples(rate_hz: f64, seconds: f64, start: f64) -> Vec<Sample> {
    generate(rate_hz, seconds, start, |t| [0.01 * (t * 97.0).sin(), 0.0, REST[2]])
}

/// Sinusoidal shake along x on top of gravity
pub fn shake_samples(rate_hz: f64, seconds: f64, start: f64, amplitude: f64, freq_hz: f64) -> Vec<Sample> {
    generate(rate_hz, seconds, start, move |t| [amplitude * (TAU * freq_hz * t).sin(), 0.0, REST[2]])
}

/// Run samples through the pipeline and collect every event they produced
pub fn run(pipeline: &mut MotionPipeline, rx: &Receiver<MotionEvent>, samples: &[Sample]) -> Vec<MotionEvent> {
    let mut events = Vec::new();
    for sample in samples {
        pipeline.process(sample);
        events.extend(rx.try_iter());
    }
    events
}

pub fn spikes_of(events: &[MotionEvent], kind: GestureKind) -> usize {
    events
        .iter()
        .filter_map(MotionEvent::as_spike)
        .filter(|spike| spike.neuron == kind)
        .count()
}

/// `(from, to, timestamp)` of every void transition
pub fn void_transitions(events: &[MotionEvent]) -> Vec<(VoidState, VoidState, f64)> {
    events
        .iter()
        .filter_map(MotionEvent::as_void)
        .map(|void| (void.prev_state, void.state, void.timestamp))
        .collect()
}

/// Unique scratch directory under the system temp dir
pub fn temp_store_dir(name: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("motion-sense-{name}-{}-{nanos}", std::process::id()))
}
