//! End-to-end tests of the motion pipeline on synthetic recordings

mod test_helpers;

use motion_sense::config::EXAMPLE_CONFIG;
use motion_sense::{Config, GestureKind, MotionEvent, Sample, Timescale, VoidState};
use test_helpers::{
    create_pipeline_with, create_test_pipeline, generate, run, shake_samples, spikes_of, still_samples,
    void_transitions,
};

#[test]
fn test_stillness_reaches_void() {
    let (mut pipeline, rx) = create_test_pipeline().unwrap();
    let events = run(&mut pipeline, &rx, &still_samples(16.0, 6.0, 0.0));

    let transitions = void_transitions(&events);
    assert_eq!(transitions.len(), 2, "{transitions:?}");

    let (from, to, t) = transitions[0];
    assert_eq!((from, to), (VoidState::Present, VoidState::Settling));
    assert!((t - 2.0).abs() <= 1.0 / 16.0 + 1e-9);

    let (from, to, t) = transitions[1];
    assert_eq!((from, to), (VoidState::Settling, VoidState::Void));
    assert!((t - 5.0).abs() <= 1.0 / 16.0 + 1e-9);

    // A still device only ever excites the stillness neuron
    for spike in events.iter().filter_map(MotionEvent::as_spike) {
        assert_eq!(spike.neuron, GestureKind::Stillness);
    }
    assert!(spikes_of(&events, GestureKind::Stillness) > 0);
    assert!(pipeline.void_depth() > 0.0 && pipeline.void_depth() < 1.0);
}

#[test]
fn test_shake_fires_shake_neuron() {
    let (mut pipeline, rx) = create_test_pipeline().unwrap();
    let events = run(&mut pipeline, &rx, &shake_samples(60.0, 1.0, 0.0, 5.0, 8.0));

    let shakes: Vec<_> = events
        .iter()
        .filter_map(MotionEvent::as_spike)
        .filter(|spike| spike.neuron == GestureKind::Shake)
        .collect();
    assert!(!shakes.is_empty());
    assert!(shakes.iter().all(|spike| spike.firing_rate > 0.0 && spike.energy > 0.0));

    assert_eq!(spikes_of(&events, GestureKind::Pendulum), 0);
    assert_eq!(spikes_of(&events, GestureKind::Rock), 0);
    assert_eq!(pipeline.void_state(), VoidState::Present);
    assert!(pipeline.signature().gesture_count(GestureKind::Shake) >= 1);
}

#[test]
fn test_gravity_separation_after_reorientation() {
    let (mut pipeline, rx) = create_test_pipeline().unwrap();
    let mut samples = vec![Sample::new(0.0, 9.81, 0.0, 0.0)];
    samples.extend(generate(60.0, 10.0, 1.0 / 60.0, |_| [0.0, 0.0, 9.81]));
    run(&mut pipeline, &rx, &samples);

    assert!(pipeline.linear_accel().norm() < 0.05);
    assert!((pipeline.gravity().z - 9.81).abs() < 0.05);
}

#[test]
fn test_twenty_seconds_of_stillness() {
    let (mut pipeline, rx) = create_test_pipeline().unwrap();
    let mut last_depth = 0.0;
    let mut states = Vec::new();

    for sample in still_samples(20.0, 20.0, 0.0) {
        pipeline.process(&sample);
        for event in rx.try_iter() {
            if let Some(void) = event.as_void() {
                states.push(void.state);
            }
        }
        assert!(pipeline.void_depth() >= last_depth);
        last_depth = pipeline.void_depth();
    }

    assert_eq!(
        states,
        vec![VoidState::Settling, VoidState::Void, VoidState::Transcendent]
    );
    assert!(last_depth > 0.5);
    assert!((0.0..std::f64::consts::TAU).contains(&pipeline.void_breath_phase()));
}

#[test]
fn test_jostle_halves_stillness() {
    let (mut pipeline, rx) = create_test_pipeline().unwrap();
    run(&mut pipeline, &rx, &still_samples(20.0, 10.0, 0.0));
    let before = pipeline.void_stillness_time();
    assert!(before > 9.0);

    pipeline.process(&Sample::new(20.0, 0.0, 9.81, 10.0));
    assert!(pipeline.magnitude() > pipeline.config().stillness.deadzone);
    assert!((pipeline.void_stillness_time() - before / 2.0).abs() < 1e-9);

    // Depth is smoothed, it does not fall off a cliff
    assert!(pipeline.void_depth() > 0.3);
}

#[test]
fn test_fingerprint_learns_slowly() {
    let (mut pipeline, rx) = create_test_pipeline().unwrap();
    run(&mut pipeline, &rx, &shake_samples(60.0, 5.0, 0.0, 5.0, 8.0));

    let signature = pipeline.signature();
    assert_eq!(signature.sample_count, 300);
    assert!(signature.avg_energy > 0.0);
    assert!(signature.avg_energy < pipeline.buffer(Timescale::Short).energy());
    assert!(signature.avg_frequency > 0.0);
    assert!(signature.peak_variance > 0.0);
    assert!(!pipeline.is_returning_user());
}

#[test]
fn test_pipeline_from_example_config() {
    let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
    config.validate().unwrap();

    let (mut pipeline, rx) = create_pipeline_with(config).unwrap();
    let events = run(&mut pipeline, &rx, &still_samples(16.0, 3.0, 0.0));
    assert_eq!(void_transitions(&events).len(), 1);
}

#[test]
fn test_exponential_axis_filter_pipeline() {
    let mut config = Config::default();
    config.filter.axis_filter = "exponential:0.8".to_string();
    let (mut pipeline, rx) = create_pipeline_with(config).unwrap();

    let events = run(&mut pipeline, &rx, &shake_samples(60.0, 2.0, 0.0, 5.0, 8.0));
    assert!(spikes_of(&events, GestureKind::Shake) > 0);
}

#[test]
fn test_event_json_lines() {
    let (mut pipeline, rx) = create_test_pipeline().unwrap();
    let events = run(&mut pipeline, &rx, &still_samples(16.0, 3.0, 0.0));

    let lines: Vec<String> = events.iter().map(|e| serde_json::to_string(e).unwrap()).collect();
    assert!(lines.iter().any(|line| line.contains(r#""event":"motion.void""#)));
    assert!(lines.iter().any(|line| line.contains(r#""state":"SETTLING""#)));
}
