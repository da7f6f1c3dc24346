//! Events emitted by the pipeline and the sinks that receive them.
//!
//! The pipeline never consumes its own events; they are notifications for
//! downstream collaborators, injected as an `EventSink`.

use std::sync::mpsc::Sender;

use serde::Serialize;

use crate::neurons::GestureKind;
use crate::stillness::VoidState;

/// A gesture neuron fired
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpikeEvent {
    pub neuron: GestureKind,
    /// Spikes per second over the trailing two seconds
    pub firing_rate: f64,
    /// Micro-timescale RMS of the linear magnitude
    pub energy: f64,
    /// Linear magnitude of the triggering sample
    pub magnitude: f64,
    pub timestamp: f64,
}

/// The stillness machine changed state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidEvent {
    pub state: VoidState,
    pub prev_state: VoidState,
    pub depth: f64,
    pub stillness_time: f64,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum MotionEvent {
    #[serde(rename = "motion.spike")]
    Spike(SpikeEvent),
    #[serde(rename = "motion.void")]
    Void(VoidEvent),
}

impl MotionEvent {
    /// Bus topic of the event
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Spike(_) => "motion.spike",
            Self::Void(_) => "motion.void",
        }
    }

    #[must_use]
    pub fn as_spike(&self) -> Option<&SpikeEvent> {
        match self {
            Self::Spike(spike) => Some(spike),
            Self::Void(_) => None,
        }
    }

    #[must_use]
    pub fn as_void(&self) -> Option<&VoidEvent> {
        match self {
            Self::Void(void) => Some(void),
            Self::Spike(_) => None,
        }
    }
}

/// Receiver of pipeline events. Must not call back into the pipeline.
pub trait EventSink {
    fn emit(&mut self, event: MotionEvent);
}

/// Discards every event
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: MotionEvent) {}
}

impl EventSink for Vec<MotionEvent> {
    fn emit(&mut self, event: MotionEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<MotionEvent> {
    fn emit(&mut self, event: MotionEvent) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.send(event);
    }
}

impl<F: FnMut(MotionEvent)> EventSink for F {
    fn emit(&mut self, event: MotionEvent) {
        self(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn spike() -> MotionEvent {
        MotionEvent::Spike(SpikeEvent {
            neuron: GestureKind::Shake,
            firing_rate: 1.5,
            energy: 2.0,
            magnitude: 3.0,
            timestamp: 4.0,
        })
    }

    #[test]
    fn test_event_json_layout() {
        let json = serde_json::to_value(spike()).unwrap();
        assert_eq!(json["event"], "motion.spike");
        assert_eq!(json["neuron"], "shake");
        assert_eq!(json["firingRate"], 1.5);

        let void = MotionEvent::Void(VoidEvent {
            state: VoidState::Settling,
            prev_state: VoidState::Present,
            depth: 0.1,
            stillness_time: 2.0,
            timestamp: 2.0,
        });
        let json = serde_json::to_value(&void).unwrap();
        assert_eq!(json["event"], "motion.void");
        assert_eq!(json["state"], "SETTLING");
        assert_eq!(json["prevState"], "PRESENT");
        assert_eq!(json["stillnessTime"], 2.0);
    }

    #[test]
    fn test_sinks() {
        let mut collected: Vec<MotionEvent> = Vec::new();
        collected.emit(spike());
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].name(), "motion.spike");

        let (mut tx, rx) = mpsc::channel::<MotionEvent>();
        tx.emit(spike());
        assert!(rx.try_recv().unwrap().as_spike().is_some());

        let mut count = 0;
        {
            let mut counter = |_event: MotionEvent| count += 1;
            counter.emit(spike());
            counter.emit(spike());
        }
        assert_eq!(count, 2);

        // Sender with no receiver must not panic
        drop(rx);
        tx.emit(spike());
    }
}
