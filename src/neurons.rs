//! Leaky-integrate-and-fire gesture classifiers.
//!
//! Each gesture has one neuron fed by a single derived feature. Input
//! accumulates on a leaking membrane; crossing the threshold fires a spike,
//! resets the membrane and locks the neuron out for its refractory period.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::{NeuronConfig, NeuronParams};
use crate::constants::{FIRING_RATE_WINDOW_SECS, REFRACTORY_DECAY, SPIKE_HISTORY_LEN};
use crate::features::Features;

/// The seven recognised gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Stillness,
    Shake,
    Sweep,
    Circle,
    Pendulum,
    Rock,
    Toss,
}

impl GestureKind {
    pub const ALL: [Self; 7] = [
        Self::Stillness,
        Self::Shake,
        Self::Sweep,
        Self::Circle,
        Self::Pendulum,
        Self::Rock,
        Self::Toss,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stillness => "stillness",
            Self::Shake => "shake",
            Self::Sweep => "sweep",
            Self::Circle => "circle",
            Self::Pendulum => "pendulum",
            Self::Rock => "rock",
            Self::Toss => "toss",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// A single leaky-integrate-and-fire unit
#[derive(Debug, Clone)]
pub struct Neuron {
    params: NeuronParams,
    membrane: f64,
    refractory_counter: u32,
    spikes: VecDeque<f64>,
    total_spikes: u64,
}

impl Neuron {
    #[must_use]
    pub fn new(params: NeuronParams) -> Self {
        Self {
            params,
            membrane: 0.0,
            refractory_counter: 0,
            spikes: VecDeque::with_capacity(SPIKE_HISTORY_LEN),
            total_spikes: 0,
        }
    }

    /// Integrate one input at time `t`; returns true when the neuron fires.
    ///
    /// Negative and NaN inputs contribute nothing.
    pub fn integrate(&mut self, input: f64, t: f64) -> bool {
        if self.refractory_counter > 0 {
            self.refractory_counter -= 1;
            self.membrane *= REFRACTORY_DECAY;
            return false;
        }

        self.membrane = self.membrane.mul_add(self.params.leak, input.max(0.0));
        if self.membrane < self.params.threshold {
            return false;
        }

        self.membrane = 0.0;
        self.refractory_counter = self.params.refractory_period;
        // History stays in time order; a clock jump back starts it over
        if self.spikes.back().is_some_and(|&last| t < last) {
            self.spikes.clear();
        }
        if self.spikes.len() >= SPIKE_HISTORY_LEN {
            self.spikes.pop_front();
        }
        self.spikes.push_back(t);
        self.total_spikes += 1;
        true
    }

    /// Spikes per second over the trailing two seconds ending at `now`
    #[must_use]
    pub fn firing_rate(&self, now: f64) -> f64 {
        let since = now - FIRING_RATE_WINDOW_SECS;
        let recent = self.spikes.iter().rev().take_while(|&&t| t > since).count();
        recent as f64 / FIRING_RATE_WINDOW_SECS
    }

    #[must_use]
    pub fn membrane(&self) -> f64 {
        self.membrane
    }

    #[must_use]
    pub fn is_refractory(&self) -> bool {
        self.refractory_counter > 0
    }

    #[must_use]
    pub fn refractory_counter(&self) -> u32 {
        self.refractory_counter
    }

    #[must_use]
    pub fn params(&self) -> NeuronParams {
        self.params
    }

    /// Timestamps of the most recent spikes, oldest first
    pub fn spike_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.spikes.iter().copied()
    }

    #[must_use]
    pub fn last_spike(&self) -> Option<f64> {
        self.spikes.back().copied()
    }

    /// Spikes fired since creation or the last reset
    #[must_use]
    pub fn total_spikes(&self) -> u64 {
        self.total_spikes
    }

    pub fn reset(&mut self) {
        self.membrane = 0.0;
        self.refractory_counter = 0;
        self.spikes.clear();
        self.total_spikes = 0;
    }
}

/// One neuron per gesture kind
#[derive(Debug, Clone)]
pub struct GestureBank {
    neurons: [Neuron; 7],
}

impl GestureBank {
    #[must_use]
    pub fn new(config: &NeuronConfig) -> Self {
        Self {
            neurons: GestureKind::ALL.map(|kind| Neuron::new(config.params(kind))),
        }
    }

    /// Feed each neuron its feature; returns the gestures that fired
    pub fn integrate(&mut self, features: &Features, t: f64) -> Vec<GestureKind> {
        GestureKind::ALL
            .into_iter()
            .filter(|&kind| self.neurons[kind.index()].integrate(features.get(kind), t))
            .collect()
    }

    #[must_use]
    pub fn neuron(&self, kind: GestureKind) -> &Neuron {
        &self.neurons[kind.index()]
    }

    #[must_use]
    pub fn firing_rate(&self, kind: GestureKind, now: f64) -> f64 {
        self.neuron(kind).firing_rate(now)
    }

    pub fn reset(&mut self) {
        for neuron in &mut self.neurons {
            neuron.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_threshold_and_resets() {
        let mut neuron = Neuron::new(NeuronParams::new(0.5, 1.7, 3));

        assert!(!neuron.integrate(1.0, 0.0)); // 1.0
        assert!(!neuron.integrate(1.0, 0.1)); // 1.5
        assert!(neuron.integrate(1.0, 0.2)); // 1.75
        assert_eq!(neuron.membrane(), 0.0);
        assert_eq!(neuron.last_spike(), Some(0.2));
    }

    #[test]
    fn test_refractory_lockout() {
        let mut neuron = Neuron::new(NeuronParams::new(0.9, 1.0, 3));

        assert!(neuron.integrate(5.0, 0.0));
        assert_eq!(neuron.membrane(), 0.0);
        assert!(neuron.is_refractory());

        // Locked out for exactly three samples
        for i in 1..=3 {
            assert!(!neuron.integrate(5.0, f64::from(i) * 0.1));
        }
        assert!(!neuron.is_refractory());
        assert!(neuron.integrate(5.0, 0.4));
        assert_eq!(neuron.total_spikes(), 2);
    }

    #[test]
    fn test_negative_and_nan_input_ignored() {
        let mut neuron = Neuron::new(NeuronParams::new(0.9, 1.0, 0));
        assert!(!neuron.integrate(-10.0, 0.0));
        assert!(!neuron.integrate(f64::NAN, 0.1));
        assert_eq!(neuron.membrane(), 0.0);
    }

    #[test]
    fn test_firing_rate_window() {
        let mut neuron = Neuron::new(NeuronParams::new(0.5, 1.0, 0));
        neuron.integrate(2.0, 0.0);
        neuron.integrate(2.0, 1.0);
        neuron.integrate(2.0, 1.5);

        assert_eq!(neuron.firing_rate(1.5), 1.5);
        // The spike at t=0 has left the window
        assert_eq!(neuron.firing_rate(2.5), 1.0);
        assert_eq!(neuron.firing_rate(10.0), 0.0);
    }

    #[test]
    fn test_history_is_capped() {
        let mut neuron = Neuron::new(NeuronParams::new(0.5, 1.0, 0));
        for i in 0..100 {
            assert!(neuron.integrate(2.0, f64::from(i) * 0.01));
        }
        assert_eq!(neuron.spike_times().count(), SPIKE_HISTORY_LEN);
        assert_eq!(neuron.total_spikes(), 100);
        assert_eq!(neuron.last_spike(), Some(f64::from(99) * 0.01));
    }

    #[test]
    fn test_clock_jump_back_restarts_history() {
        let mut neuron = Neuron::new(NeuronParams::new(0.5, 1.0, 0));
        assert!(neuron.integrate(2.0, 999.5));
        assert!(neuron.integrate(2.0, 1000.0));
        assert!(neuron.integrate(2.0, 0.0));

        let times: Vec<f64> = neuron.spike_times().collect();
        assert_eq!(times, vec![0.0]);
        assert_eq!(neuron.firing_rate(0.0), 0.5);
        assert!(neuron.integrate(2.0, 0.5));
        assert_eq!(neuron.firing_rate(0.5), 1.0);
        assert_eq!(neuron.total_spikes(), 4);
    }

    #[test]
    fn test_bank_routes_features() {
        let mut bank = GestureBank::new(&NeuronConfig::default());
        let features = Features {
            toss: 2.0,
            ..Features::default()
        };
        let fired = bank.integrate(&features, 0.0);
        assert_eq!(fired, vec![GestureKind::Toss]);
        assert!(bank.neuron(GestureKind::Toss).is_refractory());
        assert!(!bank.neuron(GestureKind::Shake).is_refractory());
    }
}
