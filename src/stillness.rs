//! Stillness state machine and continuous void depth.
//!
//! A stillness timer accumulates real elapsed time while the linear
//! magnitude stays under the deadzone and halves on any movement, so a
//! momentary jostle costs half the accumulated stillness instead of all of it.
//! The discrete state is a function of the timer; `depth` follows a per-state
//! target through a low-pass filter and never jumps.

use std::f64::consts::TAU;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::StillnessConfig;

/// Discrete stillness level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoidState {
    Present,
    Settling,
    Void,
    Transcendent,
}

impl VoidState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Settling => "SETTLING",
            Self::Void => "VOID",
            Self::Transcendent => "TRANSCENDENT",
        }
    }
}

impl fmt::Display for VoidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change of discrete state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoidTransition {
    pub from: VoidState,
    pub to: VoidState,
    pub depth: f64,
    pub stillness_time: f64,
}

/// Stillness timer, state, depth and breath oscillator
#[derive(Debug, Clone)]
pub struct StillnessMachine {
    config: StillnessConfig,
    state: VoidState,
    timer: f64,
    depth: f64,
    breath_phase: f64,
    last_t: Option<f64>,
}

impl StillnessMachine {
    #[must_use]
    pub fn new(config: StillnessConfig) -> Self {
        Self {
            config,
            state: VoidState::Present,
            timer: 0.0,
            depth: 0.0,
            breath_phase: 0.0,
            last_t: None,
        }
    }

    /// Advance with the instantaneous linear magnitude observed at `t` seconds.
    ///
    /// Returns the transition when the discrete state changed.
    pub fn update(&mut self, magnitude: f64, t: f64) -> Option<VoidTransition> {
        let dt = self
            .last_t
            .map_or(0.0, |last| (t - last).clamp(0.0, self.config.max_dt_secs));
        self.last_t = Some(self.last_t.map_or(t, |last| last.max(t)));

        if magnitude < self.config.deadzone {
            self.timer += dt;
        } else {
            self.timer *= 0.5;
        }
        self.timer = self.timer.clamp(0.0, self.config.max_stillness_secs);

        let target = self.target_depth();
        self.depth += (target - self.depth) * self.config.depth_smoothing;
        self.depth = self.depth.clamp(0.0, 1.0);

        self.breath_phase = TAU.mul_add(self.config.breath_rate_hz * dt, self.breath_phase).rem_euclid(TAU);

        let state = self.classify(self.timer);
        if state == self.state {
            return None;
        }

        let transition = VoidTransition {
            from: self.state,
            to: state,
            depth: self.depth,
            stillness_time: self.timer,
        };
        debug!(
            "Void transition {} -> {} (depth {:.3}, stillness {:.2}s)",
            transition.from, transition.to, transition.depth, transition.stillness_time
        );
        self.state = state;
        Some(transition)
    }

    /// Discrete state for a stillness time
    #[must_use]
    pub fn classify(&self, stillness_secs: f64) -> VoidState {
        let c = &self.config;
        if stillness_secs >= c.transcendent_secs {
            VoidState::Transcendent
        } else if stillness_secs >= c.void_secs {
            VoidState::Void
        } else if stillness_secs >= c.settling_secs {
            VoidState::Settling
        } else {
            VoidState::Present
        }
    }

    /// Depth the machine is currently easing toward
    #[must_use]
    pub fn target_depth(&self) -> f64 {
        let c = &self.config;
        let t = self.timer;
        match self.classify(t) {
            VoidState::Present => 0.0,
            VoidState::Settling => 0.5 * (t - c.settling_secs) / (c.void_secs - c.settling_secs),
            VoidState::Void => 0.5 + 0.5 * (t - c.void_secs) / (c.transcendent_secs - c.void_secs),
            VoidState::Transcendent => 1.0,
        }
    }

    #[must_use]
    pub fn state(&self) -> VoidState {
        self.state
    }

    #[must_use]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Seconds of accumulated stillness
    #[must_use]
    pub fn stillness_time(&self) -> f64 {
        self.timer
    }

    /// Breath oscillator phase in [0, 2π)
    #[must_use]
    pub fn breath_phase(&self) -> f64 {
        self.breath_phase
    }

    pub fn reset(&mut self) {
        self.state = VoidState::Present;
        self.timer = 0.0;
        self.depth = 0.0;
        self.breath_phase = 0.0;
        self.last_t = None;
    }
}
