//! Persisted per-user motion fingerprint.
//!
//! The fingerprint is a slowly updated statistical profile of how a user
//! moves: average energy and frequency, a peak-variance envelope, the axis
//! they favour and how often each gesture fires. It is stored as JSON under
//! a single key through a `FingerprintStore`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{FINGERPRINT_KEY, MAX_FINGERPRINT_RATE, PEAK_VARIANCE_DECAY};
use crate::neurons::GestureKind;
use crate::Result;

/// Acceleration axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Axis with the largest absolute component; ties go to the earlier axis
    #[must_use]
    pub fn dominant(v: &Vector3<f64>) -> Self {
        let mut best = Self::X;
        for axis in [Self::Y, Self::Z] {
            if v[axis.index()].abs() > v[best.index()].abs() {
                best = axis;
            }
        }
        best
    }
}

/// Statistical profile of one user's movement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MotionFingerprint {
    pub avg_energy: f64,
    pub avg_frequency: f64,
    pub peak_variance: f64,
    pub preferred_axis: Axis,
    pub gesture_profile: BTreeMap<String, u64>,
    pub sample_count: u64,
    pub is_returning: bool,
    // Decayed votes behind preferred_axis, rebuilt from it after a load
    #[serde(skip)]
    axis_votes: [f64; 3],
}

impl MotionFingerprint {
    /// Fresh profile for a new user
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blend one sample's short-timescale statistics into the profile.
    ///
    /// `rate` is clamped to at most 1% per sample. Non-finite statistics are
    /// skipped so the persisted averages always stay finite.
    pub fn update(&mut self, energy: f64, frequency: f64, variance: f64, linear: &Vector3<f64>, rate: f64) {
        let rate = rate.clamp(0.0, MAX_FINGERPRINT_RATE);

        if energy.is_finite() {
            self.avg_energy += (energy - self.avg_energy) * rate;
        }
        if frequency.is_finite() {
            self.avg_frequency += (frequency - self.avg_frequency) * rate;
        }

        if variance.is_finite() && variance > self.peak_variance {
            self.peak_variance = variance;
        } else {
            self.peak_variance *= PEAK_VARIANCE_DECAY;
        }

        let dominant = Axis::dominant(linear);
        for axis in Axis::ALL {
            let vote = if axis == dominant { 1.0 } else { 0.0 };
            let slot = &mut self.axis_votes[axis.index()];
            *slot += (vote - *slot) * rate;
        }
        self.preferred_axis = Axis::ALL
            .into_iter()
            .fold(self.preferred_axis, |best, axis| {
                if self.axis_votes[axis.index()] > self.axis_votes[best.index()] {
                    axis
                } else {
                    best
                }
            });

        self.sample_count += 1;
    }

    /// Count one fire of a gesture neuron
    pub fn record_gesture(&mut self, kind: GestureKind) {
        *self.gesture_profile.entry(kind.as_str().to_string()).or_insert(0) += 1;
    }

    /// Fires recorded for one gesture
    #[must_use]
    pub fn gesture_count(&self, kind: GestureKind) -> u64 {
        self.gesture_profile.get(kind.as_str()).copied().unwrap_or(0)
    }

    /// Decayed vote weight behind each axis
    #[must_use]
    pub fn axis_votes(&self) -> [f64; 3] {
        self.axis_votes
    }

    /// Mark as loaded from storage and rebuild in-memory state
    fn restored(mut self) -> Self {
        self.is_returning = true;
        self.axis_votes = [0.0; 3];
        self.axis_votes[self.preferred_axis.index()] = 1.0;
        self
    }

    /// Serialize to the persisted JSON layout
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails
    pub fn to_json(&self) -> Result<String> {
        let persisted = Self {
            is_returning: true,
            ..self.clone()
        };
        Ok(serde_json::to_string(&persisted)?)
    }

    /// Parse the persisted JSON layout
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` for corrupt data
    pub fn from_json(json: &str) -> Result<Self> {
        let fingerprint: Self = serde_json::from_str(json)?;
        Ok(fingerprint.restored())
    }
}

/// Persistence collaborator for the fingerprint
pub trait FingerprintStore {
    /// Stored fingerprint, `None` when nothing has been saved yet
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unreadable or the data corrupt
    fn load(&self) -> Result<Option<MotionFingerprint>>;

    /// Persist the fingerprint, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejects the write
    fn save(&mut self, fingerprint: &MotionFingerprint) -> Result<()>;
}

/// Store that remembers nothing
pub struct NullStore;

impl FingerprintStore for NullStore {
    fn load(&self) -> Result<Option<MotionFingerprint>> {
        Ok(None)
    }

    fn save(&mut self, _fingerprint: &MotionFingerprint) -> Result<()> {
        Ok(())
    }
}

/// In-memory key/value store holding the serialized JSON
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    key: String,
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_key(FINGERPRINT_KEY)
    }

    #[must_use]
    pub fn with_key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Raw stored value
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.entries.get(&self.key).map(String::as_str)
    }

    /// Overwrite the raw stored value
    pub fn set_raw(&mut self, value: impl Into<String>) {
        self.entries.insert(self.key.clone(), value.into());
    }
}

impl FingerprintStore for MemoryStore {
    fn load(&self) -> Result<Option<MotionFingerprint>> {
        self.raw().map(MotionFingerprint::from_json).transpose()
    }

    fn save(&mut self, fingerprint: &MotionFingerprint) -> Result<()> {
        let json = fingerprint.to_json()?;
        self.set_raw(json);
        Ok(())
    }
}

/// Stores the fingerprint as `<key>.json` inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FingerprintStore for FileStore {
    fn load(&self) -> Result<Option<MotionFingerprint>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        MotionFingerprint::from_json(&json).map(Some)
    }

    fn save(&mut self, fingerprint: &MotionFingerprint) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = fingerprint.to_json()?;
        // Write then rename so a crash never leaves a half-written profile
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Saved motion fingerprint to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_is_slow() {
        let mut fingerprint = MotionFingerprint::new();
        fingerprint.update(10.0, 4.0, 0.0, &Vector3::zeros(), 0.5);
        // Rate is capped at 1%
        assert!((fingerprint.avg_energy - 0.1).abs() < 1e-12);
        assert!((fingerprint.avg_frequency - 0.04).abs() < 1e-12);
        assert_eq!(fingerprint.sample_count, 1);
    }

    #[test]
    fn test_peak_variance_rises_fast_and_decays_slowly() {
        let mut fingerprint = MotionFingerprint::new();
        fingerprint.update(0.0, 0.0, 8.0, &Vector3::zeros(), 0.01);
        assert_eq!(fingerprint.peak_variance, 8.0);
        fingerprint.update(0.0, 0.0, 1.0, &Vector3::zeros(), 0.01);
        assert!((fingerprint.peak_variance - 8.0 * PEAK_VARIANCE_DECAY).abs() < 1e-12);
    }

    #[test]
    fn test_preferred_axis_follows_sustained_motion() {
        let mut fingerprint = MotionFingerprint::new();
        for _ in 0..50 {
            fingerprint.update(1.0, 1.0, 0.0, &Vector3::new(0.0, 3.0, 0.5), 0.01);
        }
        assert_eq!(fingerprint.preferred_axis, Axis::Y);

        // A single z-dominant sample does not flip the preference
        fingerprint.update(1.0, 1.0, 0.0, &Vector3::new(0.0, 0.0, 9.0), 0.01);
        assert_eq!(fingerprint.preferred_axis, Axis::Y);
    }

    #[test]
    fn test_non_finite_statistics_are_skipped() {
        let mut fingerprint = MotionFingerprint::new();
        fingerprint.update(2.0, 1.0, 3.0, &Vector3::zeros(), 0.01);
        let before = fingerprint.clone();

        fingerprint.update(f64::NAN, f64::INFINITY, f64::INFINITY, &Vector3::zeros(), 0.01);
        assert_eq!(fingerprint.avg_energy, before.avg_energy);
        assert_eq!(fingerprint.avg_frequency, before.avg_frequency);
        assert!((fingerprint.peak_variance - 3.0 * PEAK_VARIANCE_DECAY).abs() < 1e-12);
        assert_eq!(fingerprint.sample_count, 2);

        let value: serde_json::Value = serde_json::from_str(&fingerprint.to_json().unwrap()).unwrap();
        assert!(value["avgEnergy"].is_f64());
        assert!(value["peakVariance"].is_f64());
    }

    #[test]
    fn test_dominant_axis() {
        assert_eq!(Axis::dominant(&Vector3::new(1.0, -2.0, 0.5)), Axis::Y);
        assert_eq!(Axis::dominant(&Vector3::new(0.0, 0.0, -0.1)), Axis::Z);
        assert_eq!(Axis::dominant(&Vector3::zeros()), Axis::X);
    }

    #[test]
    fn test_json_layout() {
        let mut fingerprint = MotionFingerprint::new();
        fingerprint.record_gesture(GestureKind::Shake);
        fingerprint.record_gesture(GestureKind::Shake);
        fingerprint.preferred_axis = Axis::Z;

        let value: serde_json::Value = serde_json::from_str(&fingerprint.to_json().unwrap()).unwrap();
        assert_eq!(value["preferredAxis"], "z");
        assert_eq!(value["gestureProfile"]["shake"], 2);
        assert_eq!(value["isReturning"], true);
        assert!(value.get("axisVotes").is_none());
        for key in ["avgEnergy", "avgFrequency", "peakVariance", "sampleCount"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let mut fingerprint = MotionFingerprint::new();
        fingerprint.update(2.0, 3.0, 1.0, &Vector3::new(0.0, 0.0, 1.0), 0.01);
        fingerprint.record_gesture(GestureKind::Toss);
        store.save(&fingerprint).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.is_returning);
        assert_eq!(loaded.avg_energy, fingerprint.avg_energy);
        assert_eq!(loaded.gesture_count(GestureKind::Toss), 1);
        assert_eq!(loaded.axis_votes()[loaded.preferred_axis.index()], 1.0);
    }

    #[test]
    fn test_corrupt_data_is_an_error() {
        let mut store = MemoryStore::new();
        store.set_raw("{not json");
        assert!(store.load().is_err());
    }
}
