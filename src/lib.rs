//! Streaming motion analysis for handheld accelerometer data.
//!
//! This library turns a stream of raw acceleration samples into discrete
//! gesture spikes and a continuous measure of stillness:
//! - Per-axis Kalman filtering and gravity separation
//! - Ring buffers of statistics at four timescales (5, 34, 233, 1597 samples)
//! - Seven leaky integrate-and-fire neurons, one per gesture
//! - A stillness state machine with a smoothed depth and breath oscillator
//! - A slowly learned, persisted motion fingerprint of the user
//!
//! The processing pipeline per sample is:
//! 1. Filter each axis and separate gravity from linear acceleration
//! 2. Push the linear magnitude and axes into the statistics buffers
//! 3. Extract gesture features and integrate them into the neurons
//! 4. Advance the stillness machine
//! 5. Blend the sample into the fingerprint, saving it periodically
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use motion_sense::{Config, MotionEvent, MotionPipeline, Sample};
//! use std::sync::mpsc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, rx) = mpsc::channel::<MotionEvent>();
//! let mut pipeline = MotionPipeline::new(Config::default())?.with_sink(tx);
//!
//! // Three seconds of a device lying flat at 60 Hz
//! for i in 0..180 {
//!     pipeline.process(&Sample::new(0.0, 0.0, 9.81, f64::from(i) / 60.0));
//! }
//!
//! for event in rx.try_iter() {
//!     println!("{}", event.name());
//! }
//! println!("State: {}, depth {:.2}", pipeline.void_state(), pipeline.void_depth());
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Filters
//!
//! ```
//! use motion_sense::filters::{create_filter, SignalFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("kalman:0.1:0.05")?;
//!
//! let smoothed = filter.apply(9.9);
//! println!("{}: {smoothed:.3}", filter.name());
//!
//! filter.reset();
//! # Ok(())
//! # }
//! ```
//!
//! ## Persisting the Fingerprint
//!
//! ```no_run
//! use motion_sense::{fingerprint::FileStore, Config, MotionPipeline, Sample};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let store = FileStore::new("/var/lib/motion-sense", &config.fingerprint.storage_key);
//! let mut pipeline = MotionPipeline::new(config)?.with_store(store)?;
//!
//! pipeline.init();
//! if pipeline.is_returning_user() {
//!     println!("Welcome back");
//! }
//! pipeline.process(&Sample::new(0.1, 0.0, 9.8, 0.0));
//! pipeline.flush();
//! # Ok(())
//! # }
//! ```

/// Per-axis signal filters and gravity separation
pub mod filters;

/// Ring buffers with running statistics
pub mod stat_buffer;

/// Gesture feature extraction from buffer statistics
pub mod features;

/// Leaky integrate-and-fire gesture neurons
pub mod neurons;

/// Stillness state machine
pub mod stillness;

/// Persisted per-user motion profile
pub mod fingerprint;

/// Background thread that owns the fingerprint store
pub mod writer;

/// Events emitted by the pipeline
pub mod events;

/// The per-sample processing pipeline
pub mod pipeline;

/// Numeric helpers
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventSink, MotionEvent, SpikeEvent, VoidEvent};
pub use fingerprint::{Axis, FingerprintStore, MotionFingerprint};
pub use neurons::GestureKind;
pub use pipeline::{MotionPipeline, Orientation, Sample};
pub use stat_buffer::Timescale;
pub use stillness::VoidState;
