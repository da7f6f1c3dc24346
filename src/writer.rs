//! Background fingerprint persistence.
//!
//! A `StoreWriter` owns the `FingerprintStore` on a dedicated thread so a
//! slow disk never stalls the per-sample path. Saves are fire-and-forget
//! snapshots; loads and syncs wait for the thread to answer.

use std::io;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::fingerprint::{FingerprintStore, MotionFingerprint};
use crate::{Error, Result};

enum Command {
    Load(Sender<Result<Option<MotionFingerprint>>>),
    Save(Box<MotionFingerprint>),
    Sync(Sender<()>),
}

/// Handle to the thread that owns the fingerprint store
pub struct StoreWriter {
    tx: Option<Sender<Command>>,
    handle: Option<JoinHandle<()>>,
}

impl StoreWriter {
    /// Move `store` onto a new writer thread
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the thread cannot be spawned
    pub fn spawn<S>(mut store: S) -> Result<Self>
    where
        S: FingerprintStore + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Command>();
        let handle = thread::Builder::new()
            .name("fingerprint-writer".to_string())
            .spawn(move || {
                for command in rx {
                    match command {
                        Command::Load(reply) => {
                            let _ = reply.send(store.load());
                        }
                        Command::Save(fingerprint) => {
                            if let Err(e) = store.save(&fingerprint) {
                                warn!("Failed to save motion fingerprint: {e}");
                            }
                        }
                        Command::Sync(reply) => {
                            let _ = reply.send(());
                        }
                    }
                }
                debug!("Fingerprint writer stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Read the stored fingerprint, waiting for the writer to answer
    ///
    /// # Errors
    ///
    /// Returns the store's error, or `Error::Io` if the writer has stopped
    pub fn load(&self) -> Result<Option<MotionFingerprint>> {
        let (reply, answer) = mpsc::channel();
        self.send(Command::Load(reply))?;
        answer.recv().map_err(|_| stopped())?
    }

    /// Queue a snapshot of `fingerprint` for saving and return immediately
    pub fn save(&self, fingerprint: &MotionFingerprint) {
        if let Err(e) = self.send(Command::Save(Box::new(fingerprint.clone()))) {
            warn!("Dropping fingerprint save: {e}");
        }
    }

    /// Block until every queued save has been attempted
    pub fn sync(&self) {
        let (reply, done) = mpsc::channel();
        if self.send(Command::Sync(reply)).is_ok() {
            let _ = done.recv();
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx
            .as_ref()
            .ok_or_else(stopped)?
            .send(command)
            .map_err(|_| stopped())
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain its queue and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Fingerprint writer panicked");
            }
        }
    }
}

fn stopped() -> Error {
    Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "fingerprint writer stopped"))
}
