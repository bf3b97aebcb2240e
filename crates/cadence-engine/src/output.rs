//! Wave-field output at synchronization points.

use cadence_mesh::EntityStore;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors from wave-field writers.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Underlying I/O failed.
    #[error("wave field output: {0}")]
    Io(#[from] io::Error),
}

/// Consumer of the wave field at every synchronization point.
///
/// Called once with `elapsed == 0.0` before the compute phase and once
/// after every `simulate`, with the duration just simulated.
pub trait WaveFieldWriter {
    /// Hand off the current state.
    fn write(&mut self, elapsed: f64, store: &EntityStore) -> Result<(), OutputError>;
}

/// Writer that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullWriter;

impl WaveFieldWriter for NullWriter {
    fn write(&mut self, _elapsed: f64, _store: &EntityStore) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Plain-text dump of every element at every synchronization point.
///
/// ```text
/// # snapshot 1 t=0.25
/// 0.125 1.0e0 0e0
/// ...
/// ```
#[derive(Debug)]
pub struct SnapshotWriter<W: Write> {
    out: W,
    time: f64,
    snapshots: u64,
}

impl SnapshotWriter<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> SnapshotWriter<W> {
    /// Write snapshots to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            time: 0.0,
            snapshots: 0,
        }
    }

    /// Snapshots written so far.
    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    /// Consume the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> WaveFieldWriter for SnapshotWriter<W> {
    fn write(&mut self, elapsed: f64, store: &EntityStore) -> Result<(), OutputError> {
        self.time += elapsed;
        writeln!(self.out, "# snapshot {} t={}", self.snapshots, self.time)?;
        let q = store.n_quantities();
        for (el, state) in store.elements().iter().zip(store.values().chunks(q)) {
            write!(self.out, "{}", el.centroid)?;
            for v in state {
                write!(self.out, " {v:e}")?;
            }
            writeln!(self.out)?;
        }
        self.out.flush()?;
        self.snapshots += 1;
        Ok(())
    }
}
