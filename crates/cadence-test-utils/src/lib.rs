//! Test utilities and mock types for Cadence development.
//!
//! Provides deterministic kernels ([`ConstKernel`], [`CountingKernel`],
//! [`FailingKernel`]), recording implementations of the engine's output
//! traits ([`RecordingWriter`], [`RecordingReceivers`], [`RecordingReporter`])
//! and small store builders.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{ConstKernel, CountingKernel, FailingKernel};

use cadence_core::ClusterId;
use cadence_engine::{Reporter, ReceiverSink, StepWindow, SyncPoint, WaveFieldWriter};
use cadence_engine::{OutputError, RunReport};
use cadence_mesh::{BoundaryBehavior, EntityStore, Line1D};
use std::sync::Mutex;

/// Store over `n` equal elements on `[0, 1]` with one quantity.
pub fn line_store(n: usize, boundary: BoundaryBehavior) -> EntityStore {
    let mesh = Line1D::new(n, 0.0, 1.0, boundary).expect("valid test mesh");
    EntityStore::new(mesh, 1).expect("valid test store")
}

/// Like [`line_store`] with `n_quantities` per element.
pub fn line_store_with(n: usize, n_quantities: usize, boundary: BoundaryBehavior) -> EntityStore {
    let mesh = Line1D::new(n, 0.0, 1.0, boundary).expect("valid test mesh");
    EntityStore::new(mesh, n_quantities).expect("valid test store")
}

/// Wave-field writer that records the `elapsed` argument of every call
/// together with a copy of the state.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub elapsed: Vec<f64>,
    pub states: Vec<Vec<f64>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WaveFieldWriter for RecordingWriter {
    fn write(&mut self, elapsed: f64, store: &EntityStore) -> Result<(), OutputError> {
        self.elapsed.push(elapsed);
        self.states.push(store.values().to_vec());
        Ok(())
    }
}

/// Receiver sink that records every step window and flush.
#[derive(Debug, Default)]
pub struct RecordingReceivers {
    pub windows: Vec<StepWindow>,
    pub flushes: Vec<f64>,
}

impl RecordingReceivers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cluster ids in stepping order.
    pub fn clusters(&self) -> Vec<ClusterId> {
        self.windows.iter().map(|w| w.cluster).collect()
    }
}

impl ReceiverSink for RecordingReceivers {
    fn next_sample(&self) -> Option<f64> {
        None
    }

    fn sample(&mut self, window: &StepWindow, _store: &EntityStore) {
        self.windows.push(*window);
    }

    fn flush(&mut self, horizon: f64) {
        self.flushes.push(horizon);
    }
}

/// Reporter that records every milestone.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub advanced: Mutex<Vec<(ClusterId, u64, f64)>>,
    pub sync_points: Mutex<Vec<SyncPoint>>,
    pub finalized: Mutex<Vec<RunReport>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for RecordingReporter {
    fn on_cluster_advanced(&self, cluster: ClusterId, steps: u64, horizon: f64) {
        if let Ok(mut v) = self.advanced.lock() {
            v.push((cluster, steps, horizon));
        }
    }

    fn on_sync_point(&self, point: &SyncPoint, _total_updates: u64) {
        if let Ok(mut v) = self.sync_points.lock() {
            v.push(*point);
        }
    }

    fn on_finalized(&self, report: &RunReport) {
        if let Ok(mut v) = self.finalized.lock() {
            v.push(report.clone());
        }
    }
}
