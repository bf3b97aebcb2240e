//! The top-level scheduler.
//!
//! The [`Manager`] owns the cluster set and drives it from one
//! synchronization point to the next:
//!
//! ```text
//! Idle ──simulate──▶ Advancing ──horizon──▶ AtSyncPoint ──simulate──▶ Advancing ...
//!   │                                             │
//!   └──────────────────finalize───────────────────┴──▶ Finalized
//! ```
//!
//! During an advance every local step window is offered to both receiver
//! sinks. At the horizon both sinks are flushed and the reporter is told.

use crate::cluster::{Cluster, StepWindow};
use crate::cluster_set::ClusterSet;
use crate::metrics::RunReport;
use crate::receivers::ReceiverSink;
use crate::report::Reporter;
use cadence_core::{ClusterId, EntityRange, SchedError};
use cadence_kernel::Kernel;
use cadence_mesh::EntityStore;
use cadence_parallel::{Communicator, SharedRuntime};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Lifecycle state of a [`Manager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManagerState {
    /// No `simulate` call yet.
    Idle,
    /// Clusters are being advanced (or an advance failed).
    Advancing,
    /// Every cluster sits on the current horizon.
    AtSyncPoint,
    /// The run is over; `simulate` is rejected.
    Finalized,
}

/// A reached synchronization point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyncPoint {
    /// 1-based index; point 0 is the initial state.
    pub index: u64,
    /// Simulation time of the point.
    pub time: f64,
}

/// Top-level scheduler over one [`ClusterSet`].
///
/// Holds references to the parallel runtime, both receiver sinks and the
/// reporter for its whole lifetime.
pub struct Manager<'r> {
    dt_global: f64,
    clusters: ClusterSet,
    shared: &'r SharedRuntime,
    comm: &'r dyn Communicator,
    receivers: &'r mut dyn ReceiverSink,
    quad_receivers: &'r mut dyn ReceiverSink,
    reporter: &'r dyn Reporter,
    state: ManagerState,
    horizon: f64,
    sync_points: u64,
    compute_start: Option<Instant>,
    compute_time: Duration,
}

impl<'r> Manager<'r> {
    /// Create a manager around the negotiated global step.
    ///
    /// Returns `InvalidConfiguration` unless `dt_global` is finite and
    /// positive.
    pub fn new(
        dt_global: f64,
        shared: &'r SharedRuntime,
        comm: &'r dyn Communicator,
        receivers: &'r mut dyn ReceiverSink,
        quad_receivers: &'r mut dyn ReceiverSink,
        reporter: &'r dyn Reporter,
    ) -> Result<Self, SchedError> {
        if !(dt_global > 0.0 && dt_global.is_finite()) {
            return Err(SchedError::invalid(format!(
                "global time step must be finite and > 0, got {dt_global}"
            )));
        }
        Ok(Self {
            dt_global,
            clusters: ClusterSet::new(),
            shared,
            comm,
            receivers,
            quad_receivers,
            reporter,
            state: ManagerState::Idle,
            horizon: 0.0,
            sync_points: 0,
            compute_start: None,
            compute_time: Duration::ZERO,
        })
    }

    /// Register a cluster. Only possible before the first
    /// [`simulate`](Self::simulate): every member must start on the
    /// same horizon.
    pub fn add(&mut self, cluster: Cluster) -> Result<ClusterId, SchedError> {
        match self.state {
            ManagerState::Idle => self.clusters.add(cluster),
            ManagerState::Finalized => Err(SchedError::AlreadyFinalized),
            ManagerState::Advancing | ManagerState::AtSyncPoint => {
                Err(SchedError::invalid(format!(
                    "cluster {} added after simulation started at t = {}",
                    cluster.id(),
                    self.horizon
                )))
            }
        }
    }

    /// Register a cluster stepping `range` with the global step. Its id
    /// follows the largest id already registered.
    pub fn add_global(&mut self, range: EntityRange) -> Result<ClusterId, SchedError> {
        let id = self
            .clusters
            .iter()
            .map(|c| c.id().0 + 1)
            .max()
            .unwrap_or(0);
        self.add(Cluster::new(ClusterId(id), self.dt_global, range)?)
    }

    /// Collective barrier before the compute phase. Starts the compute
    /// timer.
    pub fn barrier(&mut self) -> Result<(), SchedError> {
        self.comm.barrier()?;
        self.compute_start.get_or_insert_with(Instant::now);
        Ok(())
    }

    /// Advance every cluster by `duration` to the next synchronization
    /// point.
    ///
    /// # Errors
    ///
    /// - `AlreadyFinalized` after [`finalize`](Self::finalize)
    /// - `NotInitialized` if no cluster was added
    /// - `InvalidConfiguration` if `duration` is not finite and positive
    /// - `ComputeFailure` if the kernel fails; the manager stays in
    ///   `Advancing` and the run cannot be resumed meaningfully
    pub fn simulate(
        &mut self,
        duration: f64,
        store: &mut EntityStore,
        kernel: &dyn Kernel,
    ) -> Result<SyncPoint, SchedError> {
        if self.state == ManagerState::Finalized {
            return Err(SchedError::AlreadyFinalized);
        }
        if self.clusters.is_empty() {
            return Err(SchedError::NotInitialized);
        }
        if !(duration > 0.0 && duration.is_finite()) {
            return Err(SchedError::invalid(format!(
                "sync duration must be finite and > 0, got {duration}"
            )));
        }

        self.state = ManagerState::Advancing;
        self.compute_start.get_or_insert_with(Instant::now);
        let target = self.horizon + duration;
        debug!(from = self.horizon, to = target, "advancing clusters");

        let receivers = &mut *self.receivers;
        let quad = &mut *self.quad_receivers;
        let mut observer = |window: &StepWindow, store: &EntityStore| {
            receivers.sample(window, store);
            quad.sample(window, store);
        };
        let outcome = self
            .clusters
            .advance(target, store, kernel, self.shared, &mut observer)?;

        for (cluster, steps) in &outcome.steps {
            self.reporter.on_cluster_advanced(*cluster, *steps, target);
        }
        self.receivers.flush(target);
        self.quad_receivers.flush(target);

        self.horizon = target;
        self.sync_points += 1;
        self.state = ManagerState::AtSyncPoint;
        let point = SyncPoint {
            index: self.sync_points,
            time: target,
        };
        self.reporter.on_sync_point(&point, self.total_updates());
        Ok(point)
    }

    /// End the run and report its statistics.
    ///
    /// Further `simulate` calls return `AlreadyFinalized`. Calling
    /// `finalize` again returns the same report.
    pub fn finalize(&mut self) -> RunReport {
        if self.state != ManagerState::Finalized {
            if let Some(start) = self.compute_start {
                self.compute_time = start.elapsed();
            }
            self.state = ManagerState::Finalized;
            let report = self.report();
            self.reporter.on_finalized(&report);
            return report;
        }
        self.report()
    }

    fn report(&self) -> RunReport {
        RunReport {
            update_counts: self.update_counts(),
            total_updates: self.total_updates(),
            sync_points: self.sync_points,
            final_time: self.horizon,
            compute_time: self.compute_time,
        }
    }

    /// `(cluster, update_count)` in insertion order.
    pub fn update_counts(&self) -> Vec<(ClusterId, u64)> {
        self.clusters.update_counts()
    }

    /// Sum of all clusters' update counts.
    pub fn total_updates(&self) -> u64 {
        self.clusters.total_updates()
    }

    /// Current horizon.
    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Synchronization points reached.
    pub fn sync_points(&self) -> u64 {
        self.sync_points
    }

    /// Lifecycle state.
    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// The negotiated global step.
    pub fn dt_global(&self) -> f64 {
        self.dt_global
    }

    /// The managed clusters.
    pub fn clusters(&self) -> &ClusterSet {
        &self.clusters
    }
}

impl fmt::Debug for Manager<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("dt_global", &self.dt_global)
            .field("clusters", &self.clusters.len())
            .field("state", &self.state)
            .field("horizon", &self.horizon)
            .field("sync_points", &self.sync_points)
            .finish()
    }
}
