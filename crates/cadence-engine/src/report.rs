//! Run observers.
//!
//! A [`Reporter`] is handed to the [`Manager`](crate::Manager) and told
//! about every scheduling milestone. [`TracingReporter`] turns them into
//! `tracing` events; [`NullReporter`] ignores them.

use crate::manager::SyncPoint;
use crate::metrics::RunReport;
use crate::negotiate::NegotiatedStep;
use cadence_core::ClusterId;
use tracing::{debug, info};

/// Observer of scheduling milestones. All methods default to no-ops.
pub trait Reporter {
    /// The global step was agreed on.
    fn on_negotiated(&self, _step: &NegotiatedStep) {}

    /// A cluster reached a horizon after `steps` local steps.
    fn on_cluster_advanced(&self, _cluster: ClusterId, _steps: u64, _horizon: f64) {}

    /// A synchronization point was reached.
    fn on_sync_point(&self, _point: &SyncPoint, _total_updates: u64) {}

    /// The manager was finalized.
    fn on_finalized(&self, _report: &RunReport) {}
}

/// Reporter that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Reporter that logs milestones through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn on_negotiated(&self, step: &NegotiatedStep) {
        info!(
            min_global = step.dt_global,
            min = step.local.min,
            mean = step.local.mean,
            max = step.local.max,
            "time step stats"
        );
    }

    fn on_cluster_advanced(&self, cluster: ClusterId, steps: u64, horizon: f64) {
        debug!(%cluster, steps, horizon, "cluster advanced");
    }

    fn on_sync_point(&self, point: &SyncPoint, total_updates: u64) {
        debug!(
            sync_point = point.index,
            time = point.time,
            total_updates,
            "sync point bookkeeping done"
        );
    }

    fn on_finalized(&self, report: &RunReport) {
        info!(
            sync_points = report.sync_points,
            total_updates = report.total_updates,
            final_time = report.final_time,
            compute_secs = report.compute_time.as_secs_f64(),
            updates_per_sec = report.updates_per_second(),
            "compute phase finished"
        );
    }
}
