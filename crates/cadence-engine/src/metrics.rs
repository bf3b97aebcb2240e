//! End-of-run statistics.

use cadence_core::ClusterId;
use std::time::Duration;

/// Summary of a finished run.
///
/// Produced by [`Manager::finalize`](crate::Manager::finalize). The
/// compute time covers the span from the pre-compute barrier (or the
/// first `simulate`) to finalization, output hand-off included.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    /// `(cluster, update_count)` in insertion order.
    pub update_counts: Vec<(ClusterId, u64)>,
    /// Sum of all clusters' update counts.
    pub total_updates: u64,
    /// Synchronization points reached.
    pub sync_points: u64,
    /// Final horizon.
    pub final_time: f64,
    /// Wall-clock time of the compute phase.
    pub compute_time: Duration,
}

impl RunReport {
    /// Cluster updates per wall-clock second, or `0.0` for an instant run.
    pub fn updates_per_second(&self) -> f64 {
        let secs = self.compute_time.as_secs_f64();
        if secs > 0.0 {
            self.total_updates as f64 / secs
        } else {
            0.0
        }
    }
}
