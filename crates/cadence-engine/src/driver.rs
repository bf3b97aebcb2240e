//! The synchronization-point loop.
//!
//! ```text
//! write(0) ─ barrier ─┬─ simulate(d₁) ─ write(d₁) ─┬─ ... ─ finalize
//!                     └──────── per sync point ────┘
//! ```
//!
//! Durations come from a [`SyncSchedule`]: the sync interval, clipped so
//! the last point lands exactly on the end time.

use crate::manager::Manager;
use crate::metrics::RunReport;
use crate::output::{OutputError, WaveFieldWriter};
use cadence_core::{SchedError, TIME_TOLERANCE};
use cadence_kernel::Kernel;
use cadence_mesh::EntityStore;
use thiserror::Error;
use tracing::info;

/// Errors from [`run`].
#[derive(Debug, Error)]
pub enum DriverError {
    /// Scheduling failed.
    #[error(transparent)]
    Sched(#[from] SchedError),
    /// Wave-field output failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Durations between consecutive synchronization points.
///
/// Yields `min(interval, end_time - elapsed)` until the end time is
/// reached. An interval within tolerance of zero means a single interval
/// spanning the whole run.
///
/// ```
/// use cadence_engine::driver::SyncSchedule;
///
/// let d: Vec<f64> = SyncSchedule::new(1.0, 0.4).unwrap().collect();
/// assert_eq!(d.len(), 3);
/// assert!((d[2] - 0.2).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct SyncSchedule {
    end_time: f64,
    interval: f64,
    elapsed: f64,
}

impl SyncSchedule {
    /// Schedule from `0` to `end_time` in steps of `interval`.
    ///
    /// Returns `InvalidConfiguration` unless `end_time` is finite and
    /// positive and `interval` is finite and not negative.
    pub fn new(end_time: f64, interval: f64) -> Result<Self, SchedError> {
        if !(end_time > 0.0 && end_time.is_finite()) {
            return Err(SchedError::invalid(format!(
                "end time must be finite and > 0, got {end_time}"
            )));
        }
        if !(interval.is_finite() && interval > -TIME_TOLERANCE) {
            return Err(SchedError::invalid(format!(
                "sync interval must be finite and >= 0, got {interval}"
            )));
        }
        let interval = if interval.abs() < TIME_TOLERANCE {
            end_time
        } else {
            interval
        };
        Ok(Self {
            end_time,
            interval,
            elapsed: 0.0,
        })
    }

    /// Effective interval.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Simulated time covered so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Iterator for SyncSchedule {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let remaining = self.end_time - self.elapsed;
        if remaining < TIME_TOLERANCE {
            return None;
        }
        let duration = self.interval.min(remaining);
        self.elapsed += duration;
        Some(duration)
    }
}

/// Run `manager` through every point of `schedule`.
///
/// Writes the initial wave field, enters the barrier, then alternates
/// `simulate` and `write` until the schedule is exhausted. The manager is
/// finalized on success; on error it is left as the failure found it.
pub fn run(
    manager: &mut Manager<'_>,
    store: &mut EntityStore,
    kernel: &dyn Kernel,
    writer: &mut dyn WaveFieldWriter,
    schedule: SyncSchedule,
) -> Result<RunReport, DriverError> {
    info!(time = 0.0, "reached sync point #0");
    writer.write(0.0, store)?;
    manager.barrier()?;

    for duration in schedule {
        let point = manager.simulate(duration, store, kernel)?;
        info!(
            time = point.time,
            updates = manager.total_updates(),
            "reached sync point #{}",
            point.index
        );
        writer.write(duration, store)?;
    }

    Ok(manager.finalize())
}
