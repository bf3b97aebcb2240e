//! A single time-integration cluster.
//!
//! A cluster owns a fixed step size and a range of entities. Advancing it
//! to a horizon takes full steps until the remaining gap fits in one step,
//! then one clamped step that lands on the horizon exactly.

use cadence_core::{
    horizon_reached, ClusterId, EntityRange, KernelError, SchedError, STEP_TOLERANCE,
};
use cadence_kernel::{Kernel, KernelContext};
use cadence_mesh::EntityStore;
use cadence_parallel::SharedRuntime;
use std::fmt;

/// Result of one [`Cluster::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    /// Local steps taken by this call.
    pub steps: u64,
    /// Local time after the call.
    pub local_time: f64,
}

/// The interval covered by one local step of one cluster.
///
/// Handed to step observers after the step's state is written back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepWindow {
    /// Cluster that stepped.
    pub cluster: ClusterId,
    /// Entities it advanced.
    pub range: EntityRange,
    /// Local time before the step.
    pub start: f64,
    /// Local time after the step.
    pub end: f64,
}

/// Callback invoked after every local step.
pub type StepObserver<'a> = dyn FnMut(&StepWindow, &EntityStore) + 'a;

/// Unit of time integration: a step size and the entities it advances.
pub struct Cluster {
    id: ClusterId,
    dt: f64,
    range: EntityRange,
    update_count: u64,
    local_time: f64,
    scratch: Vec<f64>,
}

impl Cluster {
    /// Create a cluster at local time zero.
    ///
    /// Returns `InvalidConfiguration` if `dt` is not finite and positive
    /// or `range` is empty.
    pub fn new(id: ClusterId, dt: f64, range: EntityRange) -> Result<Self, SchedError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SchedError::invalid(format!(
                "cluster {id}: dt must be finite and > 0, got {dt}"
            )));
        }
        if range.is_empty() {
            return Err(SchedError::invalid(format!(
                "cluster {id}: entity range {range} is empty"
            )));
        }
        Ok(Self {
            id,
            dt,
            range,
            update_count: 0,
            local_time: 0.0,
            scratch: Vec::new(),
        })
    }

    /// Cluster id.
    pub fn id(&self) -> ClusterId {
        self.id
    }

    /// Step size.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Entities advanced by this cluster.
    pub fn range(&self) -> EntityRange {
        self.range
    }

    /// Local steps taken since construction.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Accumulated simulated time.
    pub fn local_time(&self) -> f64 {
        self.local_time
    }

    /// Whether the local time has reached `horizon`.
    pub fn reached(&self, horizon: f64) -> bool {
        horizon_reached(self.local_time, horizon)
    }

    /// Advance to `horizon` with the minimal number of local steps.
    ///
    /// The final step is clamped and `local_time` is set to `horizon` by
    /// assignment. A remaining gap of at most `dt * (1 + STEP_TOLERANCE)`
    /// is closed by that clamped step. A horizon at or behind the local
    /// time is a no-op.
    ///
    /// `observer` sees every step's window after its state is written.
    pub fn advance(
        &mut self,
        horizon: f64,
        store: &mut EntityStore,
        kernel: &dyn Kernel,
        shared: &SharedRuntime,
        observer: &mut StepObserver<'_>,
    ) -> Result<StepOutcome, SchedError> {
        if horizon.is_nan() {
            return Err(SchedError::invalid(format!(
                "cluster {}: horizon is NaN",
                self.id
            )));
        }
        let mut steps = 0;
        if horizon <= self.local_time {
            return Ok(StepOutcome {
                steps,
                local_time: self.local_time,
            });
        }
        store.check_range(self.range).map_err(|_| SchedError::ComputeFailure {
            cluster: self.id,
            time: self.local_time,
            source: KernelError::RangeOutOfBounds {
                range: self.range,
                entities: store.n_elements(),
            },
        })?;
        self.scratch.resize(self.range.len * store.n_quantities(), 0.0);

        while self.local_time < horizon {
            let start = self.local_time;
            let remaining = horizon - start;
            let (dt, end) = if remaining <= self.dt * (1.0 + STEP_TOLERANCE) {
                (remaining, horizon)
            } else {
                (self.dt, start + self.dt)
            };
            if end <= start {
                return Err(SchedError::invalid(format!(
                    "cluster {}: dt {} is below the float resolution at t = {start}",
                    self.id, self.dt
                )));
            }
            self.step(store, kernel, shared, dt)?;
            self.local_time = end;
            self.update_count += 1;
            steps += 1;
            observer(
                &StepWindow {
                    cluster: self.id,
                    range: self.range,
                    start,
                    end,
                },
                &*store,
            );
        }

        Ok(StepOutcome {
            steps,
            local_time: self.local_time,
        })
    }

    /// One kernel step of size `dt` from the current local time.
    fn step(
        &mut self,
        store: &mut EntityStore,
        kernel: &dyn Kernel,
        shared: &SharedRuntime,
        dt: f64,
    ) -> Result<(), SchedError> {
        let time = self.local_time;
        let range = self.range;
        let scratch = &mut self.scratch;
        let snapshot: &EntityStore = store;
        shared
            .install(|| {
                let mut ctx = KernelContext::new(snapshot, range, scratch, time, dt);
                kernel.apply_step(&mut ctx)
            })
            .map_err(|source| SchedError::ComputeFailure {
                cluster: self.id,
                time,
                source,
            })?;
        store
            .write(range, &self.scratch)
            .map_err(|e| SchedError::ComputeFailure {
                cluster: self.id,
                time,
                source: KernelError::ExecutionFailed {
                    reason: e.to_string(),
                },
            })
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("id", &self.id)
            .field("dt", &self.dt)
            .field("range", &self.range)
            .field("update_count", &self.update_count)
            .field("local_time", &self.local_time)
            .finish()
    }
}
