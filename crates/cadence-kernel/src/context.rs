//! Execution context handed to [`Kernel::apply_step`](crate::Kernel::apply_step).

use cadence_core::EntityRange;
use cadence_mesh::{EntityStore, Mesh};

/// Everything a kernel needs for one local step of one cluster.
///
/// The store is read-only: kernels read the whole mesh (neighbour halos
/// included) and write the new state of `range` into `out`, which the
/// cluster copies back once the step succeeded.
pub struct KernelContext<'a> {
    store: &'a EntityStore,
    range: EntityRange,
    out: &'a mut [f64],
    time: f64,
    dt: f64,
}

impl<'a> KernelContext<'a> {
    /// Create a context for stepping `range` from `time` by `dt`.
    ///
    /// `out` must hold `range.len * store.n_quantities()` values.
    pub fn new(
        store: &'a EntityStore,
        range: EntityRange,
        out: &'a mut [f64],
        time: f64,
        dt: f64,
    ) -> Self {
        Self {
            store,
            range,
            out,
            time,
            dt,
        }
    }

    /// The entity store at the start of the step.
    pub fn store(&self) -> &'a EntityStore {
        self.store
    }

    /// The mesh.
    pub fn mesh(&self) -> &'a dyn Mesh {
        self.store.mesh()
    }

    /// Entities being advanced.
    pub fn range(&self) -> EntityRange {
        self.range
    }

    /// Simulation time at the start of the step.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Step size.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Output buffer for the new state of `range`, row-major.
    pub fn out(&mut self) -> &mut [f64] {
        &mut *self.out
    }
}
