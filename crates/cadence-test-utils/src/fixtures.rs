//! Reusable kernel test fixtures.
//!
//! Three standard kernels for scheduler validation:
//!
//! - [`ConstKernel`]: writes a constant value, reads nothing.
//! - [`CountingKernel`]: adds one per step, so values count local steps.
//! - [`FailingKernel`]: fails deterministically after N calls.

use cadence_core::KernelError;
use cadence_kernel::{Kernel, KernelContext};
use cadence_mesh::EntityStore;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Writes a constant value to every quantity of every element.
pub struct ConstKernel {
    pub value: f64,
    pub n_quantities: usize,
    pub stable_dt: f64,
}

impl ConstKernel {
    /// One quantity, stable step `1.0`.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            n_quantities: 1,
            stable_dt: 1.0,
        }
    }

    pub fn with_quantities(mut self, n: usize) -> Self {
        self.n_quantities = n;
        self
    }

    pub fn with_stable_dt(mut self, dt: f64) -> Self {
        self.stable_dt = dt;
        self
    }
}

impl Kernel for ConstKernel {
    fn name(&self) -> &str {
        "const"
    }

    fn n_quantities(&self) -> usize {
        self.n_quantities
    }

    fn stable_dt(&self, _store: &EntityStore, _element: usize) -> f64 {
        self.stable_dt
    }

    fn apply_step(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        ctx.out().fill(self.value);
        Ok(())
    }
}

/// Adds `1.0` to every value per step and counts its calls.
///
/// After a run, each element holds the number of local steps its cluster
/// took. The stable step of an element is its width, so refined regions
/// negotiate smaller steps.
#[derive(Default)]
pub struct CountingKernel {
    calls: AtomicUsize,
}

impl CountingKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `apply_step()` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Kernel for CountingKernel {
    fn name(&self) -> &str {
        "counting"
    }

    fn n_quantities(&self) -> usize {
        1
    }

    fn stable_dt(&self, store: &EntityStore, element: usize) -> f64 {
        store.mesh().width(element)
    }

    fn apply_step(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let prev = ctx
            .store()
            .read(ctx.range())
            .map_err(|e| KernelError::ExecutionFailed {
                reason: e.to_string(),
            })?;
        for (o, p) in ctx.out().iter_mut().zip(prev) {
            *o = p + 1.0;
        }
        Ok(())
    }
}

/// Fails deterministically after a configurable number of successful calls.
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Sync`.
pub struct FailingKernel {
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingKernel {
    /// Create a kernel that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `apply_step()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Kernel for FailingKernel {
    fn name(&self) -> &str {
        "failing"
    }

    fn n_quantities(&self) -> usize {
        1
    }

    fn stable_dt(&self, _store: &EntityStore, _element: usize) -> f64 {
        1.0
    }

    fn apply_step(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(KernelError::ExecutionFailed {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        // On success, fill output with call index for traceability.
        ctx.out().fill(n as f64);
        Ok(())
    }
}
