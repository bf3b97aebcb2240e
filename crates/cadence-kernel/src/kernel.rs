//! The [`Kernel`] trait.

use crate::context::KernelContext;
use cadence_core::KernelError;
use cadence_mesh::EntityStore;

/// A numerical equation the scheduler advances in time.
///
/// # Contract
///
/// - `apply_step()` MUST be deterministic: same inputs produce identical
///   outputs, independent of the thread-pool size.
/// - `&self`: kernels are stateless; all state lives in the store.
/// - `apply_step()` writes exactly `range.len * n_quantities()` values.
///
/// # Object safety
///
/// This trait is object-safe; the runtime selects a kernel by
/// [`EquationKind`](crate::EquationKind) and holds it as `Box<dyn Kernel>`.
///
/// # Examples
///
/// A kernel that leaves the state unchanged:
///
/// ```
/// use cadence_core::KernelError;
/// use cadence_kernel::{Kernel, KernelContext};
/// use cadence_mesh::EntityStore;
///
/// struct Frozen;
///
/// impl Kernel for Frozen {
///     fn name(&self) -> &str { "frozen" }
///     fn n_quantities(&self) -> usize { 1 }
///     fn stable_dt(&self, _store: &EntityStore, _element: usize) -> f64 { 1.0 }
///     fn apply_step(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
///         let prev = ctx.store().read(ctx.range()).map_err(|e| {
///             KernelError::ExecutionFailed { reason: e.to_string() }
///         })?;
///         ctx.out().copy_from_slice(prev);
///         Ok(())
///     }
/// }
///
/// assert_eq!(Frozen.name(), "frozen");
/// ```
pub trait Kernel: Send + Sync + 'static {
    /// Human-readable name for logs and error reports.
    fn name(&self) -> &str;

    /// Quantities per element this kernel reads and writes.
    fn n_quantities(&self) -> usize;

    /// Largest stable step for one element given the current state.
    fn stable_dt(&self, store: &EntityStore, element: usize) -> f64;

    /// Stable step candidates of every element, in entity order.
    fn stable_dts(&self, store: &EntityStore) -> Vec<f64> {
        (0..store.n_elements())
            .map(|e| self.stable_dt(store, e))
            .collect()
    }

    /// Advance `ctx.range()` by `ctx.dt()`, writing into `ctx.out()`.
    fn apply_step(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError>;
}

/// Return `NonFinite` for the first element of `out` holding a NaN or
/// infinity. `first` is the global index of the first element.
pub fn check_finite(out: &[f64], n_quantities: usize, first: usize) -> Result<(), KernelError> {
    match out
        .chunks(n_quantities)
        .position(|s| s.iter().any(|v| !v.is_finite()))
    {
        Some(k) => Err(KernelError::NonFinite { entity: first + k }),
        None => Ok(()),
    }
}
