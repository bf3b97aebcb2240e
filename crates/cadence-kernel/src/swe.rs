//! Shallow-water equations.
//!
//! ```text
//! h_t  + (hu)_x = 0
//! hu_t + (hu² / h + g h² / 2)_x = 0
//! ```
//!
//! Two quantities per element: `[depth, discharge]`. Elements shallower
//! than [`DRY_DEPTH`] carry no velocity. Reflecting walls mirror the
//! discharge.
//!
//! Constructed via the builder pattern: [`ShallowWater::builder`].

use crate::context::KernelContext;
use crate::fv::{rusanov_step, Physics, State};
use crate::kernel::Kernel;
use cadence_core::KernelError;
use cadence_mesh::EntityStore;
use smallvec::smallvec;

/// Index of the water depth.
pub const DEPTH: usize = 0;
/// Index of the discharge `h u`.
pub const DISCHARGE: usize = 1;

/// Depth below which an element is treated as dry.
pub const DRY_DEPTH: f64 = 1e-12;

/// A first-order finite-volume shallow-water kernel.
#[derive(Debug)]
pub struct ShallowWater {
    gravity: f64,
    cfl: f64,
}

/// Builder for [`ShallowWater`].
pub struct ShallowWaterBuilder {
    gravity: f64,
    cfl: f64,
}

impl ShallowWater {
    /// Create a new builder for configuring a `ShallowWater` kernel.
    pub fn builder() -> ShallowWaterBuilder {
        ShallowWaterBuilder {
            gravity: 9.81,
            cfl: 0.5,
        }
    }

    /// Gravitational acceleration.
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    fn velocity(q: &[f64]) -> f64 {
        if q[DEPTH] > DRY_DEPTH {
            q[DISCHARGE] / q[DEPTH]
        } else {
            0.0
        }
    }

    fn speed(&self, q: &[f64]) -> f64 {
        Self::velocity(q).abs() + (self.gravity * q[DEPTH].max(0.0)).sqrt()
    }
}

impl ShallowWaterBuilder {
    /// Set the gravitational acceleration (default: 9.81). Must be > 0.
    pub fn gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the Courant number (default: 0.5). Must be in `(0, 1]`.
    pub fn cfl(mut self, cfl: f64) -> Self {
        self.cfl = cfl;
        self
    }

    /// Build the kernel.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `gravity` is not finite and > 0
    /// - `cfl` is not in `(0, 1]`
    pub fn build(self) -> Result<ShallowWater, String> {
        if !(self.gravity > 0.0 && self.gravity.is_finite()) {
            return Err(format!(
                "gravity must be finite and > 0, got {}",
                self.gravity
            ));
        }
        if !(self.cfl > 0.0 && self.cfl <= 1.0) {
            return Err(format!("cfl must be in (0, 1], got {}", self.cfl));
        }
        Ok(ShallowWater {
            gravity: self.gravity,
            cfl: self.cfl,
        })
    }
}

impl Physics for ShallowWater {
    fn n_quantities(&self) -> usize {
        2
    }

    fn flux(&self, q: &[f64], _material: &[f64; 3]) -> State {
        let h = q[DEPTH];
        let u = Self::velocity(q);
        smallvec![q[DISCHARGE], u * q[DISCHARGE] + 0.5 * self.gravity * h * h]
    }

    fn max_speed(&self, q: &[f64], _material: &[f64; 3]) -> f64 {
        self.speed(q)
    }

    fn mirror(&self, q: &[f64], material: &[f64; 3]) -> (State, [f64; 3]) {
        (smallvec![q[DEPTH], -q[DISCHARGE]], *material)
    }
}

impl Kernel for ShallowWater {
    fn name(&self) -> &str {
        "ShallowWater"
    }

    fn n_quantities(&self) -> usize {
        2
    }

    fn stable_dt(&self, store: &EntityStore, element: usize) -> f64 {
        let width = store.elements()[element].width;
        self.cfl * width / self.speed(store.state(element)).max(f64::EPSILON)
    }

    fn apply_step(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        rusanov_step(self, ctx)
    }
}
