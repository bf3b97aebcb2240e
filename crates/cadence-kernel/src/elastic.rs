//! 1D velocity-stress elastic waves.
//!
//! ```text
//! σ_t = (λ + 2μ) v_x
//! v_t = σ_x / ρ
//! ```
//!
//! Two quantities per element: `[stress, velocity]`. Element material is
//! `[ρ, λ, μ]`; the P-wave speed is `sqrt((λ + 2μ) / ρ)`. Free-surface
//! faces mirror the stress so that traction vanishes on the wall.
//!
//! Constructed via the builder pattern: [`Elastic::builder`].

use crate::context::KernelContext;
use crate::fv::{rusanov_step, Physics, State};
use crate::kernel::Kernel;
use cadence_core::KernelError;
use cadence_mesh::EntityStore;
use smallvec::smallvec;

/// Index of the stress quantity.
pub const STRESS: usize = 0;
/// Index of the particle-velocity quantity.
pub const VELOCITY: usize = 1;

/// A first-order finite-volume elastic wave kernel.
#[derive(Debug)]
pub struct Elastic {
    cfl: f64,
}

/// Builder for [`Elastic`].
pub struct ElasticBuilder {
    cfl: f64,
}

impl Elastic {
    /// Create a new builder for configuring an `Elastic` kernel.
    pub fn builder() -> ElasticBuilder {
        ElasticBuilder { cfl: 0.5 }
    }

    /// P-wave speed for a material `[ρ, λ, μ]`.
    pub fn wave_speed(material: &[f64; 3]) -> f64 {
        let [rho, lambda, mu] = *material;
        ((lambda + 2.0 * mu) / rho).sqrt()
    }
}

impl ElasticBuilder {
    /// Set the Courant number (default: 0.5). Must be in `(0, 1]`.
    pub fn cfl(mut self, cfl: f64) -> Self {
        self.cfl = cfl;
        self
    }

    /// Build the kernel.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `cfl` is not in `(0, 1]` or is NaN.
    pub fn build(self) -> Result<Elastic, String> {
        if !(self.cfl > 0.0 && self.cfl <= 1.0) {
            return Err(format!("cfl must be in (0, 1], got {}", self.cfl));
        }
        Ok(Elastic { cfl: self.cfl })
    }
}

impl Physics for Elastic {
    fn n_quantities(&self) -> usize {
        2
    }

    fn flux(&self, q: &[f64], material: &[f64; 3]) -> State {
        let [rho, lambda, mu] = *material;
        smallvec![-(lambda + 2.0 * mu) * q[VELOCITY], -q[STRESS] / rho]
    }

    fn max_speed(&self, _q: &[f64], material: &[f64; 3]) -> f64 {
        Self::wave_speed(material)
    }

    fn mirror(&self, q: &[f64], material: &[f64; 3]) -> (State, [f64; 3]) {
        (smallvec![-q[STRESS], q[VELOCITY]], *material)
    }
}

impl Kernel for Elastic {
    fn name(&self) -> &str {
        "Elastic"
    }

    fn n_quantities(&self) -> usize {
        2
    }

    fn stable_dt(&self, store: &EntityStore, element: usize) -> f64 {
        let el = &store.elements()[element];
        self.cfl * el.width / Self::wave_speed(&el.material).max(f64::EPSILON)
    }

    fn apply_step(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        rusanov_step(self, ctx)
    }
}
