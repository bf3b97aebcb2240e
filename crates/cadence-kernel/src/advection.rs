//! Linear scalar advection.
//!
//! ```text
//! u_t + (a u)_x = 0
//! ```
//!
//! One quantity per element. The advection speed `a` is the first
//! material parameter of each element, so heterogeneous speeds produce
//! the spread of stable steps that local time stepping exploits.
//!
//! Constructed via the builder pattern: [`Advection::builder`].

use crate::context::KernelContext;
use crate::fv::{rusanov_step, Physics, State};
use crate::kernel::Kernel;
use cadence_core::KernelError;
use cadence_mesh::EntityStore;
use smallvec::smallvec;

/// A first-order finite-volume scalar advection kernel.
///
/// # Stability
///
/// The stable step of element `i` is `cfl * width_i / |a_i|`.
#[derive(Debug)]
pub struct Advection {
    cfl: f64,
}

/// Builder for [`Advection`].
pub struct AdvectionBuilder {
    cfl: f64,
}

impl Advection {
    /// Create a new builder for configuring an `Advection` kernel.
    pub fn builder() -> AdvectionBuilder {
        AdvectionBuilder { cfl: 0.5 }
    }

    /// Courant number used for the stable step.
    pub fn cfl(&self) -> f64 {
        self.cfl
    }
}

impl AdvectionBuilder {
    /// Set the Courant number (default: 0.5). Must be in `(0, 1]`.
    pub fn cfl(mut self, cfl: f64) -> Self {
        self.cfl = cfl;
        self
    }

    /// Build the kernel, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `cfl` is not in `(0, 1]` or is NaN.
    pub fn build(self) -> Result<Advection, String> {
        if !(self.cfl > 0.0 && self.cfl <= 1.0) {
            return Err(format!("cfl must be in (0, 1], got {}", self.cfl));
        }
        Ok(Advection { cfl: self.cfl })
    }
}

impl Physics for Advection {
    fn n_quantities(&self) -> usize {
        1
    }

    fn flux(&self, q: &[f64], material: &[f64; 3]) -> State {
        smallvec![material[0] * q[0]]
    }

    fn max_speed(&self, _q: &[f64], material: &[f64; 3]) -> f64 {
        material[0].abs()
    }

    fn mirror(&self, q: &[f64], material: &[f64; 3]) -> (State, [f64; 3]) {
        // Opposing speed cancels the wall flux.
        (smallvec![q[0]], [-material[0], material[1], material[2]])
    }
}

impl Kernel for Advection {
    fn name(&self) -> &str {
        "Advection"
    }

    fn n_quantities(&self) -> usize {
        1
    }

    fn stable_dt(&self, store: &EntityStore, element: usize) -> f64 {
        let el = &store.elements()[element];
        self.cfl * el.width / el.material[0].abs().max(f64::EPSILON)
    }

    fn apply_step(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        rusanov_step(self, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::EntityRange;
    use cadence_mesh::{sparse_type, BoundaryBehavior, Line1D};

    fn store(n: usize, boundary: BoundaryBehavior) -> EntityStore {
        let mesh = Line1D::new(n, 0.0, 1.0, boundary).unwrap();
        EntityStore::new(mesh, 1).unwrap()
    }

    fn step(kernel: &Advection, store: &EntityStore, range: EntityRange, dt: f64) -> Vec<f64> {
        let mut out = vec![0.0; range.len];
        let mut ctx = KernelContext::new(store, range, &mut out, 0.0, dt);
        kernel.apply_step(&mut ctx).unwrap();
        out
    }

    // ---------------------------------------------------------------
    // Builder tests
    // ---------------------------------------------------------------

    #[test]
    fn builder_defaults() {
        let k = Advection::builder().build().unwrap();
        assert_eq!(k.name(), "Advection");
        assert_eq!(Kernel::n_quantities(&k), 1);
        assert_eq!(k.cfl(), 0.5);
    }

    #[test]
    fn builder_rejects_bad_cfl() {
        for cfl in [0.0, -0.5, 1.5, f64::NAN] {
            let err = Advection::builder().cfl(cfl).build().unwrap_err();
            assert!(err.contains("cfl"));
        }
    }

    // ---------------------------------------------------------------
    // Numerics
    // ---------------------------------------------------------------

    #[test]
    fn stable_dt_scales_with_speed() {
        let k = Advection::builder().build().unwrap();
        let mut s = store(10, BoundaryBehavior::Periodic);
        s.set_material(|x| if x < 0.5 { [1.0, 0.0, 0.0] } else { [4.0, 0.0, 0.0] });
        assert!((k.stable_dt(&s, 0) - 0.05).abs() < 1e-12);
        assert!((k.stable_dt(&s, 9) - 0.0125).abs() < 1e-12);
        assert_eq!(k.stable_dts(&s).len(), 10);
    }

    #[test]
    fn uniform_state_is_preserved() {
        let k = Advection::builder().build().unwrap();
        let mut s = store(8, BoundaryBehavior::Periodic);
        s.initialize(|_, q| q[0] = 3.0);
        let out = step(&k, &s, s.full_range(), 0.05);
        assert!(out.iter().all(|v| (v - 3.0).abs() < 1e-12));
    }

    #[test]
    fn pulse_moves_downwind() {
        let k = Advection::builder().build().unwrap();
        let mut s = store(8, BoundaryBehavior::Periodic);
        s.initialize(|x, q| q[0] = if (0.25..0.375).contains(&x) { 1.0 } else { 0.0 });
        // Unit speed, unit Courant number: exact shift by one element.
        let out = step(&k, &s, s.full_range(), 0.125);
        assert!((out[2] - 0.0).abs() < 1e-12);
        assert!((out[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn periodic_step_conserves_mass() {
        let k = Advection::builder().build().unwrap();
        let mut s = store(16, BoundaryBehavior::Periodic);
        s.initialize(|x, q| q[0] = (6.0 * x).sin() + 2.0);
        let before: f64 = s.values().iter().sum();
        let out = step(&k, &s, s.full_range(), 0.03);
        let after: f64 = out.iter().sum();
        assert!((before - after).abs() < 1e-10);
    }

    #[test]
    fn free_surface_face_blocks_flux() {
        let k = Advection::builder().build().unwrap();
        let mut s = store(4, BoundaryBehavior::Outflow);
        s.faces_mut()[4].sparse_type = sparse_type::FREE_SURFACE;
        s.initialize(|_, q| q[0] = 1.0);
        let out = step(&k, &s, EntityRange::new(3, 1), 0.1);
        // Inflow from the left neighbour equals the own value, no outflow.
        assert!(out[0] > 1.0);
    }

    #[test]
    fn subrange_only_writes_its_entities() {
        let k = Advection::builder().build().unwrap();
        let mut s = store(8, BoundaryBehavior::Periodic);
        s.initialize(|x, q| q[0] = x);
        let out = step(&k, &s, EntityRange::new(2, 3), 0.05);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn out_of_bounds_range_is_rejected() {
        let k = Advection::builder().build().unwrap();
        let s = store(4, BoundaryBehavior::Periodic);
        let mut out = vec![0.0; 2];
        let mut ctx = KernelContext::new(&s, EntityRange::new(3, 2), &mut out, 0.0, 0.1);
        assert_eq!(
            k.apply_step(&mut ctx),
            Err(KernelError::RangeOutOfBounds {
                range: EntityRange::new(3, 2),
                entities: 4
            })
        );
    }

    #[test]
    fn non_finite_state_is_detected() {
        let k = Advection::builder().build().unwrap();
        let mut s = store(4, BoundaryBehavior::Periodic);
        s.initialize(|x, q| q[0] = if x > 0.5 && x < 0.75 { f64::NAN } else { 0.0 });
        let mut out = vec![0.0; 4];
        let mut ctx = KernelContext::new(&s, s.full_range(), &mut out, 0.0, 0.1);
        assert!(matches!(
            k.apply_step(&mut ctx),
            Err(KernelError::NonFinite { .. })
        ));
    }
}
