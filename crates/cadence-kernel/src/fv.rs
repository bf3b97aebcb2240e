//! First-order Rusanov finite-volume update shared by every kernel.
//!
//! ```text
//! F(qL, qR) = (f(qL) + f(qR)) / 2 - s / 2 * (qR - qL),  s = max(|λL|, |λR|)
//! q_i' = q_i - dt / dx_i * (F_{i+1/2} - F_{i-1/2})
//! ```
//!
//! Ghost states at the outer boundary and at tagged faces:
//! - `FREE_SURFACE` face or `Reflect` boundary: mirrored state
//! - `OUTFLOW` face or `Outflow` boundary: copy of the own state

use crate::context::KernelContext;
use crate::kernel::check_finite;
use cadence_core::KernelError;
use cadence_mesh::{sparse_type, BoundaryBehavior, EntityStore, Neighbour, Side};
use rayon::prelude::*;
use smallvec::SmallVec;

/// Per-element state vector. Every kernel has at most four quantities.
pub(crate) type State = SmallVec<[f64; 4]>;

/// Physical description of a hyperbolic system for the Rusanov update.
pub(crate) trait Physics: Sync {
    /// Quantities per element.
    fn n_quantities(&self) -> usize;

    /// Physical flux `f(q)`.
    fn flux(&self, q: &[f64], material: &[f64; 3]) -> State;

    /// Largest absolute characteristic speed at `q`.
    fn max_speed(&self, q: &[f64], material: &[f64; 3]) -> f64;

    /// Ghost state and material behind a reflecting wall.
    fn mirror(&self, q: &[f64], material: &[f64; 3]) -> (State, [f64; 3]);
}

/// Rusanov numerical flux between a left and a right state.
fn rusanov<P: Physics>(p: &P, ql: &[f64], ml: &[f64; 3], qr: &[f64], mr: &[f64; 3]) -> State {
    let fl = p.flux(ql, ml);
    let fr = p.flux(qr, mr);
    let s = p.max_speed(ql, ml).max(p.max_speed(qr, mr));
    fl.iter()
        .zip(&fr)
        .zip(ql.iter().zip(qr))
        .map(|((a, b), (l, r))| 0.5 * (a + b) - 0.5 * s * (r - l))
        .collect()
}

/// State and material seen across the face on `side` of `element`.
fn outer_state<P: Physics>(
    p: &P,
    store: &EntityStore,
    element: usize,
    side: Side,
) -> (State, [f64; 3]) {
    let mesh = store.mesh();
    let own = store.state(element);
    let material = store.elements()[element].material;
    let bits = store.faces()[mesh.face(element, side)].sparse_type;

    if bits & sparse_type::FREE_SURFACE != 0 {
        return p.mirror(own, &material);
    }
    if bits & sparse_type::OUTFLOW != 0 {
        return (SmallVec::from_slice(own), material);
    }
    match mesh.neighbour(element, side) {
        Neighbour::Element(j) => (
            SmallVec::from_slice(store.state(j)),
            store.elements()[j].material,
        ),
        Neighbour::Boundary(BoundaryBehavior::Reflect) => p.mirror(own, &material),
        Neighbour::Boundary(_) => (SmallVec::from_slice(own), material),
    }
}

/// Advance `ctx.range()` by one Rusanov step.
pub(crate) fn rusanov_step<P: Physics>(
    p: &P,
    ctx: &mut KernelContext<'_>,
) -> Result<(), KernelError> {
    let store = ctx.store();
    let range = ctx.range();
    let dt = ctx.dt();
    let q = store.n_quantities();

    store
        .check_range(range)
        .map_err(|_| KernelError::RangeOutOfBounds {
            range,
            entities: store.n_elements(),
        })?;
    if q != p.n_quantities() {
        return Err(KernelError::ExecutionFailed {
            reason: format!(
                "store holds {q} quantities per element, kernel needs {}",
                p.n_quantities()
            ),
        });
    }
    if ctx.out().len() != range.len * q {
        return Err(KernelError::ExecutionFailed {
            reason: format!(
                "output buffer holds {} values, range {} needs {}",
                ctx.out().len(),
                range,
                range.len * q
            ),
        });
    }

    ctx.out()
        .par_chunks_mut(q)
        .enumerate()
        .for_each(|(k, out)| {
            let i = range.first + k;
            let own = store.state(i);
            let material = store.elements()[i].material;
            let (left, lm) = outer_state(p, store, i, Side::Left);
            let (right, rm) = outer_state(p, store, i, Side::Right);
            let f_left = rusanov(p, &left, &lm, own, &material);
            let f_right = rusanov(p, own, &material, &right, &rm);
            let ratio = dt / store.elements()[i].width;
            for (c, value) in out.iter_mut().enumerate() {
                *value = own[c] - ratio * (f_right[c] - f_left[c]);
            }
        });

    check_finite(ctx.out(), q, range.first)
}
