//! Boundary behavior at the ends of a mesh.

use serde::Deserialize;

/// How a mesh closes its outer boundary.
///
/// This controls the *topology* at the domain edges. Interior walls are
/// expressed through face sparse types instead
/// (see [`sparse_type::FREE_SURFACE`](crate::sparse_type::FREE_SURFACE)).
///
/// # Examples
///
/// ```
/// use cadence_mesh::{BoundaryBehavior, Line1D, Mesh, Neighbour, Side};
///
/// let periodic = Line1D::new(4, 0.0, 1.0, BoundaryBehavior::Periodic).unwrap();
/// assert_eq!(periodic.neighbour(0, Side::Left), Neighbour::Element(3));
///
/// let outflow = Line1D::new(4, 0.0, 1.0, BoundaryBehavior::Outflow).unwrap();
/// assert_eq!(
///     outflow.neighbour(0, Side::Left),
///     Neighbour::Boundary(BoundaryBehavior::Outflow)
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryBehavior {
    /// The last element's right neighbour is the first element.
    Periodic,
    /// Zero-gradient ghost state: waves leave the domain.
    Outflow,
    /// Mirrored ghost state: waves reflect off the boundary.
    Reflect,
}

impl Default for BoundaryBehavior {
    fn default() -> Self {
        Self::Periodic
    }
}
