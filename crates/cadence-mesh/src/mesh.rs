//! The core `Mesh` trait.

use crate::boundary::BoundaryBehavior;
use std::any::Any;

/// Which side of an element a neighbour query looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Towards decreasing coordinates.
    Left,
    /// Towards increasing coordinates.
    Right,
}

/// Result of a neighbour query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Neighbour {
    /// An element inside the mesh.
    Element(usize),
    /// The element touches the outer boundary on this side.
    Boundary(BoundaryBehavior),
}

/// Topology and geometry of the elements in an [`EntityStore`](crate::EntityStore).
///
/// Kernels read the mesh through `&dyn Mesh` and may downcast to a
/// concrete backend for specialized fast paths.
///
/// # Thread Safety
///
/// `Sync` is required because kernels read the mesh from rayon worker
/// threads while a cluster step is in flight.
pub trait Mesh: Any + Send + Sync + 'static {
    /// Number of elements.
    fn n_elements(&self) -> usize;

    /// Number of faces between (and around) elements.
    fn n_faces(&self) -> usize;

    /// Number of vertices.
    fn n_vertices(&self) -> usize;

    /// Neighbour of `element` across the face on `side`.
    fn neighbour(&self, element: usize, side: Side) -> Neighbour;

    /// Index of the face on `side` of `element`.
    fn face(&self, element: usize, side: Side) -> usize;

    /// Geometric centre of an element.
    fn centroid(&self, element: usize) -> f64;

    /// Size of an element.
    fn width(&self, element: usize) -> f64;

    /// Location of a face.
    fn face_position(&self, face: usize) -> f64;

    /// Location of a vertex.
    fn vertex_position(&self, vertex: usize) -> f64;

    /// Element containing the point `x`, if any.
    fn locate(&self, x: f64) -> Option<usize>;

    /// Outer boundary behavior.
    fn boundary(&self) -> BoundaryBehavior;
}

impl dyn Mesh {
    /// Attempt to downcast a trait object to a concrete mesh type.
    pub fn downcast_ref<T: Mesh>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}
