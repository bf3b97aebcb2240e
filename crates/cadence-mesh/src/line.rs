//! 1D line mesh with configurable boundary behavior.

use crate::boundary::BoundaryBehavior;
use crate::error::MeshError;
use crate::mesh::{Mesh, Neighbour, Side};

/// A uniform one-dimensional line mesh on `[x_min, x_max]`.
///
/// Element `i` spans faces `i` and `i + 1`, so a mesh of `n` elements has
/// `n + 1` faces. Vertices coincide with faces in 1D.
///
/// # Examples
///
/// ```
/// use cadence_mesh::{BoundaryBehavior, Line1D, Mesh};
///
/// let line = Line1D::new(4, 0.0, 2.0, BoundaryBehavior::Outflow).unwrap();
/// assert_eq!(line.n_elements(), 4);
/// assert_eq!(line.n_faces(), 5);
/// assert_eq!(line.width(0), 0.5);
/// assert_eq!(line.centroid(1), 0.75);
/// assert_eq!(line.locate(1.9), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Line1D {
    n_elements: usize,
    x_min: f64,
    x_max: f64,
    boundary: BoundaryBehavior,
}

impl Line1D {
    /// Create a line of `n_elements` equal elements.
    ///
    /// Returns `Err(MeshError::EmptyMesh)` if `n_elements == 0`, or
    /// `Err(MeshError::InvalidExtent)` unless `x_min < x_max` and both
    /// are finite.
    pub fn new(
        n_elements: usize,
        x_min: f64,
        x_max: f64,
        boundary: BoundaryBehavior,
    ) -> Result<Self, MeshError> {
        if n_elements == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if !(x_min.is_finite() && x_max.is_finite() && x_min < x_max) {
            return Err(MeshError::InvalidExtent { x_min, x_max });
        }
        Ok(Self {
            n_elements,
            x_min,
            x_max,
            boundary,
        })
    }

    /// Left end of the domain.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Right end of the domain.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    fn spacing(&self) -> f64 {
        (self.x_max - self.x_min) / self.n_elements as f64
    }
}

impl Mesh for Line1D {
    fn n_elements(&self) -> usize {
        self.n_elements
    }

    fn n_faces(&self) -> usize {
        self.n_elements + 1
    }

    fn n_vertices(&self) -> usize {
        self.n_elements + 1
    }

    fn neighbour(&self, element: usize, side: Side) -> Neighbour {
        let last = self.n_elements - 1;
        match (side, self.boundary) {
            (Side::Left, _) if element > 0 => Neighbour::Element(element - 1),
            (Side::Right, _) if element < last => Neighbour::Element(element + 1),
            (Side::Left, BoundaryBehavior::Periodic) => Neighbour::Element(last),
            (Side::Right, BoundaryBehavior::Periodic) => Neighbour::Element(0),
            (_, boundary) => Neighbour::Boundary(boundary),
        }
    }

    fn face(&self, element: usize, side: Side) -> usize {
        match side {
            Side::Left => element,
            Side::Right => element + 1,
        }
    }

    fn centroid(&self, element: usize) -> f64 {
        self.x_min + (element as f64 + 0.5) * self.spacing()
    }

    fn width(&self, _element: usize) -> f64 {
        self.spacing()
    }

    fn face_position(&self, face: usize) -> f64 {
        if face >= self.n_elements {
            return self.x_max;
        }
        self.x_min + face as f64 * self.spacing()
    }

    fn vertex_position(&self, vertex: usize) -> f64 {
        self.face_position(vertex)
    }

    fn locate(&self, x: f64) -> Option<usize> {
        if !(self.x_min..=self.x_max).contains(&x) {
            return None;
        }
        let i = ((x - self.x_min) / self.spacing()).floor() as usize;
        Some(i.min(self.n_elements - 1))
    }

    fn boundary(&self) -> BoundaryBehavior {
        self.boundary
    }
}
