//! Entity storage: element state plus per-entity characteristics.

use crate::chars::{ElementChars, FaceChars, VertexChars};
use crate::error::MeshError;
use crate::mesh::Mesh;
use cadence_core::EntityRange;
use std::fmt;

/// Material assigned to every element at construction.
///
/// Unit advection speed and unit elastic wave speed.
pub const DEFAULT_MATERIAL: [f64; 3] = [1.0, 1.0, 0.0];

/// Numerical state and characteristics of every entity of a mesh.
///
/// State is stored row-major: element `i` owns
/// `values[i * n_quantities..(i + 1) * n_quantities]`. Clusters address
/// it only through [`EntityRange`]s.
pub struct EntityStore {
    mesh: Box<dyn Mesh>,
    n_quantities: usize,
    values: Vec<f64>,
    elements: Vec<ElementChars>,
    faces: Vec<FaceChars>,
    vertices: Vec<VertexChars>,
}

impl EntityStore {
    /// Allocate zeroed state for `n_quantities` quantities per element
    /// and derive characteristics from the mesh geometry.
    pub fn new(mesh: impl Mesh, n_quantities: usize) -> Result<Self, MeshError> {
        if n_quantities == 0 {
            return Err(MeshError::QuantityMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let n = mesh.n_elements();
        let elements = (0..n)
            .map(|i| ElementChars {
                centroid: mesh.centroid(i),
                width: mesh.width(i),
                material: DEFAULT_MATERIAL,
                sparse_type: 0,
            })
            .collect();
        let faces = (0..mesh.n_faces())
            .map(|f| FaceChars {
                position: mesh.face_position(f),
                sparse_type: 0,
            })
            .collect();
        let vertices = (0..mesh.n_vertices())
            .map(|v| VertexChars {
                position: mesh.vertex_position(v),
                sparse_type: 0,
            })
            .collect();
        Ok(Self {
            mesh: Box::new(mesh),
            n_quantities,
            values: vec![0.0; n * n_quantities],
            elements,
            faces,
            vertices,
        })
    }

    /// The mesh this store lives on.
    pub fn mesh(&self) -> &dyn Mesh {
        self.mesh.as_ref()
    }

    /// Quantities per element.
    pub fn n_quantities(&self) -> usize {
        self.n_quantities
    }

    /// Number of elements.
    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Range covering every element.
    pub fn full_range(&self) -> EntityRange {
        EntityRange::new(0, self.n_elements())
    }

    /// Whole state, row-major.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// State of one element.
    ///
    /// # Panics
    ///
    /// Panics if `element >= n_elements()`.
    pub fn state(&self, element: usize) -> &[f64] {
        let q = self.n_quantities;
        &self.values[element * q..(element + 1) * q]
    }

    /// Check that `range` lies inside the store.
    pub fn check_range(&self, range: EntityRange) -> Result<(), MeshError> {
        if range.end() > self.n_elements() {
            return Err(MeshError::RangeOutOfBounds {
                range,
                entities: self.n_elements(),
            });
        }
        Ok(())
    }

    /// State of the elements in `range`.
    pub fn read(&self, range: EntityRange) -> Result<&[f64], MeshError> {
        self.check_range(range)?;
        let q = self.n_quantities;
        Ok(&self.values[range.first * q..range.end() * q])
    }

    /// Mutable state of the elements in `range`.
    pub fn range_mut(&mut self, range: EntityRange) -> Result<&mut [f64], MeshError> {
        self.check_range(range)?;
        let q = self.n_quantities;
        Ok(&mut self.values[range.first * q..range.end() * q])
    }

    /// Overwrite the state of `range` with `src`.
    pub fn write(&mut self, range: EntityRange, src: &[f64]) -> Result<(), MeshError> {
        let q = self.n_quantities;
        let dst = self.range_mut(range)?;
        if dst.len() != src.len() {
            return Err(MeshError::QuantityMismatch {
                expected: q,
                actual: src.len() / range.len.max(1),
            });
        }
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Set every element's state from a function of its centroid.
    pub fn initialize(&mut self, mut f: impl FnMut(f64, &mut [f64])) {
        let q = self.n_quantities;
        for (el, state) in self.elements.iter().zip(self.values.chunks_mut(q)) {
            f(el.centroid, state);
        }
    }

    /// Set every element's material from a function of its centroid.
    pub fn set_material(&mut self, mut f: impl FnMut(f64) -> [f64; 3]) {
        for el in &mut self.elements {
            el.material = f(el.centroid);
        }
    }

    /// Element characteristics.
    pub fn elements(&self) -> &[ElementChars] {
        &self.elements
    }

    /// Mutable element characteristics.
    pub fn elements_mut(&mut self) -> &mut [ElementChars] {
        &mut self.elements
    }

    /// Face characteristics.
    pub fn faces(&self) -> &[FaceChars] {
        &self.faces
    }

    /// Mutable face characteristics.
    pub fn faces_mut(&mut self) -> &mut [FaceChars] {
        &mut self.faces
    }

    /// Vertex characteristics.
    pub fn vertices(&self) -> &[VertexChars] {
        &self.vertices
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("n_elements", &self.n_elements())
            .field("n_quantities", &self.n_quantities)
            .field("boundary", &self.mesh.boundary())
            .finish()
    }
}
