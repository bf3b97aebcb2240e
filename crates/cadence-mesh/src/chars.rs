//! Per-entity characteristics: geometry, material and sparse types.

/// Sparse-type bit flags attached to vertices, faces and elements.
///
/// Sparse types tag special entities. Kernels test them with
/// `chars.sparse_type & FLAG != 0`.
pub mod sparse_type {
    /// Face acts as a reflecting wall.
    pub const FREE_SURFACE: u32 = 1;
    /// Face lets waves leave without reflection.
    pub const OUTFLOW: u32 = 2;
    /// Entity hosts a receiver.
    pub const RECEIVER: u32 = 4;
}

/// Characteristics of one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementChars {
    /// Geometric centre.
    pub centroid: f64,
    /// Element size.
    pub width: f64,
    /// Equation-specific material parameters.
    ///
    /// Advection: `[velocity, _, _]`. Elastic: `[density, lambda, mu]`.
    /// Shallow water ignores them.
    pub material: [f64; 3],
    /// Sparse-type bits.
    pub sparse_type: u32,
}

/// Characteristics of one face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceChars {
    /// Face location.
    pub position: f64,
    /// Sparse-type bits.
    pub sparse_type: u32,
}

/// Characteristics of one vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexChars {
    /// Vertex location.
    pub position: f64,
    /// Sparse-type bits.
    pub sparse_type: u32,
}
