//! Error types for mesh construction and entity storage access.

use cadence_core::EntityRange;
use thiserror::Error;

/// Errors arising from mesh construction or entity storage access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Attempted to construct a mesh with zero elements.
    #[error("mesh must have at least one element")]
    EmptyMesh,

    /// The mesh extent is empty, inverted or not finite.
    #[error("invalid mesh extent [{x_min}, {x_max}]")]
    InvalidExtent {
        /// Left end of the domain.
        x_min: f64,
        /// Right end of the domain.
        x_max: f64,
    },

    /// An entity range reaches past the end of the store.
    #[error("range {range} exceeds {entities} elements")]
    RangeOutOfBounds {
        /// The offending range.
        range: EntityRange,
        /// Number of elements in the store.
        entities: usize,
    },

    /// A state slice has the wrong number of quantities.
    #[error("expected {expected} quantities per element, got {actual}")]
    QuantityMismatch {
        /// Quantities per element in the store.
        expected: usize,
        /// Quantities supplied.
        actual: usize,
    },
}
