//! Mesh and entity storage for Cadence simulations.
//!
//! This crate is the data layer the scheduler borrows from. It owns the
//! numerical state of every element, the per-entity characteristics
//! (geometry, material, sparse types) and the mesh topology. Clusters only
//! ever hold [`EntityRange`](cadence_core::EntityRange)s into an
//! [`EntityStore`].
//!
//! # Backends
//!
//! - [`Line1D`]: 1D line of elements with a configurable [`BoundaryBehavior`]

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod chars;
pub mod error;
pub mod line;
pub mod mesh;
pub mod overrides;
pub mod store;

pub use boundary::BoundaryBehavior;
pub use chars::{sparse_type, ElementChars, FaceChars, VertexChars};
pub use error::MeshError;
pub use line::Line1D;
pub use mesh::{Mesh, Neighbour, Side};
pub use overrides::{OverrideCategory, SparseTypeOverride};
pub use store::EntityStore;
