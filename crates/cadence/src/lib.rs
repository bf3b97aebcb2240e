//! Cadence: a multi-rate time-integration scheduler for explicit
//! wave-propagation solvers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Cadence sub-crates, plus [`setup`] for running a simulation
//! straight from a [`RunConfig`](engine::RunConfig).
//!
//! # Quick start
//!
//! ```rust
//! use cadence::prelude::*;
//!
//! let config = RunConfig::from_json(r#"{
//!     "end_time": 1.0,
//!     "wave_field_int": 0.25,
//!     "equation": "advection",
//!     "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 }
//! }"#).unwrap();
//!
//! let outcomes = cadence::setup::run(&config, &NullReporter).unwrap();
//! let report = &outcomes[0].report;
//! assert_eq!(report.sync_points, 4);
//! assert_eq!(report.final_time, 1.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cadence-core` | IDs, entity ranges, errors, time tolerances |
//! | [`mesh`] | `cadence-mesh` | `Line1D`, `EntityStore`, sparse-type overrides |
//! | [`kernel`] | `cadence-kernel` | `Kernel` trait and the three equation families |
//! | [`parallel`] | `cadence-parallel` | Thread pool and process communicators |
//! | [`engine`] | `cadence-engine` | Clusters, negotiation, manager, driver loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// IDs, entity ranges, errors and time tolerances (`cadence-core`).
pub use cadence_core as types;

/// Mesh and entity storage (`cadence-mesh`).
///
/// [`mesh::Line1D`] is the only mesh; [`mesh::EntityStore`] holds the
/// per-element state the scheduler advances.
pub use cadence_mesh as mesh;

/// Numerical kernels (`cadence-kernel`).
///
/// [`kernel::Kernel`] is the extension point for new equations.
pub use cadence_kernel as kernel;

/// Thread pool and communicators (`cadence-parallel`).
pub use cadence_parallel as parallel;

/// The scheduler (`cadence-engine`).
///
/// [`engine::Manager`] drives a [`engine::ClusterSet`] between
/// synchronization points; [`engine::driver::run`] is the loop around it.
pub use cadence_engine as engine;

pub mod setup;

/// Common imports for typical Cadence usage.
///
/// ```rust
/// use cadence::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use cadence_core::{ClusterId, EntityRange, KernelError, Rank, SchedError};

    // Mesh
    pub use cadence_mesh::{BoundaryBehavior, EntityStore, Line1D, Mesh};

    // Kernels
    pub use cadence_kernel::{Advection, Elastic, EquationKind, Kernel, KernelContext, ShallowWater};

    // Parallel runtime
    pub use cadence_parallel::{Communicator, LocalGroup, SharedRuntime, SingleProcess};

    // Engine
    pub use cadence_engine::{
        Cluster, ClusterSet, GlobalStepNegotiator, Manager, NullReporter, NullWriter, Reporter,
        RunConfig, RunReport, SyncSchedule, TracingReporter, WaveFieldWriter,
    };

    // Setup
    pub use crate::setup::{run_rank, RankOutcome, RunError};
}
