//! Parallel-runtime handles for Cadence.
//!
//! Two layers of parallelism:
//!
//! - **Shared memory**: [`SharedRuntime`] wraps a fixed-size rayon pool
//!   that kernels run inside.
//! - **Processes**: the [`Communicator`] trait provides the collectives
//!   the scheduler needs (all-reduce and barrier). [`SingleProcess`] is
//!   the trivial one-rank group; [`LocalGroup`] connects `n` simulated
//!   ranks running on separate threads through crossbeam channels.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod comm;
pub mod error;
pub mod local;
pub mod shared;

pub use comm::{Communicator, ReduceOp, SingleProcess};
pub use error::CommError;
pub use local::{LocalComm, LocalGroup};
pub use shared::SharedRuntime;
