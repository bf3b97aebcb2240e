//! Core types for the Cadence time-integration scheduler.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers, error types and time tolerances shared by the mesh,
//! kernel, parallel-runtime and engine crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod time;

pub use error::{KernelError, SchedError};
pub use id::{ClusterId, EntityRange, Rank};
pub use time::{horizon_reached, times_match, STEP_TOLERANCE, TIME_TOLERANCE};
