//! Numerical kernels for Cadence.
//!
//! A [`Kernel`] is the equation family the scheduler drives: it reports a
//! per-element stable time step and advances one entity range by one
//! step. The scheduler never looks inside.
//!
//! # Kernels
//!
//! - [`Advection`]: linear scalar advection
//! - [`Elastic`]: 1D velocity-stress elastic waves
//! - [`ShallowWater`]: shallow-water equations
//!
//! All three share a first-order Rusanov finite-volume update and are
//! selected at runtime through [`EquationKind`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod advection;
pub mod context;
pub mod elastic;
pub mod equation;
mod fv;
pub mod kernel;
pub mod swe;

pub use advection::Advection;
pub use context::KernelContext;
pub use elastic::Elastic;
pub use equation::EquationKind;
pub use kernel::{check_finite, Kernel};
pub use swe::ShallowWater;
