//! Runtime selection of the equation family.

use crate::advection::Advection;
use crate::elastic::Elastic;
use crate::kernel::Kernel;
use crate::swe::ShallowWater;
use serde::Deserialize;
use std::fmt;

/// Equation family of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquationKind {
    /// [`Advection`].
    Advection,
    /// [`Elastic`].
    Elastic,
    /// [`ShallowWater`].
    ShallowWater,
}

impl EquationKind {
    /// Quantities per element of this equation.
    pub fn n_quantities(self) -> usize {
        match self {
            Self::Advection => 1,
            Self::Elastic | Self::ShallowWater => 2,
        }
    }

    /// Build the kernel with the given Courant number and default
    /// parameters otherwise.
    pub fn build(self, cfl: f64) -> Result<Box<dyn Kernel>, String> {
        Ok(match self {
            Self::Advection => Box::new(Advection::builder().cfl(cfl).build()?),
            Self::Elastic => Box::new(Elastic::builder().cfl(cfl).build()?),
            Self::ShallowWater => Box::new(ShallowWater::builder().cfl(cfl).build()?),
        })
    }
}

impl fmt::Display for EquationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advection => write!(f, "advection"),
            Self::Elastic => write!(f, "elastic"),
            Self::ShallowWater => write!(f, "shallow_water"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_kernel_matches_kind() {
        for kind in [
            EquationKind::Advection,
            EquationKind::Elastic,
            EquationKind::ShallowWater,
        ] {
            let k = kind.build(0.5).unwrap();
            assert_eq!(k.n_quantities(), kind.n_quantities());
        }
    }

    #[test]
    fn bad_cfl_propagates() {
        assert!(EquationKind::Elastic.build(0.0).is_err());
    }

    #[test]
    fn deserializes_snake_case() {
        let kind: EquationKind = serde_json::from_str("\"shallow_water\"").unwrap();
        assert_eq!(kind, EquationKind::ShallowWater);
        assert_eq!(kind.to_string(), "shallow_water");
    }
}
