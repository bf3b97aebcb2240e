//! The [`Communicator`] trait and the single-process group.

use crate::error::CommError;
use cadence_core::Rank;

/// Reduction operator for [`Communicator::all_reduce`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Sum of all values.
    Sum,
}

impl ReduceOp {
    /// Combine two values.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Min => a.min(b),
            Self::Max => a.max(b),
            Self::Sum => a + b,
        }
    }
}

/// Collective operations across the processes of a run.
///
/// Every collective is blocking and must be called by every rank in the
/// same order.
pub trait Communicator: Send + Sync {
    /// This process's rank.
    fn rank(&self) -> Rank;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Reduce `value` across all ranks; every rank receives the result.
    fn all_reduce(&self, value: f64, op: ReduceOp) -> Result<f64, CommError>;

    /// Block until every rank has reached the barrier.
    fn barrier(&self) -> Result<(), CommError>;
}

/// Communicator of a run with exactly one process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> Rank {
        Rank(0)
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce(&self, value: f64, _op: ReduceOp) -> Result<f64, CommError> {
        Ok(value)
    }

    fn barrier(&self) -> Result<(), CommError> {
        Ok(())
    }
}
