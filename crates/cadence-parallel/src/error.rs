//! Errors from the parallel runtime.

use cadence_core::{Rank, SchedError};
use thiserror::Error;

/// Errors from collectives and thread-pool setup.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommError {
    /// A peer dropped its communicator mid-collective.
    #[error("rank {rank} disconnected")]
    Disconnected {
        /// The rank that went away.
        rank: Rank,
    },

    /// The rayon pool could not be built.
    #[error("thread pool: {reason}")]
    ThreadPool {
        /// Error reported by rayon.
        reason: String,
    },
}

impl From<CommError> for SchedError {
    fn from(e: CommError) -> Self {
        SchedError::CommunicationFailure {
            reason: e.to_string(),
        }
    }
}
