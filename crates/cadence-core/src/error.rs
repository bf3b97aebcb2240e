//! Error types for the Cadence scheduler.
//!
//! Every error here is fatal at the scheduler level: setup errors abort
//! the run before the compute phase, runtime errors abort it mid-run.
//! Nothing is retried and nothing degrades silently.

use thiserror::Error;

use crate::id::{ClusterId, EntityRange};

/// Errors from cluster construction, scheduling and synchronization.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SchedError {
    /// A time step, duration or configuration value is not admissible,
    /// or a configuration branch is requested that is not implemented.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Human-readable description of the offending value.
        reason: String,
    },

    /// Two clusters claim overlapping entity ranges, or the same id.
    #[error("cluster {cluster} with range {range} collides with cluster {existing}")]
    DuplicateCluster {
        /// The cluster being added.
        cluster: ClusterId,
        /// Its entity range.
        range: EntityRange,
        /// The member it collides with.
        existing: ClusterId,
    },

    /// A distributed collective (reduction, barrier) did not complete.
    #[error("communication failure: {reason}")]
    CommunicationFailure {
        /// Description of the failed collective.
        reason: String,
    },

    /// The numerical kernel failed during a cluster's local step.
    #[error("cluster {cluster} failed at t = {time}: {source}")]
    ComputeFailure {
        /// The cluster whose step failed.
        cluster: ClusterId,
        /// Local time of the cluster at the start of the failed step.
        time: f64,
        /// The underlying kernel error.
        #[source]
        source: KernelError,
    },

    /// `simulate` was called before any cluster was registered.
    #[error("no cluster registered before simulate")]
    NotInitialized,

    /// `simulate` was called after the manager was finalized.
    #[error("manager already finalized")]
    AlreadyFinalized,
}

impl SchedError {
    /// Shorthand for [`SchedError::InvalidConfiguration`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Errors from a numerical kernel's step.
///
/// Returned by `Kernel::apply_step()` and wrapped in
/// [`SchedError::ComputeFailure`] by the cluster.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum KernelError {
    /// A non-finite value was produced (instability detector).
    #[error("non-finite state at entity {entity}")]
    NonFinite {
        /// Global index of the first offending entity.
        entity: usize,
    },

    /// The kernel's step function failed.
    #[error("execution failed: {reason}")]
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// The kernel was handed a range outside the entity store.
    #[error("range {range} exceeds {entities} entities")]
    RangeOutOfBounds {
        /// The offending range.
        range: EntityRange,
        /// Number of entities in the store.
        entities: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn compute_failure_exposes_kernel_source() {
        let err = SchedError::ComputeFailure {
            cluster: ClusterId(2),
            time: 0.5,
            source: KernelError::NonFinite { entity: 7 },
        };
        let src = err.source().expect("source");
        assert_eq!(src.to_string(), "non-finite state at entity 7");
        assert!(err.to_string().contains("cluster 2"));
    }

    #[test]
    fn duplicate_cluster_message_names_both() {
        let err = SchedError::DuplicateCluster {
            cluster: ClusterId(1),
            range: EntityRange::new(4, 4),
            existing: ClusterId(0),
        };
        assert_eq!(
            err.to_string(),
            "cluster 1 with range [4, 8) collides with cluster 0"
        );
    }

    #[test]
    fn invalid_shorthand() {
        assert_eq!(
            SchedError::invalid("dt must be positive"),
            SchedError::InvalidConfiguration {
                reason: "dt must be positive".to_string()
            }
        );
    }
}
