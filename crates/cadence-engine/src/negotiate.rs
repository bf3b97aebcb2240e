//! Process-wide step negotiation.
//!
//! Every process computes statistics of its local stable steps; the
//! negotiator all-reduces them so that every process agrees on the same
//! global step:
//!
//! ```text
//! dt_global = MIN(local min)
//! max       = MAX(local max)
//! mean      = SUM(local mean * count) / SUM(count)
//! ```
//!
//! Only `dt_global` drives the schedule. Mean and max are diagnostics.

use cadence_core::SchedError;
use cadence_kernel::Kernel;
use cadence_mesh::EntityStore;
use cadence_parallel::{Communicator, ReduceOp};
use std::fmt;

/// Min, mean and max of a set of stable step candidates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepStats {
    /// Smallest candidate.
    pub min: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Largest candidate.
    pub max: f64,
    /// Number of candidates.
    pub count: u64,
}

impl StepStats {
    /// Statistics of per-entity stable step candidates.
    ///
    /// Returns `InvalidConfiguration` if `candidates` is empty or holds a
    /// non-finite or non-positive value.
    pub fn from_candidates(candidates: &[f64]) -> Result<Self, SchedError> {
        if candidates.is_empty() {
            return Err(SchedError::invalid("no stable step candidates"));
        }
        if let Some((i, dt)) = candidates
            .iter()
            .enumerate()
            .find(|(_, dt)| !(**dt > 0.0 && dt.is_finite()))
        {
            return Err(SchedError::invalid(format!(
                "stable step of entity {i} must be finite and > 0, got {dt}"
            )));
        }
        let min = candidates.iter().copied().fold(f64::INFINITY, f64::min);
        let max = candidates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = candidates.iter().sum::<f64>() / candidates.len() as f64;
        Ok(Self {
            min,
            mean,
            max,
            count: candidates.len() as u64,
        })
    }
}

/// Outcome of a negotiation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NegotiatedStep {
    /// The step every process uses. Equal to `global.min`.
    pub dt_global: f64,
    /// Statistics across all processes.
    pub global: StepStats,
    /// Statistics of this process.
    pub local: StepStats,
}

/// Reduces local step statistics across the processes of a run.
pub struct GlobalStepNegotiator<'c> {
    comm: &'c dyn Communicator,
}

impl<'c> GlobalStepNegotiator<'c> {
    /// Create a negotiator over `comm`.
    pub fn new(comm: &'c dyn Communicator) -> Self {
        Self { comm }
    }

    /// Agree on the global step. Collective: every process must call it.
    ///
    /// With a single process the result is the local statistics,
    /// unchanged. A failed reduction returns `CommunicationFailure`.
    pub fn negotiate(&self, local: StepStats) -> Result<NegotiatedStep, SchedError> {
        if self.comm.size() == 1 {
            return Ok(NegotiatedStep {
                dt_global: local.min,
                global: local,
                local,
            });
        }
        let min = self.comm.all_reduce(local.min, ReduceOp::Min)?;
        let max = self.comm.all_reduce(local.max, ReduceOp::Max)?;
        let weighted = self
            .comm
            .all_reduce(local.mean * local.count as f64, ReduceOp::Sum)?;
        let count = self.comm.all_reduce(local.count as f64, ReduceOp::Sum)?;
        let global = StepStats {
            min,
            mean: weighted / count,
            max,
            count: count as u64,
        };
        Ok(NegotiatedStep {
            dt_global: min,
            global,
            local,
        })
    }

    /// Same collective as [`negotiate`](Self::negotiate), for runs that
    /// change their stable steps after setup.
    pub fn renegotiate(&self, local: StepStats) -> Result<NegotiatedStep, SchedError> {
        self.negotiate(local)
    }

    /// Compute local statistics from `kernel` on `store`, then negotiate.
    pub fn negotiate_for(
        &self,
        kernel: &dyn Kernel,
        store: &EntityStore,
    ) -> Result<NegotiatedStep, SchedError> {
        let local = StepStats::from_candidates(&kernel.stable_dts(store))?;
        self.negotiate(local)
    }
}

impl fmt::Debug for GlobalStepNegotiator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalStepNegotiator")
            .field("rank", &self.comm.rank())
            .field("size", &self.comm.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_parallel::SingleProcess;

    #[test]
    fn stats_from_candidates() {
        let s = StepStats::from_candidates(&[0.2, 0.1, 0.3]).unwrap();
        assert_eq!(s.min, 0.1);
        assert_eq!(s.max, 0.3);
        assert!((s.mean - 0.2).abs() < 1e-15);
        assert_eq!(s.count, 3);
    }

    #[test]
    fn stats_reject_bad_candidates() {
        assert!(StepStats::from_candidates(&[]).is_err());
        assert!(StepStats::from_candidates(&[0.1, 0.0]).is_err());
        assert!(StepStats::from_candidates(&[0.1, f64::NAN]).is_err());
        assert!(StepStats::from_candidates(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn single_process_passes_through_exactly() {
        let local = StepStats::from_candidates(&[0.013, 0.5, 0.07]).unwrap();
        let neg = GlobalStepNegotiator::new(&SingleProcess);
        let step = neg.negotiate(local).unwrap();
        assert_eq!(step.dt_global, local.min);
        assert_eq!(step.global, local);
        assert_eq!(step.local, local);
        assert_eq!(neg.renegotiate(local).unwrap(), step);
    }
}
