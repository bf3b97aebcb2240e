//! Ordered collection of clusters.
//!
//! One cluster is global time stepping; several clusters with different
//! step sizes are local time stepping. Either way the set is advanced to
//! a horizon as a unit, fastest cluster first.

use crate::cluster::{Cluster, StepObserver};
use cadence_core::{ClusterId, SchedError};
use cadence_kernel::Kernel;
use cadence_mesh::EntityStore;
use cadence_parallel::SharedRuntime;
use indexmap::IndexMap;

/// Steps taken by every member during one [`ClusterSet::advance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateOutcome {
    /// `(cluster, steps)` in scheduling order.
    pub steps: Vec<(ClusterId, u64)>,
    /// Sum of all members' steps.
    pub total_steps: u64,
}

/// Clusters keyed by id, scheduled by ascending step size.
///
/// Entity ranges of members never overlap, so advancing them one after
/// the other never writes the same entity twice.
#[derive(Debug, Default)]
pub struct ClusterSet {
    clusters: IndexMap<ClusterId, Cluster>,
    order: Vec<ClusterId>,
}

impl ClusterSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cluster.
    ///
    /// Returns `DuplicateCluster` if the id is taken or the entity range
    /// overlaps a member's range.
    pub fn add(&mut self, cluster: Cluster) -> Result<ClusterId, SchedError> {
        let id = cluster.id();
        let range = cluster.range();
        if self.clusters.contains_key(&id) {
            return Err(SchedError::DuplicateCluster {
                cluster: id,
                range,
                existing: id,
            });
        }
        if let Some(other) = self.clusters.values().find(|c| c.range().overlaps(&range)) {
            return Err(SchedError::DuplicateCluster {
                cluster: id,
                range,
                existing: other.id(),
            });
        }
        self.clusters.insert(id, cluster);

        // Stable sort keeps insertion order among equal step sizes.
        self.order = self.clusters.keys().copied().collect();
        let clusters = &self.clusters;
        self.order
            .sort_by(|a, b| clusters[a].dt().total_cmp(&clusters[b].dt()));
        Ok(id)
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether the set has no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Look up a cluster.
    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(&id)
    }

    /// Clusters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    /// Cluster ids in the order they are advanced.
    pub fn schedule_order(&self) -> &[ClusterId] {
        &self.order
    }

    /// `(cluster, update_count)` in insertion order.
    pub fn update_counts(&self) -> Vec<(ClusterId, u64)> {
        self.clusters
            .values()
            .map(|c| (c.id(), c.update_count()))
            .collect()
    }

    /// Sum of all members' update counts.
    pub fn total_updates(&self) -> u64 {
        self.clusters.values().map(Cluster::update_count).sum()
    }

    /// Smallest member step size.
    pub fn min_dt(&self) -> Option<f64> {
        self.order.first().map(|id| self.clusters[id].dt())
    }

    /// Advance every member to `horizon`, fastest first.
    ///
    /// On return every member's local time equals `horizon` exactly.
    /// Returns `NotInitialized` on an empty set.
    pub fn advance(
        &mut self,
        horizon: f64,
        store: &mut EntityStore,
        kernel: &dyn Kernel,
        shared: &SharedRuntime,
        observer: &mut StepObserver<'_>,
    ) -> Result<AggregateOutcome, SchedError> {
        if self.is_empty() {
            return Err(SchedError::NotInitialized);
        }
        let mut outcome = AggregateOutcome::default();
        for id in &self.order {
            let cluster = self
                .clusters
                .get_mut(id)
                .ok_or(SchedError::NotInitialized)?;
            let step = cluster.advance(horizon, store, kernel, shared, observer)?;
            outcome.steps.push((*id, step.steps));
            outcome.total_steps += step.steps;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::EntityRange;
    use cadence_mesh::{BoundaryBehavior, Line1D};
    use cadence_test_utils::ConstKernel;

    fn cluster(id: u32, dt: f64, first: usize, len: usize) -> Cluster {
        Cluster::new(ClusterId(id), dt, EntityRange::new(first, len)).unwrap()
    }

    fn store(n: usize) -> EntityStore {
        let mesh = Line1D::new(n, 0.0, 1.0, BoundaryBehavior::Periodic).unwrap();
        EntityStore::new(mesh, 1).unwrap()
    }

    #[test]
    fn overlapping_range_rejected() {
        let mut set = ClusterSet::new();
        set.add(cluster(0, 0.1, 0, 4)).unwrap();
        let err = set.add(cluster(1, 0.2, 3, 4)).unwrap_err();
        assert_eq!(
            err,
            SchedError::DuplicateCluster {
                cluster: ClusterId(1),
                range: EntityRange::new(3, 4),
                existing: ClusterId(0),
            }
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut set = ClusterSet::new();
        set.add(cluster(0, 0.1, 0, 4)).unwrap();
        assert!(matches!(
            set.add(cluster(0, 0.1, 4, 4)),
            Err(SchedError::DuplicateCluster { .. })
        ));
    }

    #[test]
    fn schedule_is_ascending_dt_stable() {
        let mut set = ClusterSet::new();
        set.add(cluster(0, 0.3, 0, 2)).unwrap();
        set.add(cluster(1, 0.1, 2, 2)).unwrap();
        set.add(cluster(2, 0.3, 4, 2)).unwrap();
        set.add(cluster(3, 0.1, 6, 2)).unwrap();
        let order: Vec<u32> = set.schedule_order().iter().map(|id| id.0).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
        assert_eq!(set.min_dt(), Some(0.1));
    }

    #[test]
    fn advance_empty_is_not_initialized() {
        let mut set = ClusterSet::new();
        let mut s = store(4);
        let rt = SharedRuntime::new(1).unwrap();
        assert_eq!(
            set.advance(1.0, &mut s, &ConstKernel::new(0.0), &rt, &mut |_, _| {}),
            Err(SchedError::NotInitialized)
        );
    }

    #[test]
    fn advance_brings_all_members_to_horizon() {
        let mut set = ClusterSet::new();
        set.add(cluster(0, 0.3, 0, 4)).unwrap();
        set.add(cluster(1, 0.1, 4, 4)).unwrap();
        let mut s = store(8);
        let rt = SharedRuntime::new(2).unwrap();
        let out = set
            .advance(0.3, &mut s, &ConstKernel::new(1.0), &rt, &mut |_, _| {})
            .unwrap();
        assert_eq!(out.steps, vec![(ClusterId(1), 3), (ClusterId(0), 1)]);
        assert_eq!(out.total_steps, 4);
        assert!(set.iter().all(|c| c.local_time() == 0.3));
        assert_eq!(set.update_counts(), vec![(ClusterId(0), 1), (ClusterId(1), 3)]);
        assert_eq!(set.total_updates(), 4);
    }
}
