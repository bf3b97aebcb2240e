//! Building and running a configured simulation.
//!
//! Each simulated process ("rank") owns a contiguous [`Partition`] of the
//! configured mesh. A rank builds its store, negotiates the global step
//! with its peers, restricts the configured clusters to its partition and
//! runs the synchronization-point loop. [`run`] starts one rank per
//! configured process, each on its own thread, connected by a
//! [`LocalGroup`].
//!
//! Halo exchange between partitions is not modelled; every partition
//! applies the configured outer boundary on both of its ends.

use cadence_core::{ClusterId, EntityRange, SchedError, STEP_TOLERANCE};
use cadence_engine::config::{ConfigError, InitialCondition, RunConfig};
use cadence_engine::driver::{self, DriverError, SyncSchedule};
use cadence_engine::{
    Cluster, GlobalStepNegotiator, Manager, NegotiatedStep, NullWriter, OutputError,
    PointReceivers, QuadReceivers, ReceiverTrace, Reporter, RunReport, SnapshotWriter,
    WaveFieldWriter,
};
use cadence_kernel::{elastic, swe, EquationKind, Kernel};
use cadence_mesh::{sparse_type, EntityStore, Line1D};
use cadence_parallel::{Communicator, LocalGroup, SharedRuntime, SingleProcess};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::thread;
use thiserror::Error;
use tracing::{error, info, info_span};

/// Errors from setting up or running a simulation.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Setup or scheduling failed.
    #[error(transparent)]
    Sched(#[from] SchedError),
    /// The synchronization-point loop failed.
    #[error(transparent)]
    Driver(#[from] DriverError),
    /// An output file could not be created.
    #[error(transparent)]
    Output(#[from] OutputError),
    /// Receiver output failed.
    #[error("receiver output: {0}")]
    Io(#[from] io::Error),
    /// A rank thread panicked.
    #[error("rank {rank} panicked")]
    RankPanicked {
        /// The rank.
        rank: usize,
    },
}

impl RunError {
    /// Whether this is a peer disconnect, as seen by the survivors of a
    /// failed rank.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Sched(SchedError::CommunicationFailure { .. })
                | Self::Driver(DriverError::Sched(SchedError::CommunicationFailure { .. }))
        )
    }
}

/// The share of the mesh owned by one rank.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Partition {
    /// Owning rank.
    pub rank: usize,
    /// Number of ranks.
    pub size: usize,
    /// First global element.
    pub first: usize,
    /// Number of elements.
    pub len: usize,
    /// Left end of the subdomain.
    pub x_min: f64,
    /// Right end of the subdomain.
    pub x_max: f64,
}

impl Partition {
    /// Split the configured mesh evenly and take the part of `rank`.
    pub fn new(config: &RunConfig, rank: usize, size: usize) -> Self {
        let m = &config.mesh;
        let first = rank * m.n_elements / size;
        let end = (rank + 1) * m.n_elements / size;
        let h = (m.x_max - m.x_min) / m.n_elements as f64;
        let x_max = if end == m.n_elements {
            m.x_max
        } else {
            m.x_min + end as f64 * h
        };
        Self {
            rank,
            size,
            first,
            len: end - first,
            x_min: m.x_min + first as f64 * h,
            x_max,
        }
    }

    /// Owned elements in global indices.
    pub fn range(&self) -> EntityRange {
        EntityRange::new(self.first, self.len)
    }

    /// Whether position `x` lies in this subdomain. The right end belongs
    /// to the next rank, except for the last one.
    pub fn owns(&self, x: f64) -> bool {
        let last = self.rank + 1 == self.size;
        x >= self.x_min && (x < self.x_max || (last && x <= self.x_max))
    }

    /// The local mesh.
    pub fn line(&self, config: &RunConfig) -> Result<Line1D, SchedError> {
        Line1D::new(self.len, self.x_min, self.x_max, config.mesh.boundary)
            .map_err(|e| SchedError::invalid(format!("rank {} mesh: {e}", self.rank)))
    }

    /// The configured clusters restricted to this partition, in local
    /// indices. Without configured clusters, one cluster steps the whole
    /// partition at `dt_global`.
    pub fn clusters(&self, config: &RunConfig, dt_global: f64) -> Result<Vec<Cluster>, SchedError> {
        if config.clusters.is_empty() {
            return Ok(vec![Cluster::new(
                ClusterId(0),
                dt_global,
                EntityRange::new(0, self.len),
            )?]);
        }
        let own = self.range();
        config
            .clusters
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                let lo = c.first.max(own.first);
                let hi = c.end()?.min(own.end());
                (lo < hi).then(|| {
                    Cluster::new(
                        ClusterId(i as u32),
                        c.rate * dt_global,
                        EntityRange::new(lo - own.first, hi - lo),
                    )
                })
            })
            .collect()
    }

    /// Check that no cluster steps past the stable step of its own
    /// elements.
    pub fn check_stability(
        clusters: &[Cluster],
        store: &EntityStore,
        kernel: &dyn Kernel,
    ) -> Result<(), SchedError> {
        for c in clusters {
            let bound = c
                .range()
                .indices()
                .map(|e| kernel.stable_dt(store, e))
                .fold(f64::INFINITY, f64::min);
            if c.dt() > bound * (1.0 + STEP_TOLERANCE) {
                return Err(SchedError::invalid(format!(
                    "cluster {}: dt {} exceeds the stable step {bound} of its elements",
                    c.id(),
                    c.dt()
                )));
            }
        }
        Ok(())
    }

    /// Receiver positions inside this subdomain.
    pub fn receivers(&self, positions: &[f64]) -> Vec<f64> {
        positions.iter().copied().filter(|&x| self.owns(x)).collect()
    }
}

fn seed_state(equation: EquationKind, initial: &InitialCondition, x: f64, q: &mut [f64]) {
    let v = initial.value_at(x);
    match equation {
        EquationKind::Advection => q[0] = v,
        EquationKind::Elastic => {
            q[elastic::STRESS] = v;
            q[elastic::VELOCITY] = 0.0;
        }
        EquationKind::ShallowWater => {
            q[swe::DEPTH] = 1.0 + v;
            q[swe::DISCHARGE] = 0.0;
        }
    }
}

/// Build the store of one partition: initial state, sparse-type
/// overrides and receiver tags.
pub fn build_store(config: &RunConfig, partition: &Partition) -> Result<EntityStore, SchedError> {
    let mut store = EntityStore::new(partition.line(config)?, config.equation.n_quantities())
        .map_err(|e| SchedError::invalid(format!("store: {e}")))?;
    let initial = config.initial_condition();
    store.initialize(|x, q| seed_state(config.equation, &initial, x, q));
    for layer in &config.materials {
        let n = layer.apply(&mut store);
        info!(domain = ?layer.domain, values = ?layer.values, elements = n, "material layer");
    }
    config.overrides.apply(&mut store)?;

    let r = &config.receivers;
    for x in partition.receivers(&r.positions).into_iter().chain(partition.receivers(&r.quadrature)) {
        if let Some(e) = store.mesh().locate(x) {
            store.elements_mut()[e].sparse_type |= sparse_type::RECEIVER;
        }
    }
    Ok(store)
}

/// Everything one rank produced.
#[derive(Debug)]
pub struct RankOutcome {
    /// The rank.
    pub rank: usize,
    /// The agreed global step.
    pub negotiated: NegotiatedStep,
    /// End-of-run statistics.
    pub report: RunReport,
    /// Point receiver traces.
    pub receivers: Vec<ReceiverTrace>,
    /// Quadrature receiver traces.
    pub quad_receivers: Vec<ReceiverTrace>,
    /// Final state of the partition.
    pub store: EntityStore,
}

fn rank_path(path: &Path, rank: usize, size: usize, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    if size > 1 {
        name.push(format!(".rank{rank}"));
    }
    PathBuf::from(name)
}

fn open_writer(
    path: Option<&Path>,
    rank: usize,
    size: usize,
) -> Result<Box<dyn WaveFieldWriter>, RunError> {
    Ok(match path {
        Some(path) => Box::new(SnapshotWriter::create(rank_path(path, rank, size, ""))?),
        None => Box::new(NullWriter),
    })
}

fn write_receivers(
    path: &Path,
    rank: usize,
    size: usize,
    points: &PointReceivers,
    quad: &QuadReceivers,
) -> Result<(), RunError> {
    points.write_csv(BufWriter::new(File::create(rank_path(path, rank, size, ""))?))?;
    if !quad.traces().is_empty() {
        quad.write_csv(BufWriter::new(File::create(rank_path(
            path, rank, size, ".quad",
        ))?))?;
    }
    Ok(())
}

/// Run one rank to completion. Collective over `comm`: every rank of the
/// group must call it with the same configuration.
pub fn run_rank(
    config: &RunConfig,
    comm: &dyn Communicator,
    reporter: &dyn Reporter,
) -> Result<RankOutcome, RunError> {
    let rank = comm.rank().0 as usize;
    let size = comm.size();
    let _span = info_span!("rank", rank).entered();
    let partition = Partition::new(config, rank, size);
    let mut store = build_store(config, &partition)?;
    let kernel = config
        .equation
        .build(config.cfl)
        .map_err(SchedError::invalid)?;
    let shared = SharedRuntime::new(config.threads).map_err(SchedError::from)?;

    let negotiated = GlobalStepNegotiator::new(comm).negotiate_for(&*kernel, &store)?;
    reporter.on_negotiated(&negotiated);

    let r = &config.receivers;
    let mut points = PointReceivers::new(&partition.receivers(&r.positions), r.interval, store.mesh())?;
    let mut quad = QuadReceivers::new(&partition.receivers(&r.quadrature), r.interval, store.mesh())?;
    let mut writer = open_writer(config.output.as_deref(), rank, size)?;

    let report = {
        let mut manager = Manager::new(
            negotiated.dt_global,
            &shared,
            comm,
            &mut points,
            &mut quad,
            reporter,
        )?;
        let clusters = partition.clusters(config, negotiated.dt_global)?;
        Partition::check_stability(&clusters, &store, &*kernel)?;
        for cluster in clusters {
            manager.add(cluster)?;
        }
        info!(
            rank,
            elements = partition.len,
            clusters = manager.clusters().len(),
            dt_global = negotiated.dt_global,
            kernel = kernel.name(),
            "rank ready"
        );
        let schedule = SyncSchedule::new(config.end_time, config.sync_interval())?;
        driver::run(&mut manager, &mut store, &*kernel, &mut *writer, schedule)?
    };

    if let Some(path) = &config.receiver_output {
        write_receivers(path, rank, size, &points, &quad)?;
    }
    Ok(RankOutcome {
        rank,
        negotiated,
        report,
        receivers: points.traces().to_vec(),
        quad_receivers: quad.traces().to_vec(),
        store,
    })
}

/// Validate `config` and run every configured rank.
///
/// On failure the root cause is returned: a rank's own error wins over
/// the disconnects its peers observed.
pub fn run(
    config: &RunConfig,
    reporter: &(dyn Reporter + Sync),
) -> Result<Vec<RankOutcome>, RunError> {
    config.validate()?;
    info!(
        equation = %config.equation,
        elements = config.mesh.n_elements,
        processes = config.processes,
        threads = config.threads,
        end_time = config.end_time,
        "starting run"
    );
    if config.processes == 1 {
        return Ok(vec![run_rank(config, &SingleProcess, reporter)?]);
    }

    let results: Vec<Result<RankOutcome, RunError>> = thread::scope(|s| {
        let handles: Vec<_> = LocalGroup::new(config.processes)
            .into_iter()
            .map(|comm| s.spawn(move || run_rank(config, &comm, reporter)))
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| h.join().unwrap_or(Err(RunError::RankPanicked { rank })))
            .collect()
    });

    let mut outcomes = Vec::with_capacity(results.len());
    let mut failure: Option<RunError> = None;
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!(rank, error = %e, "rank failed");
                let replace = match &failure {
                    None => true,
                    Some(prev) => prev.is_disconnect() && !e.is_disconnect(),
                };
                if replace {
                    failure = Some(e);
                }
            }
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n: usize, processes: usize) -> RunConfig {
        let mut c = RunConfig::from_json(&format!(
            r#"{{ "end_time": 1.0, "equation": "elastic",
                 "mesh": {{ "n_elements": {n}, "x_min": 0.0, "x_max": 1.0 }} }}"#
        ))
        .unwrap();
        c.processes = processes;
        c
    }

    #[test]
    fn partitions_tile_the_mesh() {
        let c = config(10, 3);
        let parts: Vec<Partition> = (0..3).map(|r| Partition::new(&c, r, 3)).collect();
        assert_eq!(parts.iter().map(|p| p.len).sum::<usize>(), 10);
        assert_eq!(parts[0].x_min, 0.0);
        assert_eq!(parts[2].x_max, 1.0);
        for pair in parts.windows(2) {
            assert_eq!(pair[0].range().end(), pair[1].first);
            assert_eq!(pair[0].x_max, pair[1].x_min);
        }
    }

    #[test]
    fn boundary_position_belongs_to_one_rank() {
        let c = config(10, 2);
        let (a, b) = (Partition::new(&c, 0, 2), Partition::new(&c, 1, 2));
        assert!(a.owns(0.0) && !b.owns(0.0));
        assert!(!a.owns(0.5) && b.owns(0.5));
        assert!(b.owns(1.0));
    }

    #[test]
    fn clusters_are_restricted_to_partition() {
        let mut c = config(10, 2);
        c.clusters = cluster_configs(&[(0, 3, 1.0), (3, 7, 2.0)]);
        let p = Partition::new(&c, 1, 2);
        let clusters = p.clusters(&c, 0.1).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].id(), ClusterId(1));
        assert_eq!(clusters[0].range(), EntityRange::new(0, 5));
        assert!((clusters[0].dt() - 0.2).abs() < 1e-15);

        let p0 = Partition::new(&c, 0, 2);
        let ids: Vec<u32> = p0.clusters(&c, 0.1).unwrap().iter().map(|c| c.id().0).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn default_is_one_global_cluster() {
        let c = config(8, 1);
        let clusters = Partition::new(&c, 0, 1).clusters(&c, 0.05).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].range(), EntityRange::new(0, 8));
        assert_eq!(clusters[0].dt(), 0.05);
    }

    #[test]
    fn store_is_seeded_and_tagged() {
        let mut c = config(10, 1);
        c.receivers.positions = vec![0.55];
        c.receivers.interval = 0.1;
        let store = build_store(&c, &Partition::new(&c, 0, 1)).unwrap();
        assert_eq!(store.n_quantities(), 2);
        // Gaussian around the centre, zero velocity.
        assert!((store.state(5)[elastic::STRESS] - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(store.state(5)[elastic::VELOCITY], 0.0);
        assert_eq!(store.elements()[5].sparse_type, sparse_type::RECEIVER);
        assert_eq!(store.elements()[4].sparse_type, 0);
    }

    #[test]
    fn rank_paths() {
        let p = Path::new("out/wave.txt");
        assert_eq!(rank_path(p, 0, 1, ""), PathBuf::from("out/wave.txt"));
        assert_eq!(rank_path(p, 2, 4, ""), PathBuf::from("out/wave.txt.rank2"));
        assert_eq!(rank_path(p, 1, 2, ".quad"), PathBuf::from("out/wave.txt.quad.rank1"));
    }

    fn cluster_configs(spec: &[(usize, usize, f64)]) -> Vec<cadence_engine::config::ClusterConfig> {
        spec.iter()
            .map(|&(first, len, rate)| cadence_engine::config::ClusterConfig { first, len, rate })
            .collect()
    }
}
