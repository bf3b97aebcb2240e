//! Benchmark profiles for Cadence.
//!
//! Provides pre-built stores and cluster layouts for benchmarks:
//!
//! - [`reference_store`]: 10K-element elastic line with layered media
//! - [`layered_store`]: same, with any size, layer count and seed
//! - [`lts_clusters`]: contiguous clusters stepping at their own stable step

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cadence_core::{ClusterId, EntityRange, SchedError};
use cadence_engine::Cluster;
use cadence_kernel::Kernel;
use cadence_mesh::{BoundaryBehavior, EntityStore, Line1D};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Build the reference benchmark store: 10K elements, 8 layers.
pub fn reference_store(seed: u64) -> EntityStore {
    layered_store(10_000, 8, seed)
}

/// Elastic line of `n` elements on `[0, 1]` split into `layers` layers of
/// random material, with a Gaussian stress pulse in the centre.
///
/// Materials are drawn from a ChaCha8 RNG seeded with `seed`, so equal
/// seeds give identical stores.
pub fn layered_store(n: usize, layers: usize, seed: u64) -> EntityStore {
    let mesh = Line1D::new(n, 0.0, 1.0, BoundaryBehavior::Periodic)
        .unwrap_or_else(|e| panic!("benchmark mesh: {e}"));
    let mut store =
        EntityStore::new(mesh, 2).unwrap_or_else(|e| panic!("benchmark store: {e}"));

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let media: Vec<[f64; 3]> = (0..layers.max(1))
        .map(|_| {
            let rho = rng.gen_range(1.0..3.0);
            let mu = rng.gen_range(0.5..4.0);
            [rho, 2.0 * mu, mu]
        })
        .collect();
    let k = media.len();
    store.set_material(|x| media[((x * k as f64) as usize).min(k - 1)]);
    store.initialize(|x, q| {
        let r = (x - 0.5) / 0.05;
        q[0] = (-r * r).exp();
        q[1] = 0.0;
    });
    store
}

/// Split the mesh into `n_clusters` contiguous clusters, each stepping at
/// the smallest stable step among its elements.
pub fn lts_clusters(
    store: &EntityStore,
    kernel: &dyn Kernel,
    n_clusters: usize,
) -> Result<Vec<Cluster>, SchedError> {
    let dts = kernel.stable_dts(store);
    let n = dts.len();
    let k = n_clusters.clamp(1, n.max(1));
    (0..k)
        .map(|i| {
            let first = i * n / k;
            let end = (i + 1) * n / k;
            let dt = dts[first..end].iter().copied().fold(f64::INFINITY, f64::min);
            Cluster::new(ClusterId(i as u32), dt, EntityRange::new(first, end - first))
        })
        .collect()
}
