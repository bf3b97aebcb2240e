//! Run configuration.
//!
//! A [`RunConfig`] is read from JSON and validated as a whole before any
//! cluster is built, so a bad or unsupported setting aborts the run
//! before the compute phase.
//!
//! ```json
//! {
//!   "end_time": 1.0,
//!   "wave_field_int": 0.25,
//!   "equation": "advection",
//!   "mesh": { "n_elements": 200, "x_min": 0.0, "x_max": 1.0, "boundary": "periodic" },
//!   "clusters": [ { "first": 0, "len": 100, "rate": 1.0 }, { "first": 100, "len": 100, "rate": 2.0 } ],
//!   "materials": [ { "domain": [0.0, 0.5], "values": [2.0, 0.0, 0.0] } ],
//!   "overrides": { "face": [ { "domain": [0.5, 0.5], "value": 1 } ] },
//!   "receivers": { "positions": [0.25, 0.75], "interval": 0.01 }
//! }
//! ```

use cadence_core::{SchedError, TIME_TOLERANCE};
use cadence_kernel::EquationKind;
use cadence_mesh::{
    BoundaryBehavior, EntityStore, Line1D, OverrideCategory, SparseTypeOverride,
};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors from loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("reading config: {0}")]
    Io(#[from] io::Error),
    /// The JSON is malformed or has unknown fields.
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The values are not admissible.
    #[error(transparent)]
    Sched(#[from] SchedError),
}

/// Mesh section.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshConfig {
    /// Number of elements.
    pub n_elements: usize,
    /// Left end of the domain.
    pub x_min: f64,
    /// Right end of the domain.
    pub x_max: f64,
    /// Outer boundary behavior (default: periodic).
    #[serde(default)]
    pub boundary: BoundaryBehavior,
}

/// One local-time-stepping cluster.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// First element.
    pub first: usize,
    /// Number of elements.
    pub len: usize,
    /// Step size as a multiple of the global step.
    pub rate: f64,
}

/// Material parameters for every element whose centroid lies in `domain`.
///
/// Layers are applied in order, so a later layer wins where two overlap.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialLayer {
    /// Closed interval `[lo, hi]`.
    pub domain: [f64; 2],
    /// Equation-specific parameters, see [`cadence_mesh::ElementChars::material`].
    pub values: [f64; 3],
}

impl MaterialLayer {
    fn validate(&self, i: usize) -> Result<(), SchedError> {
        let [lo, hi] = self.domain;
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(SchedError::invalid(format!(
                "material layer {i}: bad domain [{lo}, {hi}]"
            )));
        }
        if !self.values.iter().all(|v| v.is_finite()) {
            return Err(SchedError::invalid(format!(
                "material layer {i}: values must be finite, got {:?}",
                self.values
            )));
        }
        Ok(())
    }

    /// Set the material of the covered elements; returns how many.
    pub fn apply(&self, store: &mut EntityStore) -> usize {
        let [lo, hi] = self.domain;
        let mut n = 0;
        for el in store.elements_mut() {
            if (lo..=hi).contains(&el.centroid) {
                el.material = self.values;
                n += 1;
            }
        }
        n
    }
}

impl ClusterConfig {
    /// One past the last element, or `None` if that overflows.
    pub fn end(&self) -> Option<usize> {
        self.first.checked_add(self.len)
    }
}

/// Sparse-type overrides per entity category.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideConfig {
    /// Vertex overrides. Not supported; any entry fails validation.
    #[serde(default)]
    pub vertex: Vec<SparseTypeOverride>,
    /// Face overrides.
    #[serde(default)]
    pub face: Vec<SparseTypeOverride>,
    /// Element overrides.
    #[serde(default)]
    pub element: Vec<SparseTypeOverride>,
}

impl OverrideConfig {
    /// Check that only supported categories are used.
    pub fn validate(&self) -> Result<(), SchedError> {
        if !self.vertex.is_empty() {
            return Err(SchedError::invalid(format!(
                "{} sparse-type overrides are not implemented",
                OverrideCategory::Vertex
            )));
        }
        Ok(())
    }

    /// Set the configured sparse-type bits on `store`.
    pub fn apply(&self, store: &mut EntityStore) -> Result<(), SchedError> {
        self.validate()?;
        for ov in &self.face {
            let tagged = ov.apply_faces(store.faces_mut());
            info!(category = %OverrideCategory::Face, value = ov.value, tagged, "sparse-type override");
        }
        for ov in &self.element {
            let tagged = ov.apply_elements(store.elements_mut());
            info!(category = %OverrideCategory::Element, value = ov.value, tagged, "sparse-type override");
        }
        Ok(())
    }
}

/// Receiver section.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiverConfig {
    /// Point receiver positions.
    #[serde(default)]
    pub positions: Vec<f64>,
    /// Quadrature receiver positions.
    #[serde(default)]
    pub quadrature: Vec<f64>,
    /// Sampling interval.
    #[serde(default)]
    pub interval: f64,
}

/// Initial state of the primary quantity.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum InitialCondition {
    /// `amplitude * exp(-((x - center) / width)^2)`.
    Gaussian {
        /// Peak location.
        center: f64,
        /// Spread.
        width: f64,
        /// Peak value.
        amplitude: f64,
    },
    /// `left` below `position`, `right` from it on.
    Step {
        /// Jump location.
        position: f64,
        /// Value left of the jump.
        left: f64,
        /// Value right of the jump.
        right: f64,
    },
    /// The same value everywhere.
    Uniform {
        /// The value.
        value: f64,
    },
}

impl InitialCondition {
    /// Value at `x`.
    pub fn value_at(&self, x: f64) -> f64 {
        match *self {
            Self::Gaussian {
                center,
                width,
                amplitude,
            } => {
                let r = (x - center) / width;
                amplitude * (-r * r).exp()
            }
            Self::Step {
                position,
                left,
                right,
            } => {
                if x < position {
                    left
                } else {
                    right
                }
            }
            Self::Uniform { value } => value,
        }
    }
}

fn one() -> usize {
    1
}

fn default_cfl() -> f64 {
    0.5
}

/// Complete description of a run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Simulated end time.
    pub end_time: f64,
    /// Synchronization interval; `0` means a single interval.
    #[serde(default)]
    pub wave_field_int: f64,
    /// Equation family.
    pub equation: EquationKind,
    /// Mesh.
    pub mesh: MeshConfig,
    /// LTS clusters; empty means one global cluster over the mesh.
    #[serde(default)]
    pub clusters: Vec<ClusterConfig>,
    /// Worker threads (default: 1).
    #[serde(default = "one")]
    pub threads: usize,
    /// Simulated processes (default: 1).
    #[serde(default = "one")]
    pub processes: usize,
    /// Courant number (default: 0.5).
    #[serde(default = "default_cfl")]
    pub cfl: f64,
    /// Material layers over the default material.
    #[serde(default)]
    pub materials: Vec<MaterialLayer>,
    /// Sparse-type overrides.
    #[serde(default)]
    pub overrides: OverrideConfig,
    /// Receivers.
    #[serde(default)]
    pub receivers: ReceiverConfig,
    /// Initial condition; defaults to a Gaussian in the domain centre.
    #[serde(default)]
    pub initial: Option<InitialCondition>,
    /// Wave-field snapshot file.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Receiver CSV file.
    #[serde(default)]
    pub receiver_output: Option<PathBuf>,
}

impl RunConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Check every setting. Called before any cluster is built.
    pub fn validate(&self) -> Result<(), SchedError> {
        if !(self.end_time > 0.0 && self.end_time.is_finite()) {
            return Err(SchedError::invalid(format!(
                "end_time must be finite and > 0, got {}",
                self.end_time
            )));
        }
        if !(self.wave_field_int.is_finite() && self.wave_field_int > -TIME_TOLERANCE) {
            return Err(SchedError::invalid(format!(
                "wave_field_int must be finite and >= 0, got {}",
                self.wave_field_int
            )));
        }
        self.line()?;
        if self.threads == 0 {
            return Err(SchedError::invalid("threads must be at least 1"));
        }
        if self.processes == 0 || self.processes > self.mesh.n_elements {
            return Err(SchedError::invalid(format!(
                "processes must be in [1, {}], got {}",
                self.mesh.n_elements, self.processes
            )));
        }
        if !(self.cfl > 0.0 && self.cfl <= 1.0) {
            return Err(SchedError::invalid(format!(
                "cfl must be in (0, 1], got {}",
                self.cfl
            )));
        }
        for (i, c) in self.clusters.iter().enumerate() {
            let end = c.end().ok_or_else(|| {
                SchedError::invalid(format!(
                    "cluster {i}: first {} + len {} overflows",
                    c.first, c.len
                ))
            })?;
            if c.len == 0 || end > self.mesh.n_elements {
                return Err(SchedError::invalid(format!(
                    "cluster {i}: [{}, {end}) is empty or exceeds {} elements",
                    c.first, self.mesh.n_elements
                )));
            }
            if !(c.rate > 0.0 && c.rate.is_finite()) {
                return Err(SchedError::invalid(format!(
                    "cluster {i}: rate must be finite and > 0, got {}",
                    c.rate
                )));
            }
        }
        if !self.clusters.is_empty() {
            // Overlaps surface as DuplicateCluster when the set is built.
            let mut covered = vec![false; self.mesh.n_elements];
            for c in &self.clusters {
                // Bounds were checked above.
                if let Some(end) = c.end() {
                    covered[c.first..end].fill(true);
                }
            }
            if let Some(e) = covered.iter().position(|c| !c) {
                return Err(SchedError::invalid(format!(
                    "element {e} belongs to no cluster"
                )));
            }
        }
        for (i, layer) in self.materials.iter().enumerate() {
            layer.validate(i)?;
        }
        self.overrides.validate()?;

        let r = &self.receivers;
        let any_receivers = !(r.positions.is_empty() && r.quadrature.is_empty());
        if any_receivers && !(r.interval > 0.0 && r.interval.is_finite()) {
            return Err(SchedError::invalid(format!(
                "receiver interval must be finite and > 0, got {}",
                r.interval
            )));
        }
        if let Some(x) = r
            .positions
            .iter()
            .chain(&r.quadrature)
            .find(|x| !(self.mesh.x_min..=self.mesh.x_max).contains(*x))
        {
            return Err(SchedError::invalid(format!(
                "receiver at {x} lies outside [{}, {}]",
                self.mesh.x_min, self.mesh.x_max
            )));
        }
        Ok(())
    }

    /// The configured mesh.
    pub fn line(&self) -> Result<Line1D, SchedError> {
        let m = &self.mesh;
        Line1D::new(m.n_elements, m.x_min, m.x_max, m.boundary)
            .map_err(|e| SchedError::invalid(format!("mesh: {e}")))
    }

    /// The initial condition, resolving the default.
    pub fn initial_condition(&self) -> InitialCondition {
        self.initial.unwrap_or(InitialCondition::Gaussian {
            center: 0.5 * (self.mesh.x_min + self.mesh.x_max),
            width: 0.05 * (self.mesh.x_max - self.mesh.x_min),
            amplitude: 1.0,
        })
    }

    /// Synchronization interval as given (`0` collapses to `end_time`
    /// in the schedule).
    pub fn sync_interval(&self) -> f64 {
        self.wave_field_int
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "end_time": 1.0,
        "equation": "advection",
        "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 }
    }"#;

    fn minimal() -> RunConfig {
        RunConfig::from_json(MINIMAL).unwrap()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let c = minimal();
        assert_eq!(c.wave_field_int, 0.0);
        assert_eq!(c.threads, 1);
        assert_eq!(c.processes, 1);
        assert_eq!(c.cfl, 0.5);
        assert_eq!(c.mesh.boundary, BoundaryBehavior::Periodic);
        assert!(c.clusters.is_empty());
        assert!(c.output.is_none());
        assert!(matches!(
            c.initial_condition(),
            InitialCondition::Gaussian { center, .. } if center == 0.5
        ));
    }

    #[test]
    fn full_config_parses() {
        let c = RunConfig::from_json(
            r#"{
            "end_time": 2.0,
            "wave_field_int": 0.5,
            "equation": "shallow_water",
            "mesh": { "n_elements": 8, "x_min": -1.0, "x_max": 1.0, "boundary": "reflect" },
            "clusters": [ { "first": 0, "len": 4, "rate": 1.0 }, { "first": 4, "len": 4, "rate": 2.0 } ],
            "threads": 2,
            "processes": 3,
            "cfl": 0.4,
            "overrides": { "face": [ { "domain": [0.0, 0.0], "value": 1 } ], "element": [] },
            "receivers": { "positions": [0.1], "quadrature": [-0.5], "interval": 0.1 },
            "initial": { "kind": "step", "position": 0.0, "left": 2.0, "right": 1.0 },
            "output": "wave.txt"
        }"#,
        )
        .unwrap();
        assert_eq!(c.equation, EquationKind::ShallowWater);
        assert_eq!(c.clusters[1].rate, 2.0);
        assert_eq!(c.overrides.face.len(), 1);
        assert_eq!(c.initial_condition().value_at(-0.5), 2.0);
        assert_eq!(c.output.as_deref(), Some(Path::new("wave.txt")));
    }

    #[test]
    fn unknown_field_is_parse_error() {
        let err = RunConfig::from_json(r#"{ "end_time": 1.0, "bogus": 1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn vertex_override_fails_validation() {
        let mut c = minimal();
        c.overrides.vertex.push(SparseTypeOverride {
            domain: [0.0, 1.0],
            value: 1,
        });
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("vertex"));
    }

    #[test]
    fn bad_values_fail_validation() {
        let cases: Vec<fn(&mut RunConfig)> = vec![
            |c| c.end_time = 0.0,
            |c| c.wave_field_int = -1.0,
            |c| c.threads = 0,
            |c| c.processes = 0,
            |c| c.cfl = 1.5,
            |c| c.mesh.n_elements = 0,
            |c| c.mesh.x_max = c.mesh.x_min,
            |c| {
                c.clusters.push(ClusterConfig {
                    first: 8,
                    len: 4,
                    rate: 1.0,
                })
            },
            |c| {
                c.clusters.push(ClusterConfig {
                    first: 0,
                    len: 10,
                    rate: 0.0,
                })
            },
            |c| {
                c.clusters.push(ClusterConfig {
                    first: 0,
                    len: 4,
                    rate: 1.0,
                })
            },
            |c| c.processes = 11,
            |c| {
                c.clusters.push(ClusterConfig {
                    first: usize::MAX,
                    len: 5,
                    rate: 1.0,
                })
            },
            |c| {
                c.materials.push(MaterialLayer {
                    domain: [0.5, 0.2],
                    values: [1.0, 0.0, 0.0],
                })
            },
            |c| {
                c.materials.push(MaterialLayer {
                    domain: [0.0, 1.0],
                    values: [f64::NAN, 0.0, 0.0],
                })
            },
            |c| c.receivers.positions.push(0.5),
            |c| {
                c.receivers.interval = 0.1;
                c.receivers.positions.push(2.0);
            },
        ];
        for (i, mutate) in cases.into_iter().enumerate() {
            let mut c = minimal();
            mutate(&mut c);
            assert!(
                matches!(c.validate(), Err(SchedError::InvalidConfiguration { .. })),
                "case {i} should fail"
            );
        }
    }

    #[test]
    fn overrides_set_face_and_element_bits() {
        let c = minimal();
        let mut store = EntityStore::new(c.line().unwrap(), 1).unwrap();
        let ov = OverrideConfig {
            vertex: Vec::new(),
            face: vec![SparseTypeOverride {
                domain: [0.45, 0.55],
                value: 1,
            }],
            element: vec![SparseTypeOverride {
                domain: [0.0, 0.2],
                value: 4,
            }],
        };
        ov.apply(&mut store).unwrap();
        assert_eq!(store.faces()[5].sparse_type, 1);
        assert_eq!(store.faces()[4].sparse_type, 0);
        assert_eq!(store.elements()[0].sparse_type, 4);
        assert_eq!(store.elements()[1].sparse_type, 4);
        assert_eq!(store.elements()[2].sparse_type, 0);
    }

    #[test]
    fn overflowing_cluster_is_rejected_on_load() {
        let err = RunConfig::from_json(
            r#"{ "end_time": 1.0, "equation": "advection",
                 "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 },
                 "clusters": [ { "first": 18446744073709551615, "len": 5, "rate": 1.0 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Sched(SchedError::InvalidConfiguration { .. })
        ));
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn later_material_layer_wins() {
        let c = minimal();
        let mut store = EntityStore::new(c.line().unwrap(), 1).unwrap();
        let slow = MaterialLayer {
            domain: [0.0, 1.0],
            values: [0.5, 0.0, 0.0],
        };
        let fast = MaterialLayer {
            domain: [0.0, 0.3],
            values: [2.0, 0.0, 0.0],
        };
        assert_eq!(slow.apply(&mut store), 10);
        assert_eq!(fast.apply(&mut store), 3);
        assert_eq!(store.elements()[0].material[0], 2.0);
        assert_eq!(store.elements()[2].material[0], 2.0);
        assert_eq!(store.elements()[3].material[0], 0.5);
    }

    #[test]
    fn gaussian_peaks_at_center() {
        let g = InitialCondition::Gaussian {
            center: 0.5,
            width: 0.1,
            amplitude: 2.0,
        };
        assert_eq!(g.value_at(0.5), 2.0);
        assert!(g.value_at(0.8) < 0.01);
    }
}
