//! Time-integration scheduler for Cadence.
//!
//! Partitions the mesh into [`Cluster`]s stepping at their own rate,
//! negotiates one global step across processes with the
//! [`GlobalStepNegotiator`], and drives every cluster from one
//! synchronization point to the next through the [`Manager`].
//!
//! The [`driver`] module runs the whole loop: initial output, barrier,
//! then `simulate` and output per sync interval until the end time.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cluster;
pub mod cluster_set;
pub mod config;
pub mod driver;
pub mod manager;
pub mod metrics;
pub mod negotiate;
pub mod output;
pub mod receivers;
pub mod report;

pub use cluster::{Cluster, StepObserver, StepOutcome, StepWindow};
pub use cluster_set::{AggregateOutcome, ClusterSet};
pub use config::{ConfigError, RunConfig};
pub use driver::{DriverError, SyncSchedule};
pub use manager::{Manager, ManagerState, SyncPoint};
pub use metrics::RunReport;
pub use negotiate::{GlobalStepNegotiator, NegotiatedStep, StepStats};
pub use output::{NullWriter, OutputError, SnapshotWriter, WaveFieldWriter};
pub use receivers::{NoReceivers, PointReceivers, QuadReceivers, ReceiverSink, ReceiverTrace, Sample};
pub use report::{NullReporter, Reporter, TracingReporter};
