//! Receiver sinks sampled during cluster steps.
//!
//! A receiver sits at a position inside the mesh and records the state
//! of its element at every multiple of a sampling interval. The manager
//! offers each local step window to its sinks; a receiver takes every
//! pending instant the window reaches, provided its element belongs to
//! the cluster that stepped.
//!
//! Two flavours:
//! - [`PointReceivers`]: state of the hosting element
//! - [`QuadReceivers`]: width-weighted average over the hosting element
//!   and its direct neighbours

use crate::cluster::StepWindow;
use cadence_core::{SchedError, TIME_TOLERANCE};
use cadence_mesh::{EntityStore, Mesh, Neighbour, Side};
use smallvec::SmallVec;
use std::io::{self, Write};
use tracing::debug;

/// Sink for per-step receiver sampling.
pub trait ReceiverSink {
    /// Earliest pending sampling instant, if any.
    fn next_sample(&self) -> Option<f64>;

    /// Offer one local step window. `store` holds the state at
    /// `window.end`.
    fn sample(&mut self, window: &StepWindow, store: &EntityStore);

    /// A synchronization point at `horizon` was reached.
    fn flush(&mut self, horizon: f64);
}

/// Sink for runs without receivers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReceivers;

impl ReceiverSink for NoReceivers {
    fn next_sample(&self) -> Option<f64> {
        None
    }

    fn sample(&mut self, _window: &StepWindow, _store: &EntityStore) {}

    fn flush(&mut self, _horizon: f64) {}
}

/// One recorded sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Sampling instant.
    pub time: f64,
    /// Recorded quantities.
    pub values: SmallVec<[f64; 4]>,
}

/// Samples of one receiver.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceiverTrace {
    /// Receiver position.
    pub position: f64,
    /// Element hosting the receiver.
    pub element: usize,
    /// Samples in time order.
    pub samples: Vec<Sample>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stencil {
    Point,
    Quadrature,
}

#[derive(Debug)]
struct ReceiverSet {
    stencil: Stencil,
    interval: f64,
    traces: Vec<ReceiverTrace>,
    flushed: u64,
    last_horizon: f64,
}

impl ReceiverSet {
    fn new(
        stencil: Stencil,
        positions: &[f64],
        interval: f64,
        mesh: &dyn Mesh,
    ) -> Result<Self, SchedError> {
        if !positions.is_empty() && !(interval > 0.0 && interval.is_finite()) {
            return Err(SchedError::invalid(format!(
                "receiver interval must be finite and > 0, got {interval}"
            )));
        }
        let traces = positions
            .iter()
            .map(|&position| {
                let element = mesh.locate(position).ok_or_else(|| {
                    SchedError::invalid(format!("receiver at {position} lies outside the mesh"))
                })?;
                Ok(ReceiverTrace {
                    position,
                    element,
                    samples: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>, SchedError>>()?;
        Ok(Self {
            stencil,
            interval,
            traces,
            flushed: 0,
            last_horizon: 0.0,
        })
    }

    fn next_instant(&self, trace: &ReceiverTrace) -> f64 {
        trace.samples.len() as f64 * self.interval
    }

    fn next_sample(&self) -> Option<f64> {
        self.traces
            .iter()
            .map(|t| self.next_instant(t))
            .min_by(f64::total_cmp)
    }

    fn values(&self, element: usize, store: &EntityStore) -> SmallVec<[f64; 4]> {
        let own = store.state(element);
        match self.stencil {
            Stencil::Point => SmallVec::from_slice(own),
            Stencil::Quadrature => {
                let mesh = store.mesh();
                let mut members: SmallVec<[usize; 3]> = SmallVec::new();
                members.push(element);
                for side in [Side::Left, Side::Right] {
                    if let Neighbour::Element(j) = mesh.neighbour(element, side) {
                        if !members.contains(&j) {
                            members.push(j);
                        }
                    }
                }
                let total: f64 = members.iter().map(|&e| mesh.width(e)).sum();
                let mut avg: SmallVec<[f64; 4]> = SmallVec::from_elem(0.0, own.len());
                for &e in &members {
                    let w = mesh.width(e) / total;
                    for (a, v) in avg.iter_mut().zip(store.state(e)) {
                        *a += w * v;
                    }
                }
                avg
            }
        }
    }

    fn sample(&mut self, window: &StepWindow, store: &EntityStore) {
        for k in 0..self.traces.len() {
            if !window.range.contains(self.traces[k].element) {
                continue;
            }
            loop {
                let t = self.next_instant(&self.traces[k]);
                if t > window.end + TIME_TOLERANCE {
                    break;
                }
                let values = self.values(self.traces[k].element, store);
                self.traces[k].samples.push(Sample { time: t, values });
            }
        }
    }

    fn flush(&mut self, horizon: f64) {
        self.flushed += 1;
        self.last_horizon = horizon;
        debug!(
            stencil = ?self.stencil,
            horizon,
            samples = self.traces.iter().map(|t| t.samples.len()).sum::<usize>(),
            "receivers flushed"
        );
    }

    fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "receiver,position,time,values")?;
        for (r, trace) in self.traces.iter().enumerate() {
            for s in &trace.samples {
                let values: Vec<String> = s.values.iter().map(|v| format!("{v:e}")).collect();
                writeln!(
                    out,
                    "{r},{},{},{}",
                    trace.position,
                    s.time,
                    values.join(";")
                )?;
            }
        }
        out.flush()
    }
}

macro_rules! receiver_sink {
    ($(#[$doc:meta])* $name:ident, $stencil:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name(ReceiverSet);

        impl $name {
            /// Place receivers at `positions`, sampled every `interval`.
            ///
            /// Returns `InvalidConfiguration` if a position lies outside
            /// the mesh or the interval is not finite and positive.
            pub fn new(
                positions: &[f64],
                interval: f64,
                mesh: &dyn Mesh,
            ) -> Result<Self, SchedError> {
                ReceiverSet::new($stencil, positions, interval, mesh).map(Self)
            }

            /// Recorded traces, one per receiver.
            pub fn traces(&self) -> &[ReceiverTrace] {
                &self.0.traces
            }

            /// Number of flushes so far.
            pub fn flushes(&self) -> u64 {
                self.0.flushed
            }

            /// Horizon of the latest flush.
            pub fn last_horizon(&self) -> f64 {
                self.0.last_horizon
            }

            /// Write every sample as CSV.
            pub fn write_csv<W: Write>(&self, out: W) -> io::Result<()> {
                self.0.write_csv(out)
            }
        }

        impl ReceiverSink for $name {
            fn next_sample(&self) -> Option<f64> {
                self.0.next_sample()
            }

            fn sample(&mut self, window: &StepWindow, store: &EntityStore) {
                self.0.sample(window, store)
            }

            fn flush(&mut self, horizon: f64) {
                self.0.flush(horizon)
            }
        }
    };
}

receiver_sink!(
    /// Receivers recording the state of their hosting element.
    PointReceivers,
    Stencil::Point
);

receiver_sink!(
    /// Receivers recording a width-weighted average over the hosting
    /// element and its direct neighbours.
    QuadReceivers,
    Stencil::Quadrature
);
