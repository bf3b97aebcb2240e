//! In-process rank groups connected by crossbeam channels.
//!
//! Rank 0 is the root. A collective is a gather to the root followed by
//! a broadcast of the result:
//!
//! ```text
//! rank k  ──value──▶  root  (reduces in rank order)
//! rank k  ◀─result──  root
//! ```
//!
//! Reducing in rank order makes every collective deterministic. A rank
//! that drops its [`LocalComm`] closes its channels, so the others get
//! [`CommError::Disconnected`] instead of blocking forever.

use crate::comm::{Communicator, ReduceOp};
use crate::error::CommError;
use cadence_core::Rank;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fmt;
use tracing::warn;

/// Root's end of the channels to one peer.
struct PeerLink {
    rank: Rank,
    from_peer: Receiver<f64>,
    to_peer: Sender<f64>,
}

enum Role {
    Root { peers: Vec<PeerLink> },
    Peer { to_root: Sender<f64>, from_root: Receiver<f64> },
}

/// One rank of a [`LocalGroup`].
///
/// Move each communicator onto its own thread; collectives block until
/// every rank participates.
pub struct LocalComm {
    rank: Rank,
    size: usize,
    role: Role,
}

/// Factory for connected in-process communicators.
#[derive(Debug)]
pub struct LocalGroup;

impl LocalGroup {
    /// Create `n` connected communicators, indexed by rank.
    ///
    /// `n == 0` yields an empty group.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(n: usize) -> Vec<LocalComm> {
        if n == 0 {
            return Vec::new();
        }
        let mut peers = Vec::with_capacity(n - 1);
        let mut comms = Vec::with_capacity(n);
        for k in 1..n {
            let (up_tx, up_rx) = bounded(1);
            let (down_tx, down_rx) = bounded(1);
            let rank = Rank(k as u32);
            peers.push(PeerLink {
                rank,
                from_peer: up_rx,
                to_peer: down_tx,
            });
            comms.push(LocalComm {
                rank,
                size: n,
                role: Role::Peer {
                    to_root: up_tx,
                    from_root: down_rx,
                },
            });
        }
        comms.insert(
            0,
            LocalComm {
                rank: Rank(0),
                size: n,
                role: Role::Root { peers },
            },
        );
        comms
    }
}

impl fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce(&self, value: f64, op: ReduceOp) -> Result<f64, CommError> {
        match &self.role {
            Role::Root { peers } => {
                let mut acc = value;
                for peer in peers {
                    let v = peer.from_peer.recv().map_err(|_| {
                        warn!(rank = %peer.rank, "peer disconnected during reduction");
                        CommError::Disconnected { rank: peer.rank }
                    })?;
                    acc = op.apply(acc, v);
                }
                for peer in peers {
                    peer.to_peer
                        .send(acc)
                        .map_err(|_| CommError::Disconnected { rank: peer.rank })?;
                }
                Ok(acc)
            }
            Role::Peer { to_root, from_root } => {
                let root = CommError::Disconnected { rank: Rank(0) };
                to_root.send(value).map_err(|_| root.clone())?;
                from_root.recv().map_err(|_| root)
            }
        }
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.all_reduce(0.0, ReduceOp::Sum).map(|_| ())
    }
}
