//! Shared-memory runtime.

use crate::error::CommError;
use std::fmt;

/// A fixed-size rayon thread pool.
///
/// Kernels call rayon's parallel iterators; running them inside
/// [`install`](Self::install) confines that work to this pool so the
/// configured thread count is honoured.
pub struct SharedRuntime {
    pool: rayon::ThreadPool,
}

impl SharedRuntime {
    /// Build a pool with `threads` workers.
    pub fn new(threads: usize) -> Result<Self, CommError> {
        if threads == 0 {
            return Err(CommError::ThreadPool {
                reason: "thread count must be at least 1".to_string(),
            });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("cadence-worker-{i}"))
            .build()
            .map_err(|e| CommError::ThreadPool {
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` inside the pool.
    pub fn install<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }
}

impl fmt::Debug for SharedRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRuntime")
            .field("threads", &self.threads())
            .finish()
    }
}
