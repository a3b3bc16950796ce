//! Parallel processing configuration and management
//!
//! This module sizes the worker pool for a run, decides how zone indices are
//! chunked across workers, and carries the caller's cancellation signal.
//! Each run builds its own pool; nothing touches Rayon's global pool.

use crate::errors::{InputError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Chunks handed out per worker when no explicit chunk size is set.
const CHUNKS_PER_WORKER: usize = 4;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Worker threads; `None` means one per CPU core.
    pub num_workers: Option<usize>,
    /// Zones per work unit; `None` derives it from the zone count.
    pub chunk_size: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    #[must_use]
    pub const fn new(num_workers: Option<usize>) -> Self {
        Self {
            num_workers,
            chunk_size: None,
        }
    }

    /// Create a configuration that uses all available CPU cores
    #[must_use]
    pub fn all_cores() -> Self {
        Self::new(Some(num_cpus::get()))
    }

    /// Create a configuration that uses a specific number of workers
    #[must_use]
    pub const fn with_workers(num_workers: usize) -> Self {
        Self::new(Some(num_workers))
    }

    #[must_use]
    pub const fn chunked(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Resolved worker count.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidWorkerCount`] for zero workers.
    pub fn workers(&self) -> std::result::Result<usize, InputError> {
        match self.num_workers {
            Some(0) => Err(InputError::InvalidWorkerCount(0)),
            Some(n) => Ok(n),
            None => Ok(num_cpus::get()),
        }
    }

    /// Zones per work unit for a batch of `zones`.
    ///
    /// Defaults to `ceil(zones / (workers * 4))`, so each worker sees a few
    /// chunks and a slow zone does not stall a whole slice.
    #[must_use]
    pub fn chunk_size_for(&self, zones: usize, workers: usize) -> usize {
        match self.chunk_size {
            Some(n) => n.max(1),
            None => zones.div_ceil(workers.max(1) * CHUNKS_PER_WORKER).max(1),
        }
    }

    /// Build a pool owned by the caller and torn down when dropped.
    ///
    /// Asking for more workers than there are cores is allowed.
    ///
    /// # Errors
    ///
    /// Fails on zero workers or if the OS refuses to spawn threads.
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let workers = self.workers()?;
        let cores = num_cpus::get();
        if workers > cores {
            debug!(workers, cores, "worker pool is oversubscribed");
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("zonal-worker-{i}"))
            .build()?;
        Ok(pool)
    }
}

/// Get information about the current parallel configuration
#[must_use]
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        available_cores: num_cpus::get(),
        physical_cores: num_cpus::get_physical(),
        available_parallelism: std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub available_cores: usize,
    pub physical_cores: usize,
    pub available_parallelism: usize,
}

impl ParallelInfo {
    /// Log parallel processing information
    pub fn log_info(&self) {
        debug!(
            available_cores = self.available_cores,
            physical_cores = self.physical_cores,
            available_parallelism = self.available_parallelism,
            "📊 parallel processing environment"
        );
    }
}

/// Caller-held handle for stopping a run between zones.
///
/// Cancelling stops workers from starting new zones; zones already being
/// reduced run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
