//! Rayon thread pool for league simulations.
//!
//! The pool is built once and reused for every configuration of a sweep. With
//! zero workers the global Rayon pool (all cores) is used instead.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

#[derive(Debug, Clone, Default)]
pub struct WorkerPool {
    workers: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl WorkerPool {
    /// Use all available CPU cores (Rayon default).
    pub fn global() -> Self {
        Self::default()
    }

    /// Use exactly `n` worker threads. `0` falls back to the global pool.
    pub fn with_workers(n: usize) -> Result<Self, ThreadPoolBuildError> {
        if n == 0 {
            return Ok(Self::global());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|idx| format!("draftsim-worker-{idx}"))
            .build()?;
        Ok(Self {
            workers: n,
            pool: Some(Arc::new(pool)),
        })
    }

    /// Threads that will actually run work.
    pub fn workers(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Requested worker count; 0 means the global pool.
    pub fn requested_workers(&self) -> usize {
        self.workers
    }

    /// Run a closure inside this pool so nested Rayon iterators use its threads.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn dedicated_pool_reports_its_size() {
        let pool = WorkerPool::with_workers(3).unwrap();
        assert_eq!(pool.workers(), 3);
        assert_eq!(pool.requested_workers(), 3);
        let inside = pool.install(rayon::current_num_threads);
        assert_eq!(inside, 3);
    }

    #[test]
    fn zero_workers_uses_global_pool() {
        let pool = WorkerPool::with_workers(0).unwrap();
        assert_eq!(pool.requested_workers(), 0);
        let sum: u64 = pool.install(|| (1..=100u64).into_par_iter().sum());
        assert_eq!(sum, 5050);
    }
}
