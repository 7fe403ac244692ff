//! Per-project serialization of tree operations.
//!
//! Each project's tree is one document, read and rewritten whole by every
//! operation. Two overlapping load→modify→save cycles would silently drop
//! one side's change, so every operation on a project runs under that
//! project's lock. Projects never contend with each other.
//!
//! Waiters are granted the lock in the order they asked for it: tokio's
//! `Mutex` queues waiters FIFO. The guard is released on drop, so an error
//! return or a panic inside the critical section still frees the project.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by project id.
///
/// Entries are created on first use and kept for the life of the table.
/// This only serializes within one process.
#[derive(Debug, Default)]
pub struct TreeLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TreeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a project's tree.
    pub async fn acquire(&self, project_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(project_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    /// Run `fut` while holding the project's lock.
    pub async fn with_tree_lock<F>(&self, project_id: &str, fut: F) -> F::Output
    where
        F: Future,
    {
        let _guard = self.acquire(project_id).await;
        fut.await
    }

    /// True if some operation currently holds the project's lock.
    pub fn is_locked(&self, project_id: &str) -> bool {
        self.locks
            .get(project_id)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of projects that have ever been locked.
    pub fn project_count(&self) -> usize {
        self.locks.len()
    }
}
