// SPDX-License-Identifier: MIT OR Apache-2.0
//! The process-wide per-path exclusive lock mutating handlers hold from
//! precondition check through percolation commit.

use dashmap::DashMap;
use pkgs_model::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-path locks, created on demand and dropped once
/// uncontended.
#[derive(Clone, Default)]
pub struct PathLocks {
    locks: Arc<DashMap<Path, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// An empty registry.
    pub fn new() -> Self {
        PathLocks::default()
    }

    /// Acquire the exclusive lock for `path`, blocking until any other
    /// holder releases it.
    pub async fn acquire(&self, path: &Path) -> PathGuard {
        let arc = self
            .locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = arc.clone().lock_owned().await;
        PathGuard {
            locks: self.locks.clone(),
            path: path.clone(),
            arc: Some(arc),
            guard: Some(guard),
        }
    }
}

/// Held while a mutating handler owns `path`'s lock. Dropping it releases
/// the lock and, if no other task is waiting on the same path, removes
/// the registry entry.
pub struct PathGuard {
    locks: Arc<DashMap<Path, Arc<Mutex<()>>>>,
    path: Path,
    arc: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.arc.take();
        self.locks.remove_if(&self.path, |_, v| Arc::strong_count(v) == 1);
    }
}
