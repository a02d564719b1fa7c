// SPDX-License-Identifier: MIT OR Apache-2.0
//! The [`ResourceStore`] itself: opens the `sled` database, hands out
//! [`Txn`]s, and fans out committed changes to registered [`Index`]es.

use crate::index::Index;
use crate::txn::{Change, Txn};
use pkgs_error::{Error, Result};
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

/// Name of the single `sled` tree every path/resource pair lives in.
const RESOURCES_TREE: &str = "resources";

/// The transactional, ordered key-value resource store.
#[derive(Clone)]
pub struct ResourceStore {
    tree: sled::Tree,
    indices: Arc<Vec<Arc<dyn Index>>>,
}

impl ResourceStore {
    /// Open (or create) the store at `path` with no registered indices.
    pub fn open(path: impl AsRef<FsPath>) -> Result<Self> {
        Self::open_with_indices(path, Vec::new())
    }

    /// Open the store and register `indices` to be notified on every
    /// committed write.
    pub fn open_with_indices(path: impl AsRef<FsPath>, indices: Vec<Arc<dyn Index>>) -> Result<Self> {
        let db = sled::open(path).map_err(|e| Error::invariant(e.to_string()))?;
        let tree = db
            .open_tree(RESOURCES_TREE)
            .map_err(|e| Error::invariant(e.to_string()))?;
        Ok(ResourceStore {
            tree,
            indices: Arc::new(indices),
        })
    }

    /// Begin a read-only snapshot transaction.
    pub fn begin_read(&self) -> Txn {
        Txn::Read(self.tree.clone())
    }

    /// Begin a write transaction. Every mutation a single HTTP request
    /// makes shares one of these.
    pub fn begin_write(&self) -> Txn {
        Txn::Write {
            tree: self.tree.clone(),
            batch: sled::Batch::default(),
            changes: Vec::new(),
            overlay: std::collections::HashMap::new(),
        }
    }

    /// Commit a write transaction and fan out its changes to every
    /// registered index, concurrently. Index failures are logged, never
    /// returned.
    pub async fn commit(&self, txn: Txn) -> Result<()> {
        let changes = txn.commit()?;
        if changes.is_empty() || self.indices.is_empty() {
            return Ok(());
        }

        let mut tasks: JoinSet<Result<(), String>> = JoinSet::new();
        for change in changes {
            for index in self.indices.iter().cloned() {
                let change_clone = change.clone_for_fanout();
                tasks.spawn(async move {
                    match change_clone {
                        Change::Set(path, resource) => index.on_set(&path, &resource).await,
                        Change::Delete(path, resource) => index.on_delete(&path, &resource).await,
                    }
                });
            }
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Err(msg)) => warn!(error = %msg, "index propagation failed"),
                Err(join_err) => warn!(error = %join_err, "index propagation task panicked"),
                Ok(Ok(())) => {}
            }
        }
        Ok(())
    }
}

impl Change {
    fn clone_for_fanout(&self) -> Change {
        match self {
            Change::Set(p, r) => Change::Set(p.clone(), r.clone()),
            Change::Delete(p, r) => Change::Delete(p.clone(), r.clone()),
        }
    }
}
