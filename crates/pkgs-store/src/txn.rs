// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read and write transactions over the resource store.
//!
//! `sled`'s native transactions are scoped to a closure passed to
//! `Tree::transaction`, which doesn't fit a handle the percolator holds
//! open across several `await` points on the blob layer. A write
//! transaction is instead modeled as a `sled::Batch` accumulated against
//! a fixed snapshot and applied atomically on `commit()` — satisfying
//! "either the entire percolation commits or nothing changes" without
//! needing `sled`'s closure-scoped API. The percolator does read back a
//! path it staged earlier in the same transaction (a child just written
//! via `set`, re-read while recomputing its parent), so `get`/`peek_tag`/
//! `exists`/`scan` all consult the in-memory overlay of staged
//! sets/deletes before falling through to the underlying tree.

use crate::codec;
use pkgs_error::{Error, Result};
use pkgs_model::{Path, Resource, ResourceTag};
use std::collections::HashMap;

/// A pending change recorded by a write transaction, used to fan out to
/// registered indices after a successful commit.
pub enum Change {
    /// A resource was set (created or replaced) at this path.
    Set(Path, Resource),
    /// A resource was removed from this path.
    Delete(Path, Resource),
}

/// A transaction over the resource store: either a read-only snapshot or
/// an accumulating write batch.
pub enum Txn {
    /// A read-only snapshot. `get`/`scan` only.
    Read(sled::Tree),
    /// An accumulating write. `get`/`scan` read the pre-transaction
    /// snapshot; `set`/`delete` stage changes applied atomically by
    /// [`Txn::commit`].
    Write {
        /// The underlying tree changes are staged against.
        tree: sled::Tree,
        /// The pending atomic batch.
        batch: sled::Batch,
        /// Changes recorded for index fan-out, in commit order.
        changes: Vec<Change>,
        /// Read-your-own-writes overlay: every path this transaction has
        /// staged a `set` or `delete` for, mirroring `batch`. `Some` for a
        /// staged write, `None` for a staged delete.
        overlay: HashMap<Path, Option<Resource>>,
    },
}

impl Txn {
    fn tree(&self) -> &sled::Tree {
        match self {
            Txn::Read(tree) => tree,
            Txn::Write { tree, .. } => tree,
        }
    }

    fn tree_get(tree: &sled::Tree, path: &Path) -> Result<Resource> {
        let bytes = tree
            .get(path.as_str().as_bytes())
            .map_err(|e| Error::invariant(e.to_string()))?
            .ok_or_else(|| Error::not_found(path))?;
        codec::decode(&bytes)
    }

    /// Point lookup. Returns [`Error::NotFound`] if `path` has no
    /// resource. On a write transaction, a path staged earlier in the
    /// same transaction (via `set`/`delete`) is read back from that
    /// staged value rather than the underlying tree.
    pub fn get(&self, path: &Path) -> Result<Resource> {
        match self {
            Txn::Read(tree) => Self::tree_get(tree, path),
            Txn::Write { tree, overlay, .. } => match overlay.get(path) {
                Some(Some(resource)) => Ok(resource.clone()),
                Some(None) => Err(Error::not_found(path)),
                None => Self::tree_get(tree, path),
            },
        }
    }

    /// Like [`Txn::get`], but only deserialises far enough to read the
    /// one-byte tag, avoiding a full decode just to check a variant.
    pub fn peek_tag(&self, path: &Path) -> Result<ResourceTag> {
        if let Txn::Write { overlay, .. } = self {
            match overlay.get(path) {
                Some(Some(resource)) => return Ok(resource.tag()),
                Some(None) => return Err(Error::not_found(path)),
                None => {}
            }
        }
        let bytes = self
            .tree()
            .get(path.as_str().as_bytes())
            .map_err(|e| Error::invariant(e.to_string()))?
            .ok_or_else(|| Error::not_found(path))?;
        codec::peek_tag(&bytes).ok_or_else(|| Error::invariant("corrupt resource-store entry"))
    }

    /// Does a resource exist at `path`?
    pub fn exists(&self, path: &Path) -> Result<bool> {
        match self.get(path) {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every stored path whose string form starts with `prefix`'s string
    /// form, in lexicographic (and therefore tree-depth-first) order.
    /// Used only to enumerate a subtree for cascading delete. Reflects
    /// this transaction's own staged sets/deletes, not just the
    /// underlying tree.
    pub fn scan(&self, prefix: &Path) -> Result<Vec<Path>> {
        let mut key_prefix = prefix.as_str().to_string();
        if !key_prefix.ends_with('/') {
            key_prefix.push('/');
        }
        let mut out: Vec<Path> = Vec::new();
        for item in self.tree().scan_prefix(key_prefix.as_bytes()) {
            let (key, _) = item.map_err(|e| Error::invariant(e.to_string()))?;
            let key_str = std::str::from_utf8(&key)
                .map_err(|e| Error::invariant(e.to_string()))?
                .to_string();
            out.push(Path::parse(key_str).map_err(|e| Error::invariant(e.to_string()))?);
        }
        if let Txn::Write { overlay, .. } = self {
            for (path, staged) in overlay {
                if !path.as_str().starts_with(&key_prefix) {
                    continue;
                }
                match staged {
                    Some(_) if !out.contains(path) => out.push(path.clone()),
                    None => out.retain(|p| p != path),
                    _ => {}
                }
            }
            out.sort();
        }
        Ok(out)
    }

    /// Stage `resource` to be written at `path` when this transaction
    /// commits. Only valid on a write transaction.
    pub fn set(&mut self, path: &Path, resource: Resource) -> Result<()> {
        match self {
            Txn::Write { batch, changes, overlay, .. } => {
                batch.insert(path.as_str().as_bytes(), codec::encode(&resource));
                overlay.insert(path.clone(), Some(resource.clone()));
                changes.push(Change::Set(path.clone(), resource));
                Ok(())
            }
            Txn::Read(_) => Err(Error::invariant("set called on a read transaction")),
        }
    }

    /// Stage the removal of `path`. No-op (but not an error) if absent.
    /// Only valid on a write transaction.
    pub fn delete(&mut self, path: &Path) -> Result<()> {
        let Txn::Write { tree, batch, changes, overlay } = self else {
            return Err(Error::invariant("delete called on a read transaction"));
        };
        let existing = match overlay.get(path) {
            Some(Some(resource)) => Some(resource.clone()),
            Some(None) => None,
            None => match tree.get(path.as_str().as_bytes()).map_err(|e| Error::invariant(e.to_string()))? {
                Some(bytes) => Some(codec::decode(&bytes)?),
                None => None,
            },
        };
        if let Some(existing) = existing {
            batch.remove(path.as_str().as_bytes());
            overlay.insert(path.clone(), None);
            changes.push(Change::Delete(path.clone(), existing));
        }
        Ok(())
    }

    /// Consume this write transaction, applying its batch atomically and
    /// returning the recorded changes for index fan-out. A no-op-but-legal
    /// call on a transaction with zero staged writes.
    pub fn commit(self) -> Result<Vec<Change>> {
        match self {
            Txn::Write { tree, batch, changes, .. } => {
                tree.apply_batch(batch)
                    .map_err(|e| Error::invariant(e.to_string()))?;
                Ok(changes)
            }
            Txn::Read(_) => Ok(Vec::new()),
        }
    }

    /// Discard this transaction without applying anything.
    pub fn discard(self) {}
}
