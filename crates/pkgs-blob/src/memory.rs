// SPDX-License-Identifier: MIT OR Apache-2.0
//! An in-process, content-addressed blob store used by the test suite and
//! by the in-process HTTP/percolation tests. Implements the same contract
//! a real Kubo node would, minus the network round trip.

use crate::store::{AddOpts, BlobStat, BlobStore};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use pkgs_error::{Error, Result};
use pkgs_model::{empty_directory_bytes, empty_directory_id, ContentId};

/// A directory object: a sorted list of named links. Content-addressed by
/// the canonical encoding in [`encode_dir`].
type DirEntries = Vec<(String, ContentId)>;

/// In-memory stand-in for the blob layer.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<ContentId, Bytes>,
    dirs: DashMap<ContentId, DirEntries>,
    pins: DashMap<ContentId, ()>,
}

impl MemoryBlobStore {
    /// Construct a store with the distinguished empty-directory
    /// `ContentId` pinned up front.
    pub fn new() -> Self {
        let store = MemoryBlobStore::default();
        let empty = empty_directory_id();
        store.dirs.insert(empty, Vec::new());
        store.pins.insert(empty, ());
        store
    }

    fn is_pinned(&self, id: ContentId) -> bool {
        self.pins.contains_key(&id)
    }
}

/// Canonical byte encoding of a directory's entries, sorted by name. Two
/// directories with the same `(name, target)` pairs always encode (and
/// therefore hash) identically, regardless of insertion order. The empty
/// case is special-cased to [`empty_directory_bytes`] so that a directory
/// emptied via `rm_link` hashes back to [`empty_directory_id`], the same
/// id `MemoryBlobStore::new` seeds up front.
fn encode_dir(entries: &DirEntries) -> Vec<u8> {
    if entries.is_empty() {
        return empty_directory_bytes().to_vec();
    }
    let mut sorted = entries.clone();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let as_strings: Vec<(String, String)> = sorted
        .into_iter()
        .map(|(name, id)| (name, id.to_base32()))
        .collect();
    serde_json::to_vec(&as_strings).expect("directory entries always serialize")
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn add(&self, bytes: Bytes, opts: AddOpts) -> Result<ContentId> {
        let id = ContentId::of_bytes(&bytes);
        self.blobs.entry(id).or_insert(bytes);
        if opts.pin {
            self.pins.insert(id, ());
        }
        Ok(id)
    }

    async fn get(&self, id: ContentId) -> Result<Bytes> {
        if let Some(bytes) = self.blobs.get(&id) {
            return Ok(bytes.clone());
        }
        if let Some(entries) = self.dirs.get(&id) {
            return Ok(Bytes::from(encode_dir(&entries)));
        }
        Err(Error::not_found(id))
    }

    async fn stat(&self, id: ContentId) -> Result<BlobStat> {
        if let Some(bytes) = self.blobs.get(&id) {
            return Ok(BlobStat {
                cid: id,
                cumulative_size: bytes.len() as u64,
            });
        }
        if let Some(entries) = self.dirs.get(&id) {
            let own = encode_dir(&entries).len() as u64;
            let mut total = own;
            for (_, target) in entries.iter() {
                // `stat` is already boxed by `#[async_trait]`, so this
                // recursive call has a statically known future size.
                total += self.stat(*target).await?.cumulative_size;
            }
            return Ok(BlobStat {
                cid: id,
                cumulative_size: total,
            });
        }
        Err(Error::not_found(id))
    }

    async fn add_link(&self, directory: ContentId, name: &str, target: ContentId) -> Result<ContentId> {
        let mut entries = self
            .dirs
            .get(&directory)
            .map(|e| e.clone())
            .ok_or_else(|| Error::not_found(directory))?;
        entries.retain(|(n, _)| n != name);
        entries.push((name.to_string(), target));
        let new_id = ContentId::of_bytes(&encode_dir(&entries));
        self.dirs.entry(new_id).or_insert(entries);
        Ok(new_id)
    }

    async fn rm_link(&self, directory: ContentId, name: &str) -> Result<ContentId> {
        let mut entries = self
            .dirs
            .get(&directory)
            .map(|e| e.clone())
            .ok_or_else(|| Error::not_found(directory))?;
        entries.retain(|(n, _)| n != name);
        let new_id = ContentId::of_bytes(&encode_dir(&entries));
        self.dirs.entry(new_id).or_insert(entries);
        Ok(new_id)
    }

    async fn pin_add(&self, id: ContentId) -> Result<()> {
        self.pins.insert(id, ());
        Ok(())
    }

    async fn pin_rm(&self, id: ContentId, _recursive: bool) -> Result<()> {
        self.pins.remove(&id);
        Ok(())
    }

    async fn pin_update(&self, old: ContentId, new: ContentId, unpin_old: bool) -> Result<()> {
        self.pins.insert(new, ());
        if unpin_old {
            self.pins.remove(&old);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_is_content_addressed() {
        let store = MemoryBlobStore::new();
        let a = store.add(Bytes::from_static(b"x"), AddOpts::default()).await.unwrap();
        let b = store.add(Bytes::from_static(b"x"), AddOpts::default()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn add_link_is_pure_wrt_tree_hash() {
        let store = MemoryBlobStore::new();
        let empty = empty_directory_id();
        let leaf = store.add(Bytes::from_static(b"leaf"), AddOpts::default()).await.unwrap();

        // Two different edit histories that arrive at the same content.
        let via_a = store.add_link(empty, "a", leaf).await.unwrap();
        let via_a_then_b = store.add_link(via_a, "b", leaf).await.unwrap();

        let via_b = store.add_link(empty, "b", leaf).await.unwrap();
        let via_b_then_a = store.add_link(via_b, "a", leaf).await.unwrap();

        assert_eq!(via_a_then_b, via_b_then_a);
    }

    #[tokio::test]
    async fn rm_link_restores_empty_directory() {
        let store = MemoryBlobStore::new();
        let empty = empty_directory_id();
        let leaf = store.add(Bytes::from_static(b"leaf"), AddOpts::default()).await.unwrap();
        let with_link = store.add_link(empty, "a", leaf).await.unwrap();
        let removed = store.rm_link(with_link, "a").await.unwrap();
        assert_eq!(removed, empty);
    }

    #[tokio::test]
    async fn stat_is_cumulative() {
        let store = MemoryBlobStore::new();
        let empty = empty_directory_id();
        let leaf = store.add(Bytes::from_static(b"hello"), AddOpts::default()).await.unwrap();
        let dir = store.add_link(empty, "a", leaf).await.unwrap();
        let stat = store.stat(dir).await.unwrap();
        assert!(stat.cumulative_size > 5); // own encoding + leaf bytes
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryBlobStore::new();
        let bogus = ContentId::of_bytes(b"never added");
        assert!(matches!(store.get(bogus).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn pin_update_swaps_atomically() {
        let store = MemoryBlobStore::new();
        let old = ContentId::of_bytes(b"old");
        let new = ContentId::of_bytes(b"new");
        store.pin_add(old).await.unwrap();
        store.pin_update(old, new, true).await.unwrap();
        assert!(store.is_pinned(new));
        assert!(!store.is_pinned(old));
    }
}
