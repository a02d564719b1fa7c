// SPDX-License-Identifier: MIT OR Apache-2.0
//! The [`BlobStore`] contract.

use async_trait::async_trait;
use bytes::Bytes;
use pkgs_error::Result;
use pkgs_model::ContentId;

/// Options accepted by [`BlobStore::add`].
#[derive(Debug, Clone, Copy)]
pub struct AddOpts {
    /// Pin the blob immediately on add.
    pub pin: bool,
    /// Store the blob as a raw leaf (no UnixFS framing) rather than
    /// wrapping it in a dag-pb node. This server always adds raw leaves so
    /// `ContentId::of_bytes` and the blob layer's own hash agree.
    pub raw_leaves: bool,
    /// CID version. Always `1` for this server; kept in the contract for
    /// fidelity with the reference `add` call shape.
    pub cid_version: u8,
}

impl Default for AddOpts {
    fn default() -> Self {
        AddOpts {
            pin: false,
            raw_leaves: true,
            cid_version: 1,
        }
    }
}

/// The result of a [`BlobStore::stat`] call.
#[derive(Debug, Clone, Copy)]
pub struct BlobStat {
    /// The blob's own identifier (echoed back for convenience).
    pub cid: ContentId,
    /// The cumulative size of the blob, or — for a directory object — of
    /// the directory and everything it transitively links to.
    pub cumulative_size: u64,
}

/// Abstracts a content-addressed block store with a directory-object
/// primitive. Implementations must guarantee that `add_link`/`rm_link` are
/// pure with respect to the tree-hash of the directory: two directories
/// with equal contents hash equal, regardless of the sequence of edits
/// that produced them.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Add `bytes` to the store, returning its content identifier.
    /// Idempotent: adding identical bytes twice returns the same id.
    async fn add(&self, bytes: Bytes, opts: AddOpts) -> Result<ContentId>;

    /// Fetch the bytes behind `id`. Returns [`pkgs_error::Error::NotFound`]
    /// if the blob is unknown to this store.
    async fn get(&self, id: ContentId) -> Result<Bytes>;

    /// Stat a blob or directory object.
    async fn stat(&self, id: ContentId) -> Result<BlobStat>;

    /// Return the id of a new directory object identical to `directory`
    /// except that `name` now links to `target` (overwriting any existing
    /// link of that name).
    async fn add_link(&self, directory: ContentId, name: &str, target: ContentId) -> Result<ContentId>;

    /// Return the id of a new directory object identical to `directory`
    /// except that the link named `name` is removed, if present.
    async fn rm_link(&self, directory: ContentId, name: &str) -> Result<ContentId>;

    /// Pin `id`, keeping it (and anything it references) alive.
    async fn pin_add(&self, id: ContentId) -> Result<()>;

    /// Unpin `id`. `recursive` unpins everything `id` transitively
    /// references that isn't pinned elsewhere.
    async fn pin_rm(&self, id: ContentId, recursive: bool) -> Result<()>;

    /// Atomically swap the pin from `old` to `new`, from the pin set's
    /// perspective: the only primitive that moves the liveness anchor
    /// at the root in one step.
    async fn pin_update(&self, old: ContentId, new: ContentId, unpin_old: bool) -> Result<()>;
}
