// SPDX-License-Identifier: MIT OR Apache-2.0
//! Content identifiers.
//!
//! A [`ContentId`] wraps a CIDv1, raw codec (`0x55`), sha2-256 multihash —
//! the same shape the blob layer's Kubo-compatible API returns from
//! `/api/v0/add`. Two blobs with equal bytes always yield equal
//! `ContentId`s.

use cid::Cid;
use multihash::Multihash;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// The raw-leaf IPLD codec used for every blob this server writes.
const RAW_CODEC: u64 = 0x55;
/// The sha2-256 multihash code.
const SHA2_256: u64 = 0x12;

/// An opaque, content-derived identifier for a blob stored in the blob
/// layer — either a package's canonical RDF blob, an assertion's N-Quads
/// blob, a file's bytes, or a value-directory object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(Cid);

impl ContentId {
    /// Hash `bytes` with sha2-256 and wrap the digest as a CIDv1 raw-leaf
    /// identifier. This is what a content-addressed blob store does
    /// internally when asked to `add` a blob; exposed here so the
    /// in-memory blob store (and tests) can compute the same identifiers
    /// a real blob layer would return for the same bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mh = Multihash::wrap(SHA2_256, &digest).expect("sha2-256 digest fits multihash");
        ContentId(Cid::new_v1(RAW_CODEC, mh))
    }

    /// Wrap a [`Cid`] obtained directly from the blob layer's response.
    pub fn from_cid(cid: Cid) -> Self {
        ContentId(cid)
    }

    /// The underlying [`Cid`].
    pub fn as_cid(&self) -> &Cid {
        &self.0
    }

    /// Lowercase, unpadded base32 string form — the reference
    /// implementation's ETag and URI payload. 59 characters for a
    /// sha2-256/raw CIDv1.
    pub fn to_base32(&self) -> String {
        self.0.to_string()
    }

    /// Parse a base32 (or any multibase) CID string as produced by
    /// [`ContentId::to_base32`] or the blob layer's HTTP API.
    pub fn parse(s: &str) -> Result<Self, ParseContentIdError> {
        let cid = Cid::from_str(s).map_err(|_| ParseContentIdError(s.to_string()))?;
        Ok(ContentId(cid))
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.to_base32())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base32())
    }
}

impl serde::Serialize for ContentId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_base32())
    }
}

impl<'de> serde::Deserialize<'de> for ContentId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        ContentId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Error returned when a string does not parse as a [`ContentId`].
#[derive(Debug, thiserror::Error)]
#[error("invalid content id: {0}")]
pub struct ParseContentIdError(pub String);

/// The canonical empty UnixFS directory protobuf, per Kubo. Every
/// directory-object encoding a blob store backend uses must agree with
/// this for the empty case, so that a freshly emptied directory (e.g.
/// via `rm_link`) hashes back to [`empty_directory_id`] instead of some
/// other, backend-specific "empty" encoding.
pub fn empty_directory_bytes() -> &'static [u8] {
    &[0x0a, 0x02, 0x08, 0x01]
}

/// The distinguished empty-directory content id. The blob layer pins this
/// at startup so a freshly `MKCOL`'d package always has a valid
/// `value_id` before anything is ever written into it.
pub fn empty_directory_id() -> ContentId {
    ContentId::of_bytes(empty_directory_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bytes_yield_equal_ids() {
        let a = ContentId::of_bytes(b"hello");
        let b = ContentId::of_bytes(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.to_base32(), b.to_base32());
    }

    #[test]
    fn different_bytes_yield_different_ids() {
        let a = ContentId::of_bytes(b"hello");
        let b = ContentId::of_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn base32_round_trips() {
        let a = ContentId::of_bytes(b"round trip me");
        let s = a.to_base32();
        let b = ContentId::parse(&s).expect("parses");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_directory_id_is_stable() {
        assert_eq!(empty_directory_id(), empty_directory_id());
    }
}
