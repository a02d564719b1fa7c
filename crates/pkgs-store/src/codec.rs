// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire encoding of a stored resource entry: `[tag: u8][bincode body]`.
//!
//! The tag lets a reader dispatch on variant before touching the body —
//! `bincode` is this ecosystem's natural compact-binary counterpart
//! when pairing with `sled`.

use pkgs_error::{Error, Result};
use pkgs_model::{Assertion, File, Package, Resource, ResourceTag};

/// Encode a resource as `[tag][body]`.
pub fn encode(resource: &Resource) -> Vec<u8> {
    let (tag, body) = match resource {
        Resource::Package(p) => (ResourceTag::Package, bincode::serialize(p)),
        Resource::Assertion(a) => (ResourceTag::Assertion, bincode::serialize(a)),
        Resource::File(f) => (ResourceTag::File, bincode::serialize(f)),
    };
    let body = body.expect("resource variants always serialize");
    let mut buf = Vec::with_capacity(1 + body.len());
    buf.push(tag.to_byte());
    buf.extend_from_slice(&body);
    buf
}

/// Decode a `[tag][body]` entry produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Resource> {
    let (&tag_byte, body) = bytes
        .split_first()
        .ok_or_else(|| Error::invariant("empty resource-store entry"))?;
    let tag = ResourceTag::from_byte(tag_byte)
        .ok_or_else(|| Error::invariant(format!("unknown resource tag {tag_byte}")))?;
    let resource = match tag {
        ResourceTag::Package => Resource::Package(
            bincode::deserialize::<Package>(body).map_err(|e| Error::invariant(e.to_string()))?,
        ),
        ResourceTag::Assertion => Resource::Assertion(
            bincode::deserialize::<Assertion>(body).map_err(|e| Error::invariant(e.to_string()))?,
        ),
        ResourceTag::File => Resource::File(
            bincode::deserialize::<File>(body).map_err(|e| Error::invariant(e.to_string()))?,
        ),
    };
    Ok(resource)
}

/// Read just the tag byte, without deserialising the body — the whole
/// point of storing it alongside the payload.
pub fn peek_tag(bytes: &[u8]) -> Option<ResourceTag> {
    bytes.first().copied().and_then(ResourceTag::from_byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgs_model::{empty_directory_id, ContentId};

    #[test]
    fn round_trips_package() {
        let pkg = Package::new_empty(
            "dweb:/ipns/peer".into(),
            "c14n0".into(),
            ContentId::of_bytes(b"id"),
            empty_directory_id(),
            0,
            chrono::Utc::now(),
        );
        let resource = Resource::Package(pkg);
        let bytes = encode(&resource);
        assert_eq!(peek_tag(&bytes), Some(ResourceTag::Package));
        let back = decode(&bytes).unwrap();
        assert_eq!(back.etag(), resource.etag());
    }

    #[test]
    fn round_trips_file() {
        let resource = Resource::File(File {
            value_id: ContentId::of_bytes(b"x"),
            media_type: "text/plain".into(),
            extent: 1,
        });
        let bytes = encode(&resource);
        assert_eq!(peek_tag(&bytes), Some(ResourceTag::File));
        let back = decode(&bytes).unwrap();
        assert_eq!(back.etag(), resource.etag());
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        assert!(decode(&[9, 1, 2, 3]).is_err());
    }

    #[test]
    fn decode_rejects_empty() {
        assert!(decode(&[]).is_err());
    }
}
