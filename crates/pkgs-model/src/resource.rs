// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `Resource` sum type: Package, Assertion, File.

use crate::content_id::ContentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The one-byte tag stored alongside a resource's encoded payload in the
/// resource store, so a reader can dispatch on variant without
/// deserialising the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceTag {
    /// An LDP-container-like collection.
    Package = 1,
    /// A canonicalised RDF graph.
    Assertion = 2,
    /// Opaque bytes with a declared media type.
    File = 3,
}

impl ResourceTag {
    /// Recover a tag from its on-disk byte value.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Package),
            2 => Some(Self::Assertion),
            3 => Some(Self::File),
            _ => None,
        }
    }

    /// The on-disk byte value.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// An ordered, self-describing container of named children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// The stable external URI, e.g. `dweb:/ipns/<peer>/a/b`.
    pub resource_uri: String,
    /// The blank-node label this package's subject received from
    /// canonicalisation (typically `c14n0`); fixes `uri()`'s fragment.
    pub subject_tag: String,
    /// The ContentID of this package's canonical RDF blob, recomputed on
    /// every mutation.
    pub id: ContentId,
    /// The ContentID of the blob-layer directory object mirroring this
    /// package's members.
    pub value_id: ContentId,
    /// The blob-layer cumulative size of `value_id`.
    pub value_extent: u64,
    /// Creation timestamp, set once.
    pub created: DateTime<Utc>,
    /// Last-modified timestamp, updated on every percolation through this
    /// package.
    pub modified: DateTime<Utc>,
    /// Order-irrelevant set of child names. Iteration order is stable for
    /// a given tree state (insertion order is preserved; members are
    /// never reordered in place).
    pub member: Vec<String>,
    /// The `id` this package had immediately before the current mutation,
    /// if any (set by the percolator on every step after the first).
    pub revision_of_id: Option<ContentId>,
    /// The `subject_tag` that went with `revision_of_id`.
    pub revision_of_subject: Option<String>,
    /// Optional `dcterms:description`.
    pub description: Option<String>,
    /// Optional `dcterms:subject` keywords.
    pub keywords: Option<Vec<String>>,
}

impl Package {
    /// Construct a brand-new, empty package at creation time. `value_id`
    /// should be [`crate::content_id::empty_directory_id`] for a freshly
    /// `MKCOL`'d package.
    pub fn new_empty(
        resource_uri: String,
        subject_tag: String,
        id: ContentId,
        value_id: ContentId,
        value_extent: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Package {
            resource_uri,
            subject_tag,
            id,
            value_id,
            value_extent,
            created: now,
            modified: now,
            member: Vec::new(),
            revision_of_id: None,
            revision_of_subject: None,
            description: None,
            keywords: None,
        }
    }

    /// Does `name` collide with an existing member, or with an existing
    /// member's `.nt` sidecar, or (if `name` itself ends in `.nt`) with a
    /// sidecar some other member would register? Implements the stricter
    /// of the two plausible readings of the uniqueness rule.
    pub fn collides_with(&self, name: &str) -> bool {
        if self.member.iter().any(|m| m == name) {
            return true;
        }
        // `name`'s own auto-linked sidecar would shadow an existing member.
        let sidecar = crate::path::sidecar_name(name);
        if self.member.iter().any(|m| *m == sidecar) {
            return true;
        }
        // `name` itself looks like some existing member's auto sidecar.
        if let Some(base) = name.strip_suffix(".nt") {
            if self.member.iter().any(|m| m == base) {
                return true;
            }
        }
        false
    }
}

/// A canonicalised RDF graph, stored as a normalised N-Quads blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    /// The ContentID of the normalised N-Quads blob.
    pub value_id: ContentId,
}

/// Opaque bytes with a server-declared size and MIME type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    /// The ContentID of the file's bytes.
    pub value_id: ContentId,
    /// The declared media type, e.g. `text/plain`.
    pub media_type: String,
    /// The byte length of the file.
    pub extent: u64,
}

/// A resource at some path in the package tree: exactly one of Package,
/// Assertion, or File.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Resource {
    /// A versioned directory of members.
    Package(Package),
    /// An immutable RDF graph.
    Assertion(Assertion),
    /// An immutable opaque blob.
    File(File),
}

impl Resource {
    /// This resource's [`ResourceTag`].
    pub fn tag(&self) -> ResourceTag {
        match self {
            Resource::Package(_) => ResourceTag::Package,
            Resource::Assertion(_) => ResourceTag::Assertion,
            Resource::File(_) => ResourceTag::File,
        }
    }

    /// The quoted, base32 ETag value for this resource.
    pub fn etag(&self) -> String {
        match self {
            Resource::Package(p) => p.id.to_base32(),
            Resource::Assertion(a) => a.value_id.to_base32(),
            Resource::File(f) => f.value_id.to_base32(),
        }
    }

    /// The stable external URI for this resource.
    pub fn uri(&self) -> String {
        match self {
            Resource::Package(p) => format!("ul:{}#{}", p.id.to_base32(), p.subject_tag),
            Resource::Assertion(a) => format!("ul:{}", a.value_id.to_base32()),
            Resource::File(f) => format!("dweb:/ipfs/{}", f.value_id.to_base32()),
        }
    }

    /// Borrow this resource as a [`Package`], if it is one.
    pub fn as_package(&self) -> Option<&Package> {
        match self {
            Resource::Package(p) => Some(p),
            _ => None,
        }
    }

    /// Mutably borrow this resource as a [`Package`], if it is one.
    pub fn as_package_mut(&mut self) -> Option<&mut Package> {
        match self {
            Resource::Package(p) => Some(p),
            _ => None,
        }
    }

    /// Consume this resource as a [`Package`], if it is one.
    pub fn into_package(self) -> Option<Package> {
        match self {
            Resource::Package(p) => Some(p),
            _ => None,
        }
    }

    /// This resource's `value_id`, the one field every variant carries.
    pub fn value_id(&self) -> ContentId {
        match self {
            Resource::Package(p) => p.value_id,
            Resource::Assertion(a) => a.value_id,
            Resource::File(f) => f.value_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_id::empty_directory_id;

    fn sample_package() -> Package {
        Package::new_empty(
            "dweb:/ipns/peer/a".into(),
            "c14n0".into(),
            ContentId::of_bytes(b"rdf-blob"),
            empty_directory_id(),
            0,
            Utc::now(),
        )
    }

    #[test]
    fn package_etag_is_id_base32() {
        let p = sample_package();
        let expected = p.id.to_base32();
        let res = Resource::Package(p);
        assert_eq!(res.etag(), expected);
    }

    #[test]
    fn package_uri_has_subject_fragment() {
        let p = sample_package();
        let res = Resource::Package(p);
        assert!(res.uri().starts_with("ul:"));
        assert!(res.uri().ends_with("#c14n0"));
    }

    #[test]
    fn file_uri_is_dweb_ipfs() {
        let f = File {
            value_id: ContentId::of_bytes(b"hi"),
            media_type: "text/plain".into(),
            extent: 2,
        };
        let res = Resource::File(f);
        assert!(res.uri().starts_with("dweb:/ipfs/"));
    }

    #[test]
    fn collision_detects_direct_and_sidecar_names() {
        let mut p = sample_package();
        p.member.push("child".into());
        assert!(p.collides_with("child"));
        assert!(p.collides_with("child.nt"));
        assert!(!p.collides_with("other"));
    }

    #[test]
    fn collision_detects_reverse_sidecar_case() {
        let mut p = sample_package();
        p.member.push("thing.nt".into());
        // "thing" would want to register "thing.nt" as its own sidecar,
        // which already exists as a direct member name.
        assert!(p.collides_with("thing"));
    }

    #[test]
    fn tag_round_trips_through_byte() {
        assert_eq!(ResourceTag::from_byte(ResourceTag::Package.to_byte()), Some(ResourceTag::Package));
        assert_eq!(ResourceTag::from_byte(ResourceTag::Assertion.to_byte()), Some(ResourceTag::Assertion));
        assert_eq!(ResourceTag::from_byte(ResourceTag::File.to_byte()), Some(ResourceTag::File));
        assert_eq!(ResourceTag::from_byte(0), None);
    }
}
