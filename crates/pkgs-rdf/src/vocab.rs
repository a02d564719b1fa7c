// SPDX-License-Identifier: MIT OR Apache-2.0
//! The fixed set of vocabulary IRIs the projection emits.

/// `rdf:type`.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// `ul:Package`.
pub const UL_PACKAGE: &str = "http://underlay.mit.edu/ns#Package";

/// `ldp:hasMemberRelation`.
pub const LDP_HAS_MEMBER_RELATION: &str = "http://www.w3.org/ns/ldp#hasMemberRelation";

/// `ldp:membershipResource`.
pub const LDP_MEMBERSHIP_RESOURCE: &str = "http://www.w3.org/ns/ldp#membershipResource";

/// `prov:hadMember`.
pub const PROV_HAD_MEMBER: &str = "http://www.w3.org/ns/prov#hadMember";

/// `prov:value`.
pub const PROV_VALUE: &str = "http://www.w3.org/ns/prov#value";

/// `prov:wasRevisionOf`.
pub const PROV_WAS_REVISION_OF: &str = "http://www.w3.org/ns/prov#wasRevisionOf";

/// `dcterms:extent`.
pub const DCTERMS_EXTENT: &str = "http://purl.org/dc/terms/extent";

/// `dcterms:created`.
pub const DCTERMS_CREATED: &str = "http://purl.org/dc/terms/created";

/// `dcterms:modified`.
pub const DCTERMS_MODIFIED: &str = "http://purl.org/dc/terms/modified";

/// `dcterms:description`.
pub const DCTERMS_DESCRIPTION: &str = "http://purl.org/dc/terms/description";

/// `dcterms:subject`.
pub const DCTERMS_SUBJECT: &str = "http://purl.org/dc/terms/subject";

/// `dcterms:title`.
pub const DCTERMS_TITLE: &str = "http://purl.org/dc/terms/title";

/// `dcterms:format`.
pub const DCTERMS_FORMAT: &str = "http://purl.org/dc/terms/format";

/// Build the `ul:<id>#<subject_tag>` URI a Package's RDF subject resolves
/// to once it has a `ContentId` and `subject_tag`.
pub fn ul_fragment(id: &pkgs_model::ContentId, subject_tag: &str) -> String {
    format!("ul:{id}#{subject_tag}")
}

/// Build the `ul:<value_id>` URI an Assertion's RDF subject resolves to.
pub fn ul_value(value_id: &pkgs_model::ContentId) -> String {
    format!("ul:{value_id}")
}

/// Build the `dweb:/ipfs/<id>` URI a File or a value directory resolves
/// to.
pub fn dweb_ipfs(id: &pkgs_model::ContentId) -> String {
    format!("dweb:/ipfs/{id}")
}
