// SPDX-License-Identifier: MIT OR Apache-2.0
//! The Package quad-emission rules.

use crate::vocab;
use pkgs_model::{xsd, Package, Quad, Resource, Term};

/// A resolved child of a package being projected: its member name and its
/// already-loaded resource.
pub struct Member<'a> {
    /// The name this child is bound to within the parent's `member` list.
    pub name: &'a str,
    /// The child resource itself.
    pub resource: &'a Resource,
}

/// Emit the bag of quads describing `pkg` and its resolved `members`,
/// with the package's own subject as the blank node `_:b0` (items 1-8).
/// The subject is relabelled to its canonical form by [`crate::canon`]
/// after this call.
pub fn project_package(pkg: &Package, members: &[Member<'_>]) -> Vec<Quad> {
    let subject = Term::blank("b0");
    let mut quads = Vec::new();

    // 1. type
    quads.push(Quad::triple(subject.clone(), Term::iri(vocab::RDF_TYPE), Term::iri(vocab::UL_PACKAGE)));

    // 2. hasMemberRelation
    quads.push(Quad::triple(
        subject.clone(),
        Term::iri(vocab::LDP_HAS_MEMBER_RELATION),
        Term::iri(vocab::PROV_HAD_MEMBER),
    ));

    // 3. membershipResource
    quads.push(Quad::triple(
        subject.clone(),
        Term::iri(vocab::LDP_MEMBERSHIP_RESOURCE),
        Term::iri(&pkg.resource_uri),
    ));

    // 4. value + extent
    let value_uri = vocab::dweb_ipfs(&pkg.value_id);
    quads.push(Quad::triple(subject.clone(), Term::iri(vocab::PROV_VALUE), Term::iri(&value_uri)));
    quads.push(Quad::triple(
        Term::iri(&value_uri),
        Term::iri(vocab::DCTERMS_EXTENT),
        Term::typed_literal(pkg.value_extent.to_string(), xsd::INTEGER),
    ));

    // 5. created/modified
    quads.push(Quad::triple(
        subject.clone(),
        Term::iri(vocab::DCTERMS_CREATED),
        Term::typed_literal(pkg.created.to_rfc3339(), xsd::DATE_TIME),
    ));
    quads.push(Quad::triple(
        subject.clone(),
        Term::iri(vocab::DCTERMS_MODIFIED),
        Term::typed_literal(pkg.modified.to_rfc3339(), xsd::DATE_TIME),
    ));

    // 6. wasRevisionOf
    if let (Some(rev_id), Some(rev_subject)) = (&pkg.revision_of_id, &pkg.revision_of_subject) {
        quads.push(Quad::triple(
            subject.clone(),
            Term::iri(vocab::PROV_WAS_REVISION_OF),
            Term::iri(vocab::ul_fragment(rev_id, rev_subject)),
        ));
    }

    // 7. description/keywords
    if let Some(description) = &pkg.description {
        quads.push(Quad::triple(
            subject.clone(),
            Term::iri(vocab::DCTERMS_DESCRIPTION),
            Term::plain_literal(description),
        ));
    }
    if let Some(keywords) = &pkg.keywords {
        for keyword in keywords {
            quads.push(Quad::triple(
                subject.clone(),
                Term::iri(vocab::DCTERMS_SUBJECT),
                Term::plain_literal(keyword),
            ));
        }
    }

    // 8. members
    for member in members {
        quads.extend(project_member(&subject, &pkg.resource_uri, member));
    }

    quads
}

fn project_member(subject: &Term, parent_resource_uri: &str, member: &Member<'_>) -> Vec<Quad> {
    let mut quads = Vec::new();
    match member.resource {
        Resource::Package(child) => {
            let child_uri = Term::iri(vocab::ul_fragment(&child.id, &child.subject_tag));
            quads.push(Quad::triple(subject.clone(), Term::iri(vocab::PROV_HAD_MEMBER), child_uri.clone()));
            quads.push(Quad::triple(
                child_uri.clone(),
                Term::iri(vocab::LDP_MEMBERSHIP_RESOURCE),
                Term::iri(&child.resource_uri),
            ));
            quads.push(Quad::triple(
                child_uri,
                Term::iri(vocab::DCTERMS_TITLE),
                Term::plain_literal(member.name),
            ));
        }
        Resource::Assertion(child) => {
            let child_uri = Term::iri(vocab::ul_value(&child.value_id));
            quads.push(Quad::triple(subject.clone(), Term::iri(vocab::PROV_HAD_MEMBER), child_uri.clone()));
            if child.value_id.to_base32() != member.name {
                quads.push(Quad::triple(
                    child_uri.clone(),
                    Term::iri(vocab::LDP_MEMBERSHIP_RESOURCE),
                    Term::iri(format!("{parent_resource_uri}/{}", member.name)),
                ));
                quads.push(Quad::triple(
                    child_uri,
                    Term::iri(vocab::DCTERMS_TITLE),
                    Term::plain_literal(member.name),
                ));
            }
        }
        Resource::File(child) => {
            let child_uri = Term::iri(vocab::dweb_ipfs(&child.value_id));
            quads.push(Quad::triple(subject.clone(), Term::iri(vocab::PROV_HAD_MEMBER), child_uri.clone()));
            quads.push(Quad::triple(
                child_uri.clone(),
                Term::iri(vocab::DCTERMS_EXTENT),
                Term::typed_literal(child.extent.to_string(), xsd::INTEGER),
            ));
            quads.push(Quad::triple(
                child_uri.clone(),
                Term::iri(vocab::DCTERMS_FORMAT),
                Term::typed_literal(&child.media_type, xsd::STRING),
            ));
            if child.value_id.to_base32() != member.name {
                quads.push(Quad::triple(
                    child_uri.clone(),
                    Term::iri(vocab::LDP_MEMBERSHIP_RESOURCE),
                    Term::iri(format!("{parent_resource_uri}/{}", member.name)),
                ));
                quads.push(Quad::triple(
                    child_uri,
                    Term::iri(vocab::DCTERMS_TITLE),
                    Term::plain_literal(member.name),
                ));
            }
        }
    }
    quads
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgs_model::{ContentId, File};

    fn sample_package() -> Package {
        Package::new_empty(
            "dweb:/ipns/peer/a".to_string(),
            "b0".to_string(),
            ContentId::of_bytes(b"initial-id"),
            ContentId::of_bytes(b"value-dir"),
            0,
            chrono::Utc::now(),
        )
    }

    #[test]
    fn emits_type_and_membership_triples() {
        let pkg = sample_package();
        let quads = project_package(&pkg, &[]);
        assert!(quads.iter().any(|q| q.predicate == Term::iri(vocab::RDF_TYPE)
            && q.object == Term::iri(vocab::UL_PACKAGE)));
        assert!(quads
            .iter()
            .any(|q| q.predicate == Term::iri(vocab::LDP_MEMBERSHIP_RESOURCE)));
    }

    #[test]
    fn file_member_gets_title_only_when_name_diverges_from_cid() {
        let pkg = sample_package();
        let file = Resource::File(File {
            value_id: ContentId::of_bytes(b"hello"),
            media_type: "text/plain".to_string(),
            extent: 5,
        });
        let member = Member { name: "readme.txt", resource: &file };
        let quads = project_package(&pkg, &[member]);
        assert!(quads.iter().any(|q| q.predicate == Term::iri(vocab::DCTERMS_TITLE)));
    }

    #[test]
    fn file_member_named_by_its_own_cid_gets_no_title() {
        let pkg = sample_package();
        let value_id = ContentId::of_bytes(b"hello");
        let name = value_id.to_base32();
        let file = Resource::File(File { value_id, media_type: "text/plain".to_string(), extent: 5 });
        let member = Member { name: &name, resource: &file };
        let quads = project_package(&pkg, &[member]);
        assert!(!quads.iter().any(|q| q.predicate == Term::iri(vocab::DCTERMS_TITLE)));
    }
}
