// SPDX-License-Identifier: MIT OR Apache-2.0
//! The fixed, narrow JSON-LD "Package frame" used for the
//! `application/ld+json` representation. This is not a general JSON-LD
//! processor — there is no
//! framing algorithm, no context resolution over the network, no
//! `@graph`. It knows exactly the shape [`crate::project::project_package`]
//! produces and renders (or re-parses) that shape directly.

use pkgs_error::{Error, Result};
use pkgs_model::{xsd, Quad, Term};
use serde_json::{json, Map, Value};

use crate::vocab;

/// Render a package's canonicalised quads as the fixed JSON-LD frame.
///
/// Shape:
/// ```json
/// {
///   "@id": "ul:<id>#<subject_tag>",
///   "@type": "Package",
///   "ldp:membershipResource": "<resource_uri>",
///   "prov:value": "dweb:/ipfs/<value_id>",
///   "dcterms:created": "...",
///   "dcterms:modified": "...",
///   "dcterms:description": "...",
///   "dcterms:subject": ["...", ...],
///   "prov:wasRevisionOf": "ul:<id>#<tag>",
///   "prov:hadMember": ["ul:... | dweb:/ipfs/...", ...]
/// }
/// ```
pub fn to_fixed_frame(subject_uri: &str, quads: &[Quad]) -> Value {
    let subject = find_subject_term(quads, subject_uri);
    let mut members = Vec::new();
    let mut keywords = Vec::new();
    let mut frame = Map::new();
    frame.insert("@id".to_string(), json!(subject_uri));
    frame.insert("@type".to_string(), json!("Package"));

    for quad in quads {
        if Some(&quad.subject) != subject.as_ref() {
            continue;
        }
        let predicate = match &quad.predicate {
            Term::NamedNode { value } => value.as_str(),
            _ => continue,
        };
        match predicate {
            vocab::LDP_MEMBERSHIP_RESOURCE => insert_iri(&mut frame, "ldp:membershipResource", &quad.object),
            vocab::PROV_VALUE => insert_iri(&mut frame, "prov:value", &quad.object),
            vocab::DCTERMS_CREATED => insert_literal(&mut frame, "dcterms:created", &quad.object),
            vocab::DCTERMS_MODIFIED => insert_literal(&mut frame, "dcterms:modified", &quad.object),
            vocab::DCTERMS_DESCRIPTION => insert_literal(&mut frame, "dcterms:description", &quad.object),
            vocab::PROV_WAS_REVISION_OF => insert_iri(&mut frame, "prov:wasRevisionOf", &quad.object),
            vocab::DCTERMS_SUBJECT => {
                if let Term::Literal { value, .. } = &quad.object {
                    keywords.push(json!(value));
                }
            }
            vocab::PROV_HAD_MEMBER => {
                if let Term::NamedNode { value } = &quad.object {
                    members.push(json!(value));
                }
            }
            _ => {}
        }
    }
    if !keywords.is_empty() {
        frame.insert("dcterms:subject".to_string(), Value::Array(keywords));
    }
    if !members.is_empty() {
        frame.insert("prov:hadMember".to_string(), Value::Array(members));
    }
    Value::Object(frame)
}

fn find_subject_term(quads: &[Quad], _subject_uri: &str) -> Option<Term> {
    quads
        .iter()
        .find(|q| matches!(&q.predicate, Term::NamedNode { value } if value == vocab::PROV_VALUE))
        .or_else(|| quads.first())
        .map(|q| q.subject.clone())
}

fn insert_iri(frame: &mut Map<String, Value>, key: &str, term: &Term) {
    if let Term::NamedNode { value } = term {
        frame.insert(key.to_string(), json!(value));
    }
}

fn insert_literal(frame: &mut Map<String, Value>, key: &str, term: &Term) {
    if let Term::Literal { value, .. } = term {
        frame.insert(key.to_string(), json!(value));
    }
}

/// Parse the fixed JSON-LD Package frame back into quads, for a PUT/PATCH
/// whose body is `application/ld+json` against an RDFSource. Only the
/// subset of predicates an Assertion body plausibly carries
/// (`dcterms:*`) is recognised; structural predicates
/// (`ldp:membershipResource`, `prov:*`) are package-derived and rejected
/// if present in a client body.
pub fn from_fixed_frame(value: &Value) -> Result<Vec<Quad>> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::Unprocessable("JSON-LD body must be a single object".to_string()))?;
    let subject = Term::blank("b0");
    let mut quads = Vec::new();

    for forbidden in ["ldp:membershipResource", "prov:value", "prov:hadMember"] {
        if obj.contains_key(forbidden) {
            return Err(Error::Unprocessable(format!("{forbidden} is derived, not settable")));
        }
    }

    if let Some(description) = obj.get("dcterms:description").and_then(Value::as_str) {
        quads.push(Quad::triple(
            subject.clone(),
            Term::iri(vocab::DCTERMS_DESCRIPTION),
            Term::plain_literal(description),
        ));
    }
    if let Some(keywords) = obj.get("dcterms:subject") {
        let items: Vec<&str> = match keywords {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            Value::String(s) => vec![s.as_str()],
            _ => return Err(Error::Unprocessable("dcterms:subject must be a string or array of strings".to_string())),
        };
        for item in items {
            quads.push(Quad::triple(subject.clone(), Term::iri(vocab::DCTERMS_SUBJECT), Term::plain_literal(item)));
        }
    }
    if let Some(title) = obj.get("dcterms:title").and_then(Value::as_str) {
        quads.push(Quad::triple(subject.clone(), Term::iri(vocab::DCTERMS_TITLE), Term::plain_literal(title)));
    }
    if let Some(created) = obj.get("dcterms:created").and_then(Value::as_str) {
        quads.push(Quad::triple(
            subject.clone(),
            Term::iri(vocab::DCTERMS_CREATED),
            Term::typed_literal(created, xsd::DATE_TIME),
        ));
    }
    Ok(quads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_description_through_fixed_frame() {
        let frame = json!({ "dcterms:description": "sample" });
        let quads = from_fixed_frame(&frame).unwrap();
        assert_eq!(quads.len(), 1);
        assert!(matches!(&quads[0].predicate, Term::NamedNode { value } if value == vocab::DCTERMS_DESCRIPTION));
    }

    #[test]
    fn rejects_structural_predicates_in_client_body() {
        let frame = json!({ "ldp:membershipResource": "dweb:/x" });
        assert!(from_fixed_frame(&frame).is_err());
    }

    #[test]
    fn to_fixed_frame_surfaces_members_and_value() {
        let subject = Term::blank("c14n0");
        let quads = vec![
            Quad::triple(subject.clone(), Term::iri(vocab::PROV_VALUE), Term::iri("dweb:/ipfs/abc")),
            Quad::triple(subject.clone(), Term::iri(vocab::PROV_HAD_MEMBER), Term::iri("dweb:/ipfs/def")),
        ];
        let frame = to_fixed_frame("ul:xyz#c14n0", &quads);
        assert_eq!(frame["prov:value"], json!("dweb:/ipfs/abc"));
        assert_eq!(frame["prov:hadMember"], json!(["dweb:/ipfs/def"]));
    }
}
