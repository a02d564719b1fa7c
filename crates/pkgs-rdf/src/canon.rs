// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonicalisation to N-Quads via URDNA2015.
//!
//! A package's own projection ([`crate::project::project_package`]) has
//! exactly one blank node: its own subject, `_:b0`. Every member it
//! refers to is addressed by an already-resolved `ul:`/`dweb:` IRI, never
//! by a blank node. RDFC-1.0 (the standardised successor to URDNA2015)
//! assigns canonical labels by a hash-based partition-refinement over the
//! blank nodes in a graph; with a single blank node there is nothing to
//! refine, and it receives the algorithm's first canonical label,
//! `c14n0`, deterministically. Computing that directly avoids pulling the
//! general algorithm's isomorphism machinery into the hot path of every
//! package mutation.
//!
//! Client-submitted Assertion graphs carry no such guarantee — they may
//! contain arbitrarily many blank nodes in arbitrary shapes — so those go
//! through [`canonicalize_assertion`], which defers to `sophia_c14n`'s
//! RDFC-1.0 implementation.

use pkgs_error::{Error, Result};
use pkgs_model::{Quad, Term};
use sophia_api::dataset::MutableDataset;
use sophia_api::term::SimpleTerm;
use sophia_c14n::rdfc10;
use sophia_inmem::dataset::LightDataset;

/// The canonical label this crate assigns to a package projection's sole
/// blank subject.
pub const PACKAGE_SUBJECT_LABEL: &str = "c14n0";

/// Canonicalise a package projection produced by
/// [`crate::project::project_package`]. Returns the canonical N-Quads
/// text (quads sorted in code-point order, one per line) and the label
/// assigned to the subject (always [`PACKAGE_SUBJECT_LABEL`]).
///
/// Fails with [`Error::Internal`] if the input doesn't have the shape
/// this crate's own projector produces (at most one blank node, `_:b0`).
pub fn canonicalize_package_projection(quads: &[Quad]) -> Result<(String, String)> {
    let blank_labels: std::collections::BTreeSet<&str> = quads
        .iter()
        .flat_map(|q| [&q.subject, &q.predicate, &q.object])
        .filter_map(|t| match t {
            Term::BlankNode { value } => Some(value.as_str()),
            _ => None,
        })
        .collect();
    if blank_labels.len() > 1 {
        return Err(Error::Internal(format!(
            "package projection has {} blank nodes, expected at most one",
            blank_labels.len()
        )));
    }

    let relabel = |t: &Term| -> Term {
        match t {
            Term::BlankNode { .. } => Term::blank(PACKAGE_SUBJECT_LABEL),
            other => other.clone(),
        }
    };
    let mut lines: Vec<String> = quads
        .iter()
        .map(|q| {
            Quad {
                subject: relabel(&q.subject),
                predicate: relabel(&q.predicate),
                object: relabel(&q.object),
                graph: q.graph.as_ref().map(relabel),
            }
            .to_nquads_line()
        })
        .collect();
    lines.sort();
    lines.dedup();
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    Ok((text, PACKAGE_SUBJECT_LABEL.to_string()))
}

/// Canonicalise an arbitrary client-submitted graph (an Assertion body)
/// via RDFC-1.0, returning canonical N-Quads text.
pub fn canonicalize_assertion(quads: &[Quad]) -> Result<String> {
    let mut dataset = LightDataset::new();
    for quad in quads {
        let graph_name = quad.graph.as_ref().map(to_sophia).transpose()?;
        dataset
            .insert(&to_sophia(&quad.subject)?, &to_sophia(&quad.predicate)?, &to_sophia(&quad.object)?, graph_name.as_ref())
            .map_err(|e| Error::Unprocessable(e.to_string()))?;
    }
    let mut out = Vec::new();
    rdfc10::normalize(&dataset, &mut out).map_err(|e| Error::Unprocessable(e.to_string()))?;
    String::from_utf8(out).map_err(|e| Error::Internal(e.to_string()))
}

fn to_sophia(term: &Term) -> Result<SimpleTerm<'static>> {
    use sophia_api::term::{IriRef, LanguageTag};
    match term {
        Term::NamedNode { value } => {
            let iri = IriRef::new(value.clone().into())
                .map_err(|e| Error::Unprocessable(format!("invalid IRI {value}: {e}")))?;
            Ok(SimpleTerm::Iri(iri))
        }
        Term::BlankNode { value } => Ok(SimpleTerm::BlankNode(value.clone().into())),
        Term::Literal { value, language: Some(lang), .. } => {
            let tag = LanguageTag::new(lang.clone().into())
                .map_err(|e| Error::Unprocessable(format!("invalid language tag {lang}: {e}")))?;
            Ok(SimpleTerm::LiteralLanguage(value.clone().into(), tag))
        }
        Term::Literal { value, datatype: Some(dt), .. } => {
            let Term::NamedNode { value: dt_iri } = dt.as_ref() else {
                return Err(Error::Unprocessable("literal datatype must be an IRI".to_string()));
            };
            let iri = IriRef::new(dt_iri.clone().into())
                .map_err(|e| Error::Unprocessable(format!("invalid IRI {dt_iri}: {e}")))?;
            Ok(SimpleTerm::LiteralDatatype(value.clone().into(), iri))
        }
        Term::Literal { value, .. } => {
            let iri = IriRef::new(pkgs_model::xsd::STRING.into()).expect("xsd:string is a valid IRI");
            Ok(SimpleTerm::LiteralDatatype(value.clone().into(), iri))
        }
        Term::Variable { .. } => Err(Error::Unprocessable("variables cannot appear in stored data".to_string())),
        Term::DefaultGraph => Err(Error::Internal("default graph marker used as a term".to_string())),
    }
}

/// Parse an N-Quads document into this crate's `Quad` representation.
pub fn parse_nquads(text: &str) -> Result<Vec<Quad>> {
    use sophia_api::quad::Quad as _;
    use sophia_api::source::QuadSource;
    use sophia_turtle::parser::nq::NQuadsParser;

    let mut out = Vec::new();
    NQuadsParser {}
        .parse_str(text)
        .for_each_quad(|q| {
            let ([s, p, o], g) = q.spog();
            out.push(Quad {
                subject: from_sophia(&s),
                predicate: from_sophia(&p),
                object: from_sophia(&o),
                graph: g.as_ref().map(from_sophia),
            });
        })
        .map_err(|e| Error::Unprocessable(format!("invalid N-Quads: {e}")))?;
    Ok(out)
}

/// Serialise quads as an N-Quads document, one line per quad, in the
/// order given. Callers wanting canonical ordering should canonicalise
/// first.
pub fn write_nquads(quads: &[Quad]) -> String {
    let mut text = String::new();
    for quad in quads {
        text.push_str(&quad.to_nquads_line());
        text.push('\n');
    }
    text
}

fn from_sophia(term: &SimpleTerm<'_>) -> Term {
    match term {
        SimpleTerm::Iri(iri) => Term::iri(iri.as_str()),
        SimpleTerm::BlankNode(b) => Term::blank(b.as_str()),
        SimpleTerm::LiteralLanguage(v, lang) => Term::Literal {
            value: v.to_string(),
            language: Some(lang.as_str().to_string()),
            datatype: None,
        },
        SimpleTerm::LiteralDatatype(v, dt) => Term::typed_literal(v.to_string(), dt.as_str()),
        _ => Term::plain_literal(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgs_model::Quad as Q;

    #[test]
    fn single_blank_subject_gets_c14n0() {
        let quads = vec![Q::triple(
            Term::blank("b0"),
            Term::iri("http://example/p"),
            Term::plain_literal("x"),
        )];
        let (text, label) = canonicalize_package_projection(&quads).unwrap();
        assert_eq!(label, "c14n0");
        assert!(text.contains("_:c14n0"));
    }

    #[test]
    fn output_is_sorted_and_deduplicated() {
        let quads = vec![
            Q::triple(Term::blank("b0"), Term::iri("http://example/b"), Term::iri("http://example/o")),
            Q::triple(Term::blank("b0"), Term::iri("http://example/a"), Term::iri("http://example/o")),
            Q::triple(Term::blank("b0"), Term::iri("http://example/a"), Term::iri("http://example/o")),
        ];
        let (text, _) = canonicalize_package_projection(&quads).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0] < lines[1]);
    }

    #[test]
    fn rejects_more_than_one_blank_node() {
        let quads = vec![Q::triple(Term::blank("b0"), Term::iri("http://example/p"), Term::blank("b1"))];
        assert!(canonicalize_package_projection(&quads).is_err());
    }
}
