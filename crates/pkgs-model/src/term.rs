// SPDX-License-Identifier: MIT OR Apache-2.0
//! The RDF term and quad types shared by the projection, canonicalisation,
//! and query-engine crates, and serialised on the wire exactly as the RPC
//! surface describes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An RDF term: a named node, blank node, literal, variable (used only in
/// query patterns, never in stored data), or the default graph marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "termType")]
pub enum Term {
    /// An IRI.
    NamedNode {
        /// The IRI string.
        value: String,
    },
    /// A blank node, identified by a label local to one graph/dataset.
    BlankNode {
        /// The blank node label, without the `_:` prefix.
        value: String,
    },
    /// A literal value, optionally typed or language-tagged.
    Literal {
        /// The lexical value.
        value: String,
        /// BCP-47 language tag, for `rdf:langString` literals.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        /// The datatype IRI, boxed as a nested term to match the RPC wire
        /// shape (`datatype?: Term`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<Box<Term>>,
    },
    /// A pattern variable. Never appears in committed data.
    Variable {
        /// The variable name, without the leading `?`.
        value: String,
    },
    /// The default (unnamed) graph.
    DefaultGraph,
}

impl Term {
    /// Construct a named node.
    pub fn iri(value: impl Into<String>) -> Self {
        Term::NamedNode { value: value.into() }
    }

    /// Construct a blank node.
    pub fn blank(value: impl Into<String>) -> Self {
        Term::BlankNode { value: value.into() }
    }

    /// Construct a plain (untyped, non-language) string literal.
    pub fn plain_literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            language: None,
            datatype: Some(Box::new(Term::iri(xsd::STRING))),
        }
    }

    /// Construct a typed literal.
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            language: None,
            datatype: Some(Box::new(Term::iri(datatype))),
        }
    }

    /// Is this a blank node?
    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode { .. })
    }

    /// N-Quads-style lexical form, e.g. `<iri>`, `_:b0`, `"lit"^^<dt>`.
    pub fn to_nquads(&self) -> String {
        match self {
            Term::NamedNode { value } => format!("<{value}>"),
            Term::BlankNode { value } => format!("_:{value}"),
            Term::Variable { value } => format!("?{value}"),
            Term::DefaultGraph => String::new(),
            Term::Literal { value, language, datatype } => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
                match (language, datatype) {
                    (Some(lang), _) => format!("\"{escaped}\"@{lang}"),
                    (None, Some(dt)) if dt.as_ref() != &Term::iri(xsd::STRING) => {
                        format!("\"{escaped}\"^^{}", dt.to_nquads())
                    }
                    _ => format!("\"{escaped}\""),
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_nquads())
    }
}

/// A single RDF quad: subject, predicate, object, and an optional named
/// graph (`None` means the default graph).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quad {
    /// The quad's subject.
    pub subject: Term,
    /// The quad's predicate.
    pub predicate: Term,
    /// The quad's object.
    pub object: Term,
    /// The named graph, if any.
    #[serde(default)]
    pub graph: Option<Term>,
}

impl Quad {
    /// Construct a default-graph triple.
    pub fn triple(subject: Term, predicate: Term, object: Term) -> Self {
        Quad { subject, predicate, object, graph: None }
    }

    /// This quad's one line of canonical N-Quads text, without the
    /// trailing newline.
    pub fn to_nquads_line(&self) -> String {
        match &self.graph {
            Some(g) => format!(
                "{} {} {} {} .",
                self.subject.to_nquads(),
                self.predicate.to_nquads(),
                self.object.to_nquads(),
                g.to_nquads()
            ),
            None => format!(
                "{} {} {} .",
                self.subject.to_nquads(),
                self.predicate.to_nquads(),
                self.object.to_nquads()
            ),
        }
    }
}

/// The handful of XSD datatype IRIs this crate emits or compares against.
pub mod xsd {
    /// `xsd:string`.
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// `xsd:integer`.
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// `xsd:dateTime`.
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_node_nquads_form() {
        assert_eq!(Term::iri("http://example/x").to_nquads(), "<http://example/x>");
    }

    #[test]
    fn blank_node_nquads_form() {
        assert_eq!(Term::blank("b0").to_nquads(), "_:b0");
    }

    #[test]
    fn typed_literal_nquads_form() {
        let t = Term::typed_literal("42", xsd::INTEGER);
        assert_eq!(t.to_nquads(), format!("\"42\"^^<{}>", xsd::INTEGER));
    }

    #[test]
    fn plain_literal_has_no_suffix() {
        assert_eq!(Term::plain_literal("hi").to_nquads(), "\"hi\"");
    }

    #[test]
    fn quad_line_includes_graph_when_present() {
        let q = Quad {
            subject: Term::blank("b0"),
            predicate: Term::iri("p"),
            object: Term::iri("o"),
            graph: Some(Term::iri("g")),
        };
        assert!(q.to_nquads_line().ends_with("<g> ."));
    }
}
