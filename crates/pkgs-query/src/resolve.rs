// SPDX-License-Identifier: MIT OR Apache-2.0
//! Query resolution: match a client pattern against the index's
//! signatures and build an [`Iterator`] that speaks the client's own
//! variable names.

use crate::index::GraphIndex;
use crate::iterator::{project_rows, QueryCursor};
use pkgs_error::{Error, Result};
use pkgs_model::{Quad, Term};

/// A client-submitted quad pattern: any position may be a
/// [`Term::Variable`]; non-variable positions are bound constants the
/// resolved iterator's rows must match.
pub type Pattern = Quad;

/// Resolve `pattern` against `index`'s signatures and return an iterator
/// over the matching quads, with its domain named after the pattern's own
/// variables (not the index's internal ones).
///
/// This index exposes exactly one signature — the fully variable
/// `?s ?p ?o ?g` pattern — so resolution always succeeds as long as the
/// client pattern is well-formed; there is no planner choice to make
/// among multiple signatures.
pub fn resolve(index: &GraphIndex, pattern: &Pattern) -> Result<QueryCursor> {
    let signature = index
        .signatures()
        .into_iter()
        .next()
        .ok_or_else(|| Error::Internal("index exposes no signatures".to_string()))?;
    let _ = signature; // only one signature exists; named for clarity at the call site

    let positions: [Option<String>; 4] = [
        variable_name(&pattern.subject),
        variable_name(&pattern.predicate),
        variable_name(&pattern.object),
        pattern.graph.as_ref().and_then(variable_name),
    ];

    let quads = index.snapshot();
    let filtered: Vec<Quad> = quads
        .into_iter()
        .filter(|q| {
            matches_slot(&pattern.subject, &q.subject)
                && matches_slot(&pattern.predicate, &q.predicate)
                && matches_slot(&pattern.object, &q.object)
                && matches_graph(pattern.graph.as_ref(), q.graph.as_ref())
        })
        .collect();

    let (domain, rows) = project_rows(&filtered, &positions);
    Ok(QueryCursor::new(domain, rows))
}

fn variable_name(term: &Term) -> Option<String> {
    match term {
        Term::Variable { value } => Some(value.clone()),
        _ => None,
    }
}

fn matches_slot(pattern_term: &Term, actual: &Term) -> bool {
    match pattern_term {
        Term::Variable { .. } => true,
        other => other == actual,
    }
}

fn matches_graph(pattern_graph: Option<&Term>, actual: Option<&Term>) -> bool {
    match pattern_graph {
        None => true,
        Some(Term::Variable { .. }) => true,
        Some(other) => Some(other) == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgs_model::{ContentId, Path, Resource};

    #[tokio::test]
    async fn resolves_fully_variable_pattern_to_every_quad() {
        use pkgs_store::Index as _;
        let index = GraphIndex::new();
        let file = Resource::File(pkgs_model::File {
            value_id: ContentId::of_bytes(b"x"),
            media_type: "text/plain".to_string(),
            extent: 1,
        });
        index.on_set(&Path::parse("/a").unwrap(), &file).await.unwrap();

        let pattern = Quad {
            subject: Term::Variable { value: "s".to_string() },
            predicate: Term::Variable { value: "p".to_string() },
            object: Term::Variable { value: "o".to_string() },
            graph: None,
        };
        let mut it = resolve(&index, &pattern).unwrap();
        assert!(it.next(None).is_some());
    }

    #[tokio::test]
    async fn bound_predicate_filters_rows() {
        use pkgs_store::Index as _;
        let index = GraphIndex::new();
        let file = Resource::File(pkgs_model::File {
            value_id: ContentId::of_bytes(b"x"),
            media_type: "text/plain".to_string(),
            extent: 1,
        });
        index.on_set(&Path::parse("/a").unwrap(), &file).await.unwrap();

        let pattern = Quad {
            subject: Term::Variable { value: "s".to_string() },
            predicate: Term::iri("http://purl.org/dc/terms/format"),
            object: Term::Variable { value: "o".to_string() },
            graph: None,
        };
        let mut it = resolve(&index, &pattern).unwrap();
        assert_eq!(it.domain(), &["s".to_string(), "o".to_string()]);
        assert!(it.next(None).is_some());
    }
}
