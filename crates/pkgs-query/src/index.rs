// SPDX-License-Identifier: MIT OR Apache-2.0
//! The in-process graph index: a `BTreeSet` of quads, kept in sync
//! with the resource store via the [`pkgs_store::Index`] hook.
//!
//! Each resource contributes a small, fixed set of quads describing
//! itself — not the full package projection [`pkgs_rdf`] computes for
//! content-addressing, which would require resolving every member on
//! every commit. This index exists to exercise the `Signature`/
//! `Iterator`/RPC contract end-to-end, not to serve as a full-text or
//! member-aware query surface.

use async_trait::async_trait;
use pkgs_model::{Path, Quad, Resource, Term};
use pkgs_rdf::vocab;
use std::collections::BTreeSet;
use std::sync::RwLock;

/// A declared quad pattern an index can answer queries over, together
/// with the ordered list of variables in `head` it natively binds.
#[derive(Debug, Clone)]
pub struct Signature {
    /// A human-readable name for diagnostics.
    pub name: &'static str,
    /// The pattern this signature answers: a quad whose variable
    /// positions are [`Term::Variable`].
    pub head: Quad,
    /// The variables in `head`, in the order this index iterates them.
    pub base: Vec<String>,
}

/// The graph index: every quad any committed resource contributes,
/// ordered `(subject, predicate, object, graph)`.
pub struct GraphIndex {
    quads: RwLock<BTreeSet<Quad>>,
    by_path: RwLock<std::collections::HashMap<Path, Vec<Quad>>>,
}

impl Default for GraphIndex {
    fn default() -> Self {
        GraphIndex {
            quads: RwLock::new(BTreeSet::new()),
            by_path: RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl GraphIndex {
    /// Construct an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The one signature this index exposes: the fully variable
    /// `?s ?p ?o ?g` pattern, natively bound in that order.
    pub fn signatures(&self) -> Vec<Signature> {
        vec![Signature {
            name: "spog",
            head: Quad {
                subject: Term::Variable { value: "s".to_string() },
                predicate: Term::Variable { value: "p".to_string() },
                object: Term::Variable { value: "o".to_string() },
                graph: Some(Term::Variable { value: "g".to_string() }),
            },
            base: vec!["s".to_string(), "p".to_string(), "o".to_string(), "g".to_string()],
        }]
    }

    /// All quads currently indexed, in index order. Used by query
    /// resolution to build an iterator.
    pub fn snapshot(&self) -> Vec<Quad> {
        self.quads.read().expect("graph index lock poisoned").iter().cloned().collect()
    }

    fn replace_path(&self, path: &Path, quads: Vec<Quad>) {
        let mut set = self.quads.write().expect("graph index lock poisoned");
        let mut by_path = self.by_path.write().expect("graph index lock poisoned");
        if let Some(old) = by_path.remove(path) {
            for q in &old {
                set.remove(q);
            }
        }
        for q in &quads {
            set.insert(q.clone());
        }
        if !quads.is_empty() {
            by_path.insert(path.clone(), quads);
        }
    }

    fn remove_path(&self, path: &Path) {
        let mut set = self.quads.write().expect("graph index lock poisoned");
        let mut by_path = self.by_path.write().expect("graph index lock poisoned");
        if let Some(old) = by_path.remove(path) {
            for q in &old {
                set.remove(q);
            }
        }
    }
}

/// The handful of quads each resource variant contributes to the index
/// on its own, without resolving members or fetching blob content.
fn quads_for_resource(resource: &Resource) -> Vec<Quad> {
    match resource {
        Resource::Package(pkg) => {
            let subject = Term::iri(format!("ul:{}#{}", pkg.id, pkg.subject_tag));
            vec![
                Quad::triple(subject.clone(), Term::iri(vocab::RDF_TYPE), Term::iri(vocab::UL_PACKAGE)),
                Quad::triple(subject, Term::iri(vocab::LDP_MEMBERSHIP_RESOURCE), Term::iri(&pkg.resource_uri)),
            ]
        }
        Resource::Assertion(assertion) => {
            let subject = Term::iri(vocab::ul_value(&assertion.value_id));
            vec![Quad::triple(subject, Term::iri(vocab::RDF_TYPE), Term::iri("ul:Assertion"))]
        }
        Resource::File(file) => {
            let subject = Term::iri(vocab::dweb_ipfs(&file.value_id));
            vec![
                Quad::triple(subject.clone(), Term::iri(vocab::RDF_TYPE), Term::iri("ul:File")),
                Quad::triple(subject, Term::iri(vocab::DCTERMS_FORMAT), Term::plain_literal(&file.media_type)),
            ]
        }
    }
}

#[async_trait]
impl pkgs_store::Index for GraphIndex {
    async fn on_set(&self, path: &Path, resource: &Resource) -> Result<(), String> {
        self.replace_path(path, quads_for_resource(resource));
        Ok(())
    }

    async fn on_delete(&self, path: &Path, _resource: &Resource) -> Result<(), String> {
        self.remove_path(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgs_model::{ContentId, File, Package};

    #[tokio::test]
    async fn on_set_then_on_delete_round_trips_to_empty() {
        use pkgs_store::Index as _;
        let index = GraphIndex::new();
        let path = Path::parse("/a").unwrap();
        let file = Resource::File(File {
            value_id: ContentId::of_bytes(b"x"),
            media_type: "text/plain".to_string(),
            extent: 1,
        });
        index.on_set(&path, &file).await.unwrap();
        assert!(!index.snapshot().is_empty());
        index.on_delete(&path, &file).await.unwrap();
        assert!(index.snapshot().is_empty());
    }

    #[tokio::test]
    async fn package_contributes_type_and_membership_quads() {
        use pkgs_store::Index as _;
        let index = GraphIndex::new();
        let path = Path::root();
        let pkg = Package::new_empty(
            "dweb:/ipns/peer".to_string(),
            "c14n0".to_string(),
            ContentId::of_bytes(b"id"),
            ContentId::of_bytes(b"value"),
            0,
            chrono::Utc::now(),
        );
        index.on_set(&path, &Resource::Package(pkg)).await.unwrap();
        assert_eq!(index.snapshot().len(), 2);
    }
}
