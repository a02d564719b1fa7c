// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `Iterator` contract: a stateful, seekable cursor over an
//! ordered solution set.

use pkgs_model::{Quad, Term};

/// A stateful cursor over the rows a resolved query produced. Each row
/// binds [`Iterator::domain`] to a term; `domain` is ordered to match
/// the client's original variable names, independent of how the
/// underlying index names them internally: the iterator is wrapped
/// so its domain speaks the client's own variable names.
pub struct QueryCursor {
    domain: Vec<String>,
    rows: Vec<Vec<Term>>,
    position: Option<usize>,
    /// Set by `seek`, consumed by the next `next()` call as the row
    /// index to land on directly instead of `position + 1`.
    pending_start: Option<usize>,
    /// Set by `seek`; once the cursor advances past a row whose prefix no
    /// longer matches, iteration stops early rather than silently
    /// resuming past the pinned boundary.
    pinned_prefix: Option<Vec<Term>>,
}

impl QueryCursor {
    /// Build an iterator directly from pre-projected rows. `rows` must
    /// already be sorted in the order `domain` should be walked.
    pub fn new(domain: Vec<String>, rows: Vec<Vec<Term>>) -> Self {
        QueryCursor { domain, rows, position: None, pending_start: None, pinned_prefix: None }
    }

    /// The ordered list of variables this iterator binds.
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    fn current_row(&self) -> Option<&[Term]> {
        self.position.and_then(|i| self.rows.get(i)).map(|row| row.as_slice())
    }

    fn matches_pinned_prefix(&self, row: &[Term]) -> bool {
        match &self.pinned_prefix {
            None => true,
            Some(prefix) => row.iter().zip(prefix.iter()).all(|(a, b)| a == b),
        }
    }

    /// Advance the cursor. `var`, if given, must name a domain variable;
    /// the cursor skips forward past every row sharing that variable's
    /// current value (a per-variable advance). With no `var`, it
    /// advances by exactly one row (the deepest/last-bound variable).
    /// Returns the suffix of bindings from the variable advanced past
    /// onward, or `None` once exhausted or past the pinned prefix.
    pub fn next(&mut self, var: Option<&str>) -> Option<Vec<Term>> {
        if let Some(start) = self.pending_start.take() {
            let row = self.rows.get(start)?;
            if !self.matches_pinned_prefix(row) {
                self.position = Some(self.rows.len());
                return None;
            }
            self.position = Some(start);
            return Some(row.clone());
        }
        let start_index = match var {
            Some(name) => {
                let col = self.domain.iter().position(|d| d == name)?;
                match self.current_row() {
                    None => 0,
                    Some(row) => {
                        let current_value = row.get(col)?.clone();
                        let mut i = self.position.unwrap() + 1;
                        while let Some(candidate) = self.rows.get(i) {
                            if candidate.get(col) != Some(&current_value) {
                                break;
                            }
                            i += 1;
                        }
                        i
                    }
                }
            }
            None => self.position.map(|p| p + 1).unwrap_or(0),
        };

        let row = self.rows.get(start_index)?;
        if !self.matches_pinned_prefix(row) {
            self.position = Some(self.rows.len());
            return None;
        }
        self.position = Some(start_index);

        let suffix_from = match var {
            Some(name) => self.domain.iter().position(|d| d == name).unwrap_or(0),
            None => 0,
        };
        Some(row[suffix_from..].to_vec())
    }

    /// Reposition to the lexicographically smallest solution whose
    /// domain prefix equals `prefix`. Subsequent `next` calls are
    /// constrained to rows sharing that prefix.
    pub fn seek(&mut self, prefix: Vec<Term>) {
        self.pinned_prefix = Some(prefix.clone());
        let found = self
            .rows
            .iter()
            .position(|row| row.len() >= prefix.len() && row[..prefix.len()] >= prefix[..]);
        match found {
            Some(i) => self.pending_start = Some(i),
            None => {
                self.pending_start = None;
                self.position = Some(self.rows.len());
            }
        }
    }

    /// The current row's binding for `var`, if the cursor is positioned
    /// on a row and `var` is in the domain.
    pub fn get(&self, var: &str) -> Option<Term> {
        let col = self.domain.iter().position(|d| d == var)?;
        self.current_row()?.get(col).cloned()
    }

    /// Release this iterator. A no-op beyond dropping it; kept as an
    /// explicit method so callers (the RPC session) have a single place
    /// to log/close regardless of drop timing.
    pub fn close(self) {}
}

/// Build the rows an [`Iterator`] walks from a flat quad set and the
/// query's variable bindings, given `domain`, the ordered list of
/// variable names occupying the query pattern's `subject`/`predicate`/
/// `object`/`graph` slots (a position holds `None` if that slot was a
/// bound constant in the query, not a variable).
pub fn project_rows(quads: &[Quad], positions: &[Option<String>; 4]) -> (Vec<String>, Vec<Vec<Term>>) {
    let domain: Vec<String> = positions.iter().filter_map(|p| p.clone()).collect();
    let rows = quads
        .iter()
        .map(|q| {
            let graph = q.graph.clone().unwrap_or(Term::DefaultGraph);
            let slots = [q.subject.clone(), q.predicate.clone(), q.object.clone(), graph];
            positions
                .iter()
                .zip(slots.into_iter())
                .filter_map(|(p, term)| p.as_ref().map(|_| term))
                .collect::<Vec<_>>()
        })
        .collect();
    (domain, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryCursor {
        QueryCursor::new(
            vec!["o".to_string()],
            vec![vec![Term::iri("a")], vec![Term::iri("b")], vec![Term::iri("c")]],
        )
    }

    #[test]
    fn next_walks_rows_in_order() {
        let mut it = sample();
        assert_eq!(it.next(None), Some(vec![Term::iri("a")]));
        assert_eq!(it.next(None), Some(vec![Term::iri("b")]));
        assert_eq!(it.next(None), Some(vec![Term::iri("c")]));
        assert_eq!(it.next(None), None);
    }

    #[test]
    fn seek_repositions_to_first_matching_prefix() {
        let mut it = sample();
        it.seek(vec![Term::iri("b")]);
        assert_eq!(it.next(None), Some(vec![Term::iri("b")]));
    }

    #[test]
    fn get_reads_current_binding() {
        let mut it = sample();
        it.next(None);
        assert_eq!(it.get("o"), Some(Term::iri("a")));
    }
}
