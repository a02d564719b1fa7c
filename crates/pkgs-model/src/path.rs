// SPDX-License-Identifier: MIT OR Apache-2.0
//! UNIX-style absolute paths over the package tree.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9.\-]+$").unwrap());

/// A validated, absolute, `/`-delimited path into the package tree.
///
/// Every segment matches `[A-Za-z0-9.\-]+`; the root path `/` has zero
/// segments. Ordering is lexicographic on the segment list, which matches
/// byte-order on the canonical string form and is what the resource
/// store's range scans rely on.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(String);

/// Error returned when a string is not a valid [`Path`].
#[derive(Debug, thiserror::Error)]
pub enum InvalidPath {
    /// The path did not begin with `/`.
    #[error("path {0:?} is not absolute")]
    NotAbsolute(String),
    /// A segment was empty (e.g. a double slash) or failed the character
    /// class check.
    #[error("path {path:?} has invalid segment {segment:?}")]
    BadSegment {
        /// The offending path.
        path: String,
        /// The offending segment.
        segment: String,
    },
}

impl Path {
    /// The root path, `/`.
    pub fn root() -> Self {
        Path("/".to_string())
    }

    /// Parse and validate a path string.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidPath> {
        let s = s.into();
        if !s.starts_with('/') {
            return Err(InvalidPath::NotAbsolute(s));
        }
        if s == "/" {
            return Ok(Path(s));
        }
        for segment in s.trim_start_matches('/').split('/') {
            if !SEGMENT.is_match(segment) {
                return Err(InvalidPath::BadSegment {
                    path: s.clone(),
                    segment: segment.to_string(),
                });
            }
        }
        // Normalize away a trailing slash on non-root paths (`/a/` == `/a`);
        // the HTTP layer treats a trailing slash on POST specially, but
        // the stored path key never carries one.
        let normalized = s.trim_end_matches('/').to_string();
        Ok(Path(normalized))
    }

    /// Is this the root path?
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The path's segments, in order, empty for the root.
    pub fn segments(&self) -> Vec<&str> {
        if self.is_root() {
            Vec::new()
        } else {
            self.0.trim_start_matches('/').split('/').collect()
        }
    }

    /// The final path segment ("basename"), `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments().last().copied()
    }

    /// The parent path, `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        let segs = self.segments();
        if segs.len() == 1 {
            Some(Path::root())
        } else {
            Some(Path(format!("/{}", segs[..segs.len() - 1].join("/"))))
        }
    }

    /// Build the child path `self/name`. `self` must not be validated
    /// again by the caller — `name` is checked here.
    pub fn child(&self, name: &str) -> Result<Path, InvalidPath> {
        if !SEGMENT.is_match(name) {
            return Err(InvalidPath::BadSegment {
                path: self.0.clone(),
                segment: name.to_string(),
            });
        }
        let joined = if self.is_root() {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.0)
        };
        Ok(Path(joined))
    }

    /// The path as a plain `&str`, suitable as a resource-store key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.0)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Does `name` collide with an existing package member's auxiliary
/// `.nt` sidecar, or is `name` itself a `.nt` name that collides with an
/// existing member? Implements the stricter uniqueness rule: a member
/// name and its own `.nt` sidecar name occupy the same namespace.
pub fn sidecar_name(member: &str) -> String {
    format!("{member}.nt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_segments() {
        let root = Path::root();
        assert!(root.is_root());
        assert!(root.segments().is_empty());
        assert_eq!(root.name(), None);
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn parses_nested_path() {
        let p = Path::parse("/a/b/c.nt").unwrap();
        assert_eq!(p.segments(), vec!["a", "b", "c.nt"]);
        assert_eq!(p.name(), Some("c.nt"));
        assert_eq!(p.parent().unwrap().as_str(), "/a/b");
    }

    #[test]
    fn rejects_relative_path() {
        assert!(Path::parse("a/b").is_err());
    }

    #[test]
    fn rejects_bad_segment_characters() {
        assert!(Path::parse("/a/b c").is_err());
        assert!(Path::parse("/a//b").is_err());
    }

    #[test]
    fn child_builds_nested_path() {
        let root = Path::root();
        let a = root.child("a").unwrap();
        assert_eq!(a.as_str(), "/a");
        let ab = a.child("b").unwrap();
        assert_eq!(ab.as_str(), "/a/b");
        assert_eq!(ab.parent().unwrap(), a);
    }

    #[test]
    fn sidecar_name_appends_nt() {
        assert_eq!(sidecar_name("child"), "child.nt");
    }
}
