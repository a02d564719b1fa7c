// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy for the package repository server.
//!
//! Every fallible operation in this workspace returns [`Error`]. Each
//! variant maps to exactly one HTTP status code. The mapping itself
//! lives in `pkgs-daemon` since only the HTTP layer knows
//! about status codes, but the kinds are defined here so every crate can
//! construct them without depending on the daemon.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;

/// The result type used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// A single error raised anywhere in the package tree, store, blob
/// adapter, or RDF projection layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path has no resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// The parent is missing or isn't a Package, a name collides with an
    /// existing member or sidecar, or a mutation targets the root in a way
    /// that is structurally impossible (e.g. `PUT /`).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An operation that is permanently disallowed on the target, such as
    /// deleting the root package.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An `If-Match`/`If-None-Match` precondition did not hold.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Content negotiation could not produce an acceptable representation.
    #[error("not acceptable: {0}")]
    NotAcceptable(String),

    /// The request body's declared media type is not one this resource
    /// kind accepts.
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// A request was well-formed JSON/RDF but semantically unprocessable,
    /// such as a PUT with no (or an ambiguous) `Link: rel="type"`.
    #[error("unprocessable: {0}")]
    Unprocessable(String),

    /// The blob layer (or, in tests, its in-memory stand-in) failed.
    #[error("upstream blob layer error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Anything else — a bug, an invariant violation, an unreachable match
    /// arm. Never expected to surface under normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(path: impl fmt::Display) -> Self {
        Self::NotFound(path.to_string())
    }

    /// Shorthand for [`Error::Conflict`].
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Shorthand for [`Error::Internal`], for invariant violations that
    /// should never be observable from a correctly functioning server.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Internal(format!("invariant violated: {}", msg.into()))
    }

    /// Wrap an upstream blob-layer failure.
    pub fn upstream(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Upstream(Box::new(err))
    }

    /// A short machine-readable tag for structured logging, independent of
    /// the HTTP status code it maps to.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Forbidden(_) => "forbidden",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::NotAcceptable(_) => "not_acceptable",
            Self::UnsupportedMedia(_) => "unsupported_media",
            Self::Unprocessable(_) => "unprocessable",
            Self::Upstream(_) => "upstream",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_per_variant() {
        assert_eq!(Error::not_found("/a").kind(), "not_found");
        assert_eq!(Error::conflict("dup").kind(), "conflict");
        assert_eq!(Error::Forbidden("root".into()).kind(), "forbidden");
    }

    #[test]
    fn invariant_prefixes_message() {
        let err = Error::invariant("parent missing");
        assert!(err.to_string().contains("invariant violated"));
    }
}
