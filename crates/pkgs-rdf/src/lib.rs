// SPDX-License-Identifier: MIT OR Apache-2.0
//! RDF projection, canonicalisation, and the fixed JSON-LD Package frame.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod canon;
mod jsonld;
mod project;
pub mod vocab;

pub use canon::{canonicalize_assertion, canonicalize_package_projection, parse_nquads, write_nquads, PACKAGE_SUBJECT_LABEL};
pub use jsonld::{from_fixed_frame, to_fixed_frame};
pub use project::{project_package, Member};
