// SPDX-License-Identifier: MIT OR Apache-2.0
//! The resource model shared across the package repository server: paths,
//! content identifiers, and the Package/Assertion/File sum type.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod content_id;
mod path;
mod resource;
mod term;

pub use content_id::{empty_directory_bytes, empty_directory_id, ContentId, ParseContentIdError};
pub use path::{sidecar_name, InvalidPath, Path};
pub use resource::{Assertion, File, Package, Resource, ResourceTag};
pub use term::{xsd, Quad, Term};
