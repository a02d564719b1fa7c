// SPDX-License-Identifier: MIT OR Apache-2.0
//! The resource store: a transactional, ordered key-value map from
//! path to tagged resource, backed by `sled`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod index;
mod store;
mod txn;

pub use index::Index;
pub use store::ResourceStore;
pub use txn::{Change, Txn};
