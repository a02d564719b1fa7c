// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blob store adapter: the contract over the content-addressed blob
//! layer, its Kubo-backed production implementation, and an in-memory
//! stand-in for tests.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod ipfs_http;
mod memory;
mod store;

pub use ipfs_http::IpfsHttpBlobStore;
pub use memory::MemoryBlobStore;
pub use store::{AddOpts, BlobStat, BlobStore};
