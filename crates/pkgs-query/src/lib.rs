// SPDX-License-Identifier: MIT OR Apache-2.0
//! The query engine: an in-process graph index, query resolution
//! against its signatures, and the JSON-RPC session server exposing it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod index;
mod iterator;
mod resolve;
mod rpc;

pub use index::{GraphIndex, Signature};
pub use iterator::QueryCursor;
pub use resolve::{resolve, Pattern};
pub use rpc::serve;
