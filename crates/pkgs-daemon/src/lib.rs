// SPDX-License-Identifier: MIT OR Apache-2.0
//! The package repository daemon: an `axum` HTTP router over the LDP
//! method set, plus, via the `pkgsd` binary, a sibling JSON-RPC query
//! server sharing the same resource store and graph index.

#![deny(unsafe_code)]

mod bootstrap;
pub mod config;
mod error;
mod handlers;
mod lock;
mod middleware;
mod negotiate;

use axum::routing::any;
use axum::Router;
use lock::PathLocks;
use pkgs_blob::BlobStore;
use pkgs_query::GraphIndex;
use pkgs_store::ResourceStore;
use std::sync::Arc;

pub use bootstrap::ensure_root;
pub use config::Args;

/// Shared state every handler reaches through `axum`'s `State` extractor.
pub struct AppState {
    /// The resource tree.
    pub store: ResourceStore,
    /// The content-addressed blob layer.
    pub blob: Arc<dyn BlobStore>,
    /// The in-process graph index, also registered as a [`pkgs_store::Index`]
    /// on `store` so it stays in sync with every commit.
    pub index: Arc<GraphIndex>,
    /// Per-path exclusive locks held by mutating handlers.
    pub locks: PathLocks,
    /// This deployment's root package URI.
    pub root_uri: String,
}

/// Build the HTTP router: a catch-all route for every path plus the root,
/// a request-id middleware layer, and `tower-http`'s tracing layer.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(handlers::dispatch_root))
        .route("/{*path}", any(handlers::dispatch))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
