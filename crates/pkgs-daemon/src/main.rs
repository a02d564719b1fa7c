// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::{Context, Result};
use clap::Parser;
use pkgs_blob::IpfsHttpBlobStore;
use pkgs_daemon::{build_app, config::Args, ensure_root, AppState};
use pkgs_query::GraphIndex;
use pkgs_store::{Index, ResourceStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("pkgs=debug,pkgs_daemon=debug")
    } else {
        EnvFilter::new("pkgs=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let index = Arc::new(GraphIndex::new());
    let indices: Vec<Arc<dyn Index>> = vec![index.clone()];
    let store = ResourceStore::open_with_indices(&args.pkgs_path, indices)
        .with_context(|| format!("open resource store at {}", args.pkgs_path.display()))?;
    let blob: Arc<dyn pkgs_blob::BlobStore> = Arc::new(IpfsHttpBlobStore::new(args.ipfs_host.clone()));

    let state = Arc::new(AppState {
        store,
        blob,
        index: index.clone(),
        locks: Default::default(),
        root_uri: args.root_uri(),
    });

    ensure_root(&state).await.context("bootstrap root package")?;

    let http_listener = TcpListener::bind(&args.http_bind)
        .await
        .with_context(|| format!("bind HTTP {}", args.http_bind))?;
    let rpc_listener = TcpListener::bind(&args.rpc_bind)
        .await
        .with_context(|| format!("bind RPC {}", args.rpc_bind))?;

    info!(http = %args.http_bind, rpc = %args.rpc_bind, "pkgsd listening");

    let app = build_app(state);
    let http_server = axum::serve(http_listener, app);

    tokio::select! {
        result = http_server => result.context("HTTP server"),
        result = pkgs_query::serve(rpc_listener, index) => result.context("RPC server"),
    }
}
