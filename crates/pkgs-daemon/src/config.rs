// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line / environment configuration: `clap`-derived flags with
//! environment-variable fallback.

use clap::Parser;
use std::path::PathBuf;

/// `pkgsd` — a versioned, content-addressed package repository server.
#[derive(Parser, Debug)]
#[command(name = "pkgsd", version, about = "Package repository daemon")]
pub struct Args {
    /// HTTP bind address.
    #[arg(long, default_value = "127.0.0.1:8086")]
    pub http_bind: String,

    /// RPC (JSON-RPC query session) bind address.
    #[arg(long, default_value = "127.0.0.1:8087")]
    pub rpc_bind: String,

    /// Blob-layer (Kubo) HTTP RPC endpoint.
    #[arg(long, env = "IPFS_HOST", default_value = "http://localhost:5001")]
    pub ipfs_host: String,

    /// On-disk location for the resource store.
    #[arg(long, env = "PKGS_PATH", default_value = "/tmp/pkgs")]
    pub pkgs_path: PathBuf,

    /// The root package's stable external URI. When unset, a local
    /// placeholder is used rather than resolving the blob layer's real
    /// peer identity (see DESIGN.md).
    #[arg(long, env = "PKGS_ROOT")]
    pub pkgs_root: Option<String>,

    /// Enable verbose (debug-level) request/percolation logging.
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// The effective root `resource_uri`, falling back to a local
    /// placeholder when `PKGS_ROOT`/`--pkgs-root` is unset.
    pub fn root_uri(&self) -> String {
        self.pkgs_root
            .clone()
            .unwrap_or_else(|| "dweb:/ipns/local".to_string())
    }
}
