// SPDX-License-Identifier: MIT OR Apache-2.0
//! Creates the root package on first startup, if it does not already
//! exist, and pins it alongside the empty directory it projects from.

use crate::AppState;
use chrono::Utc;
use pkgs_blob::AddOpts;
use pkgs_error::Result;
use pkgs_model::{empty_directory_id, Package, Path, Resource};
use pkgs_rdf::{canonicalize_package_projection, project_package};
use tracing::info;

/// Idempotent: if `/` already has a resource, this is a no-op.
pub async fn ensure_root(state: &AppState) -> Result<()> {
    let read = state.store.begin_read();
    if read.exists(&Path::root())? {
        return Ok(());
    }
    drop(read);

    let empty = empty_directory_id();
    let now = Utc::now();
    let mut pkg = Package::new_empty(state.root_uri.clone(), "c14n0".to_string(), empty, empty, 0, now);

    let quads = project_package(&pkg, &[]);
    let (nquads, subject_tag) = canonicalize_package_projection(&quads)?;
    let id = state.blob.add(bytes::Bytes::from(nquads), AddOpts { pin: true, ..Default::default() }).await?;
    pkg.id = id;
    pkg.subject_tag = subject_tag;

    state.blob.pin_add(empty).await?;
    state.blob.pin_add(id).await?;

    let mut txn = state.store.begin_write();
    txn.set(&Path::root(), Resource::Package(pkg))?;
    state.store.commit(txn).await?;

    info!("root package bootstrapped");
    Ok(())
}
