// SPDX-License-Identifier: MIT OR Apache-2.0
//! The percolator: re-canonicalises every ancestor package from a
//! mutated leaf up to the root, within one write transaction.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use bytes::Bytes;
use chrono::{DateTime, Utc};
use pkgs_blob::{AddOpts, BlobStore};
use pkgs_error::{Error, Result};
use pkgs_model::{empty_directory_id, sidecar_name, ContentId, Package, Path, Resource};
use pkgs_rdf::{canonicalize_package_projection, project_package, Member};
use pkgs_store::Txn;
use tracing::debug;

/// The loop state carried between percolation steps.
pub struct PercolationState {
    /// The path of the package currently being updated.
    pub path: Path,
    /// That package, with its mutated child link already reflected.
    pub pkg: Package,
    /// `pkg.id` before this call.
    pub old_id: ContentId,
    /// `pkg.value_id` before this call.
    pub old_value_id: ContentId,
    /// The directory object produced by the triggering mutation, with the
    /// mutated child link already added/removed. `None` for a
    /// metadata-only mutation (`old_value_id` is reused unchanged).
    pub new_value_id: Option<ContentId>,
}

/// Run the percolation loop to completion against `txn`, which must
/// already contain every write the triggering operation made below
/// `state.path`. Returns once the root has been re-written and its pins
/// swapped.
pub async fn percolate(
    blob: &dyn BlobStore,
    txn: &mut Txn,
    modified_at: DateTime<Utc>,
    mut state: PercolationState,
) -> Result<()> {
    loop {
        // Step 1.
        if let Some(new_value_id) = state.new_value_id {
            let stat = blob.stat(new_value_id).await?;
            state.pkg.value_extent = stat.cumulative_size;
            state.pkg.value_id = new_value_id;
        }

        // Step 2.
        state.pkg.modified = modified_at;
        state.pkg.revision_of_id = Some(state.pkg.id);
        state.pkg.revision_of_subject = Some(state.pkg.subject_tag.clone());

        // Step 3: re-project, canonicalise, upload (unpinned).
        let resolved = resolve_members(txn, &state.path, &state.pkg)?;
        let members: Vec<Member<'_>> = resolved.iter().map(|(name, resource)| Member { name, resource }).collect();
        let quads = project_package(&state.pkg, &members);
        let (nquads, subject_tag) = canonicalize_package_projection(&quads)?;
        let new_id = blob.add(Bytes::from(nquads), AddOpts { pin: false, ..Default::default() }).await?;
        state.pkg.id = new_id;
        state.pkg.subject_tag = subject_tag;

        debug!(path = %state.path, id = %state.pkg.id, "percolated package");

        // Step 4.
        txn.set(&state.path, Resource::Package(state.pkg.clone()))?;

        // Step 5: root reached.
        if state.path.is_root() {
            let empty_dir = empty_directory_id();
            blob.pin_update(state.old_value_id, state.pkg.value_id, state.old_value_id != empty_dir).await?;
            blob.pin_update(state.old_id, state.pkg.id, true).await?;
            return Ok(());
        }

        // Step 6.
        let parent_path = state
            .path
            .parent()
            .ok_or_else(|| Error::Internal("non-root path has no parent".to_string()))?;
        let name = state
            .path
            .name()
            .ok_or_else(|| Error::Internal("non-root path has no name".to_string()))?
            .to_string();
        let parent = txn
            .get(&parent_path)?
            .into_package()
            .ok_or_else(|| Error::Internal(format!("parent of {} is not a package", state.path)))?;

        // Step 7.
        let parent_old_id = parent.id;
        let parent_old_value_id = parent.value_id;

        // Step 8.
        let with_child = blob.add_link(parent_old_value_id, &name, state.pkg.value_id).await?;
        let parent_new_value_id = blob.add_link(with_child, &sidecar_name(&name), state.pkg.id).await?;

        // Step 9.
        state = PercolationState {
            path: parent_path,
            pkg: parent,
            old_id: parent_old_id,
            old_value_id: parent_old_value_id,
            new_value_id: Some(parent_new_value_id),
        };
    }
}

fn resolve_members(txn: &Txn, path: &Path, pkg: &Package) -> Result<Vec<(String, Resource)>> {
    let mut members = Vec::with_capacity(pkg.member.len());
    for name in &pkg.member {
        let child_path = path
            .child(name)
            .map_err(|e| Error::Internal(format!("stored member name {name} is not a valid path segment: {e}")))?;
        members.push((name.clone(), txn.get(&child_path)?));
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgs_blob::MemoryBlobStore;
    use pkgs_model::{empty_directory_id, ResourceTag};
    use pkgs_store::ResourceStore;

    fn new_root() -> Package {
        Package::new_empty(
            "dweb:/ipns/test/".to_string(),
            "c14n0".to_string(),
            ContentId::of_bytes(b"placeholder-root-id"),
            empty_directory_id(),
            0,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn percolating_root_updates_pins_and_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::open(dir.path()).unwrap();
        let blob = MemoryBlobStore::new();
        let root = new_root();
        let old_id = root.id;
        let old_value_id = root.value_id;

        let mut txn = store.begin_write();
        txn.set(&Path::root(), Resource::Package(root.clone())).unwrap();

        let state = PercolationState {
            path: Path::root(),
            pkg: root,
            old_id,
            old_value_id,
            new_value_id: None,
        };
        percolate(&blob, &mut txn, Utc::now(), state).await.unwrap();
        store.commit(txn).await.unwrap();

        let txn = store.begin_read();
        let resource = txn.get(&Path::root()).unwrap();
        assert_eq!(resource.tag(), ResourceTag::Package);
        let pkg = resource.into_package().unwrap();
        assert_ne!(pkg.id, old_id);
    }
}
