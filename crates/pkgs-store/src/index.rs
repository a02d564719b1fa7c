// SPDX-License-Identifier: MIT OR Apache-2.0
//! The index fan-out hook.

use async_trait::async_trait;
use pkgs_model::{Path, Resource};

/// A hook invoked by the resource store after every successful commit,
/// once per changed path. Implementations (e.g. `pkgs-query`'s graph
/// index) must not fail the request on error: the store logs failures
/// and moves on.
#[async_trait]
pub trait Index: Send + Sync {
    /// A resource was created or replaced at `path`.
    async fn on_set(&self, path: &Path, resource: &Resource) -> Result<(), String>;

    /// The resource previously at `path` was removed.
    async fn on_delete(&self, path: &Path, resource: &Resource) -> Result<(), String>;
}
