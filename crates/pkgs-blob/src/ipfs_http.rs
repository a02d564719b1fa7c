// SPDX-License-Identifier: MIT OR Apache-2.0
//! A [`BlobStore`] backed by a Kubo-compatible HTTP RPC API (`IPFS_HOST`).

use crate::store::{AddOpts, BlobStat, BlobStore};
use async_trait::async_trait;
use bytes::Bytes;
use pkgs_error::{Error, Result};
use pkgs_model::ContentId;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Client for a Kubo (or Kubo-API-compatible) node, reachable at
/// `IPFS_HOST` (default `http://localhost:5001`).
pub struct IpfsHttpBlobStore {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Deserialize)]
struct ObjectStatResponse {
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "CumulativeSize")]
    cumulative_size: u64,
}

#[derive(Deserialize)]
struct PatchResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsHttpBlobStore {
    /// Connect to the node at `base_url` (no trailing slash), e.g.
    /// `http://localhost:5001`.
    pub fn new(base_url: impl Into<String>) -> Self {
        IpfsHttpBlobStore {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(self.endpoint(path))
            .query(query)
            .send()
            .await
            .map_err(Error::upstream)?;
        if !resp.status().is_success() {
            return Err(Error::Upstream(
                format!("{} returned {}", path, resp.status()).into(),
            ));
        }
        Ok(resp)
    }
}

#[async_trait]
impl BlobStore for IpfsHttpBlobStore {
    async fn add(&self, bytes: Bytes, opts: AddOpts) -> Result<ContentId> {
        let part = Part::bytes(bytes.to_vec()).file_name("blob");
        let form = Form::new().part("file", part);
        let resp = self
            .client
            .post(self.endpoint("add"))
            .query(&[
                ("cid-version", opts.cid_version.to_string()),
                ("raw-leaves", opts.raw_leaves.to_string()),
                ("pin", opts.pin.to_string()),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(Error::upstream)?;
        if !resp.status().is_success() {
            return Err(Error::Upstream(format!("add returned {}", resp.status()).into()));
        }
        let parsed: AddResponse = resp.json().await.map_err(Error::upstream)?;
        debug!(hash = %parsed.hash, "blob added");
        ContentId::parse(&parsed.hash).map_err(|e| Error::Upstream(Box::new(e)))
    }

    async fn get(&self, id: ContentId) -> Result<Bytes> {
        let resp = self
            .post("block/get", &[("arg", id.to_base32())])
            .await?;
        resp.bytes().await.map_err(Error::upstream)
    }

    async fn stat(&self, id: ContentId) -> Result<BlobStat> {
        let resp = self
            .post("object/stat", &[("arg", id.to_base32())])
            .await?;
        let parsed: ObjectStatResponse = resp.json().await.map_err(Error::upstream)?;
        let cid = ContentId::parse(&parsed.hash).map_err(|e| Error::Upstream(Box::new(e)))?;
        Ok(BlobStat {
            cid,
            cumulative_size: parsed.cumulative_size,
        })
    }

    async fn add_link(&self, directory: ContentId, name: &str, target: ContentId) -> Result<ContentId> {
        let resp = self
            .post(
                "object/patch/add-link",
                &[
                    ("arg", directory.to_base32()),
                    ("arg", name.to_string()),
                    ("arg", target.to_base32()),
                ],
            )
            .await?;
        let parsed: PatchResponse = resp.json().await.map_err(Error::upstream)?;
        ContentId::parse(&parsed.hash).map_err(|e| Error::Upstream(Box::new(e)))
    }

    async fn rm_link(&self, directory: ContentId, name: &str) -> Result<ContentId> {
        let resp = self
            .post(
                "object/patch/rm-link",
                &[("arg", directory.to_base32()), ("arg", name.to_string())],
            )
            .await?;
        let parsed: PatchResponse = resp.json().await.map_err(Error::upstream)?;
        ContentId::parse(&parsed.hash).map_err(|e| Error::Upstream(Box::new(e)))
    }

    async fn pin_add(&self, id: ContentId) -> Result<()> {
        self.post("pin/add", &[("arg", id.to_base32())]).await?;
        Ok(())
    }

    async fn pin_rm(&self, id: ContentId, recursive: bool) -> Result<()> {
        self.post(
            "pin/rm",
            &[("arg", id.to_base32()), ("recursive", recursive.to_string())],
        )
        .await?;
        Ok(())
    }

    async fn pin_update(&self, old: ContentId, new: ContentId, unpin_old: bool) -> Result<()> {
        self.post(
            "pin/update",
            &[
                ("arg", old.to_base32()),
                ("arg", new.to_base32()),
                ("unpin", unpin_old.to_string()),
            ],
        )
        .await?;
        Ok(())
    }
}
