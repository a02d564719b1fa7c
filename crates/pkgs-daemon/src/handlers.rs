// SPDX-License-Identifier: MIT OR Apache-2.0
//! The LDP method handlers: one function per verb, dispatched by
//! [`dispatch`]/[`dispatch_root`] from a catch-all route that reads
//! `req.method()` itself so the non-standard `MKCOL` verb can be handled
//! alongside the standard ones.

use crate::error::ApiError;
use crate::negotiate::{self, LinkType, LD_JSON, N_QUADS, TEXT_HTML};
use crate::AppState;
use axum::body::to_bytes;
use axum::extract::{Path as AxPath, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::Utc;
use pkgs_blob::AddOpts;
use pkgs_error::{Error, Result};
use pkgs_model::{empty_directory_id, sidecar_name, Assertion, ContentId, File, Package, Path, Quad, Resource, Term};
use pkgs_percolate::{percolate, PercolationState};
use pkgs_rdf::{canonicalize_assertion, canonicalize_package_projection, from_fixed_frame, parse_nquads, project_package, to_fixed_frame, vocab};
use std::sync::Arc;
use tracing::info;

const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Entry point for the root path (`/`), which the wildcard route below
/// cannot itself match.
pub async fn dispatch_root(State(state): State<Arc<AppState>>, req: Request) -> Response {
    route(state, Path::root(), true, req).await
}

/// Entry point for every other path, captured by axum's `{*path}`
/// wildcard. The raw captured string (not the normalised [`Path`]) still
/// carries a trailing slash, which `POST`'s container-vs-member
/// disambiguation depends on.
pub async fn dispatch(State(state): State<Arc<AppState>>, AxPath(raw): AxPath<String>, req: Request) -> Response {
    let trailing_slash = raw.ends_with('/');
    let full = format!("/{raw}");
    match Path::parse(full) {
        Ok(path) => route(state, path, trailing_slash, req).await,
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn route(state: Arc<AppState>, path: Path, trailing_slash: bool, req: Request) -> Response {
    let method = req.method().clone();
    let headers = req.headers().clone();
    let body = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let result = match method.as_str() {
        "GET" => get(&state, &path, &headers, false).await,
        "HEAD" => get(&state, &path, &headers, true).await,
        "PUT" => put(&state, &path, &headers, body).await,
        "POST" => post(&state, &path, trailing_slash, &headers, body).await,
        "DELETE" => delete(&state, &path, &headers).await,
        "MKCOL" => mkcol(&state, &path, &headers).await,
        "PATCH" => patch(&state, &path, &headers, body).await,
        other => return (StatusCode::METHOD_NOT_ALLOWED, format!("unsupported method {other}")).into_response(),
    };

    match result {
        Ok(response) => response,
        Err(e) => ApiError(e).into_response(),
    }
}

// ---------------------------------------------------------------------
// Shared header/body helpers
// ---------------------------------------------------------------------

fn type_links(resource: &Resource) -> Vec<HeaderValue> {
    let specific = match resource {
        Resource::Package(_) => negotiate::LDP_DIRECT_CONTAINER,
        Resource::Assertion(_) => negotiate::LDP_RDF_SOURCE,
        Resource::File(_) => negotiate::LDP_NON_RDF_SOURCE,
    };
    let mut links = vec![
        HeaderValue::from_str(&format!("<{}#Resource>; rel=\"type\"", negotiate::LDP_RESOURCE)).unwrap(),
        HeaderValue::from_str(&format!("<{specific}>; rel=\"type\"")).unwrap(),
    ];
    if let Resource::Package(_) = resource {
        links.push(HeaderValue::from_str(&format!("<{}>; rel=\"self\"", resource.uri())).unwrap());
    }
    links
}

fn base_headers(resource: &Resource) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("etag", HeaderValue::from_str(&negotiate::quote_etag(&resource.etag())).unwrap());
    for link in type_links(resource) {
        headers.append("link", link);
    }
    headers
}

fn check_if_match(headers: &HeaderMap, current: &str) -> Result<()> {
    let value = headers
        .get("if-match")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::PreconditionFailed("If-Match required".to_string()))?;
    if negotiate::if_match_ok(value, current) {
        Ok(())
    } else {
        Err(Error::PreconditionFailed(format!("If-Match {value} does not match {current}")))
    }
}

/// Parse a request body carrying an RDF graph, by declared content type.
fn parse_body_quads(content_type: &str, body: &[u8]) -> Result<Vec<Quad>> {
    let text = std::str::from_utf8(body).map_err(|e| Error::Unprocessable(e.to_string()))?;
    match content_type.split(';').next().unwrap_or("").trim() {
        N_QUADS => parse_nquads(text),
        LD_JSON => {
            let value: serde_json::Value = serde_json::from_str(text).map_err(|e| Error::Unprocessable(e.to_string()))?;
            from_fixed_frame(&value)
        }
        other => Err(Error::UnsupportedMedia(format!("unsupported RDF content type {other}"))),
    }
}

/// Pull `dcterms:description`/`dcterms:subject` values out of a quad set
/// regardless of the subject they're attached to — both the PATCH body
/// and a `DirectContainer` PUT's description carry them the same way.
fn extract_description_and_keywords(quads: &[Quad]) -> (Option<String>, Vec<String>) {
    let mut description = None;
    let mut keywords = Vec::new();
    for quad in quads {
        let predicate = match &quad.predicate {
            Term::NamedNode { value } => value.as_str(),
            _ => continue,
        };
        let Term::Literal { value, .. } = &quad.object else { continue };
        match predicate {
            vocab::DCTERMS_DESCRIPTION => description = Some(value.clone()),
            vocab::DCTERMS_SUBJECT => keywords.push(value.clone()),
            _ => {}
        }
    }
    (description, keywords)
}

fn package_id(resource: &Resource) -> Option<ContentId> {
    resource.as_package().map(|p| p.id)
}

/// Build a brand-new, empty package (shared by `MKCOL` and a
/// `DirectContainer` `PUT`), with an optional description/keywords frame
/// applied before the first canonicalisation.
async fn build_empty_package(
    state: &AppState,
    resource_uri: String,
    description: Option<String>,
    keywords: Vec<String>,
) -> Result<Package> {
    let empty = empty_directory_id();
    let mut pkg = Package::new_empty(resource_uri, "c14n0".to_string(), empty, empty, 0, Utc::now());
    pkg.description = description;
    if !keywords.is_empty() {
        pkg.keywords = Some(keywords);
    }
    let quads = project_package(&pkg, &[]);
    let (nquads, subject_tag) = canonicalize_package_projection(&quads)?;
    let id = state.blob.add(Bytes::from(nquads), AddOpts { pin: false, ..Default::default() }).await?;
    pkg.id = id;
    pkg.subject_tag = subject_tag;
    Ok(pkg)
}

/// Link `child` into `parent`'s value directory under `name`, returning
/// the resulting directory id (including the `name.nt` sidecar link when
/// `child` is itself a Package).
async fn link_child(state: &AppState, parent_value_id: ContentId, name: &str, child: &Resource) -> Result<ContentId> {
    let with_child = state.blob.add_link(parent_value_id, name, child.value_id()).await?;
    match package_id(child) {
        Some(child_id) => Ok(state.blob.add_link(with_child, &sidecar_name(name), child_id).await?),
        None => Ok(with_child),
    }
}

async fn percolate_from_parent(
    state: &AppState,
    parent_path: Path,
    parent: Package,
    new_value_id: ContentId,
    txn: &mut pkgs_store::Txn,
) -> Result<()> {
    let old_id = parent.id;
    let old_value_id = parent.value_id;
    let state_in = PercolationState { path: parent_path, pkg: parent, old_id, old_value_id, new_value_id: Some(new_value_id) };
    percolate(state.blob.as_ref(), txn, Utc::now(), state_in).await
}

// ---------------------------------------------------------------------
// GET / HEAD
// ---------------------------------------------------------------------

async fn get(state: &AppState, path: &Path, headers: &HeaderMap, head_only: bool) -> Result<Response> {
    let txn = state.store.begin_read();
    let resource = txn.get(path)?;
    let etag = resource.etag();

    if let Some(inm) = headers.get("if-none-match").and_then(|v| v.to_str().ok()) {
        if negotiate::if_none_match_hit(inm, &etag) {
            let mut resp = StatusCode::NOT_MODIFIED.into_response();
            *resp.headers_mut() = base_headers(&resource);
            return Ok(resp);
        }
    }

    if head_only {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        *resp.headers_mut() = base_headers(&resource);
        return Ok(resp);
    }

    let mut response_headers = base_headers(&resource);
    let body = match &resource {
        Resource::File(file) => {
            let bytes = state.blob.get(file.value_id).await?;
            response_headers.insert("content-type", HeaderValue::from_str(&file.media_type).unwrap());
            bytes
        }
        Resource::Package(pkg) => {
            let format = negotiate::negotiate(headers.get("accept"), &[N_QUADS, LD_JSON, TEXT_HTML])
                .ok_or_else(|| Error::NotAcceptable("no acceptable representation for package".to_string()))?;
            let nquads = state.blob.get(pkg.id).await?;
            match format {
                N_QUADS => {
                    response_headers.insert("content-type", HeaderValue::from_static(N_QUADS));
                    nquads
                }
                LD_JSON => {
                    let text = String::from_utf8_lossy(&nquads).to_string();
                    let quads = parse_nquads(&text)?;
                    let frame = to_fixed_frame(&resource.uri(), &quads);
                    response_headers.insert("content-type", HeaderValue::from_static(LD_JSON));
                    Bytes::from(serde_json::to_vec(&frame).map_err(|e| Error::Internal(e.to_string()))?)
                }
                _ => {
                    response_headers.insert("content-type", HeaderValue::from_static(TEXT_HTML));
                    Bytes::from(render_package_html(pkg))
                }
            }
        }
        Resource::Assertion(_) => {
            let format = negotiate::negotiate(headers.get("accept"), &[N_QUADS, LD_JSON])
                .ok_or_else(|| Error::NotAcceptable("no acceptable representation for assertion".to_string()))?;
            let value_id = resource.value_id();
            let nquads = state.blob.get(value_id).await?;
            if format == N_QUADS {
                response_headers.insert("content-type", HeaderValue::from_static(N_QUADS));
                nquads
            } else {
                let text = String::from_utf8_lossy(&nquads).to_string();
                let quads = parse_nquads(&text)?;
                response_headers.insert("content-type", HeaderValue::from_static(LD_JSON));
                Bytes::from(serde_json::to_vec(&quads).map_err(|e| Error::Internal(e.to_string()))?)
            }
        }
    };

    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().extend(response_headers);
    Ok(resp)
}

fn render_package_html(pkg: &Package) -> String {
    let members = pkg.member.join(", ");
    format!(
        "<!doctype html><html><body><h1>{}</h1><p>members: {}</p></body></html>",
        pkg.resource_uri, members
    )
}

// ---------------------------------------------------------------------
// PUT
// ---------------------------------------------------------------------

async fn put(state: &AppState, path: &Path, headers: &HeaderMap, body: Bytes) -> Result<Response> {
    if path.is_root() {
        return Ok((StatusCode::BAD_REQUEST, "PUT / is not supported").into_response());
    }
    let link_type = negotiate::parse_link_type(headers)?;
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Unprocessable("missing Content-Type".to_string()))?
        .to_string();

    let name = path.name().expect("non-root path has a name").to_string();
    let parent_path = path.parent().expect("non-root path has a parent");
    let _guard = state.locks.acquire(path).await;

    let mut txn = state.store.begin_write();
    let existing = match txn.get(path) {
        Ok(resource) => Some(resource),
        Err(Error::NotFound(_)) => None,
        Err(e) => return Err(e),
    };
    if let Some(resource) = &existing {
        check_if_match(headers, &resource.etag())?;
        if matches!(link_type, LinkType::DirectContainer) {
            return Err(Error::Conflict("replacing an existing package via PUT is not supported; use PATCH or MKCOL".to_string()));
        }
    }

    let mut parent = txn
        .get(&parent_path)?
        .into_package()
        .ok_or_else(|| Error::Conflict(format!("{parent_path} is not a package")))?;
    if existing.is_none() && parent.collides_with(&name) {
        return Err(Error::Conflict(format!("{name} collides with an existing member")));
    }

    let resource_uri = format!("{}/{}", parent.resource_uri, name);
    let child = match link_type {
        LinkType::NonRdfSource => {
            let value_id = state.blob.add(body.clone(), AddOpts { pin: false, ..Default::default() }).await?;
            Resource::File(File { value_id, media_type: content_type, extent: body.len() as u64 })
        }
        LinkType::RdfSource => {
            let quads = parse_body_quads(&content_type, &body)?;
            let nquads = canonicalize_assertion(&quads)?;
            let value_id = state.blob.add(Bytes::from(nquads), AddOpts { pin: false, ..Default::default() }).await?;
            Resource::Assertion(Assertion { value_id })
        }
        LinkType::DirectContainer => {
            let quads = parse_body_quads(&content_type, &body).unwrap_or_default();
            let (description, keywords) = extract_description_and_keywords(&quads);
            Resource::Package(build_empty_package(state, resource_uri, description, keywords).await?)
        }
    };
    txn.set(path, child.clone())?;

    if existing.is_none() {
        parent.member.push(name.clone());
    }
    let new_value_id = link_child(state, parent.value_id, &name, &child).await?;
    percolate_from_parent(state, parent_path, parent, new_value_id, &mut txn).await?;
    state.store.commit(txn).await?;

    info!(path = %path, created = existing.is_none(), "put");
    let status = if existing.is_none() { StatusCode::CREATED } else { StatusCode::OK };
    let mut resp = status.into_response();
    *resp.headers_mut() = base_headers(&child);
    Ok(resp)
}

// ---------------------------------------------------------------------
// POST
// ---------------------------------------------------------------------

async fn post(state: &AppState, path: &Path, trailing_slash: bool, headers: &HeaderMap, body: Bytes) -> Result<Response> {
    let txn = state.store.begin_read();
    let target = txn.get(path);
    drop(txn);

    if !trailing_slash {
        return match target {
            Ok(Resource::Package(_)) => Err(Error::not_found(format!("{path}/ (POST requires a trailing slash)"))),
            _ => Ok((StatusCode::METHOD_NOT_ALLOWED, "resource does not support POST").into_response()),
        };
    }

    let _guard = state.locks.acquire(path).await;
    let mut txn = state.store.begin_write();
    let mut container = txn.get(path)?.into_package().ok_or_else(|| Error::Conflict(format!("{path} is not a package")))?;
    check_if_match(headers, &container.id.to_base32())?;

    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok()).unwrap_or("application/octet-stream");
    let is_rdf = content_type.starts_with(N_QUADS) || content_type.starts_with(LD_JSON);

    let child = if is_rdf {
        let quads = parse_body_quads(content_type, &body)?;
        let nquads = canonicalize_assertion(&quads)?;
        let value_id = state.blob.add(Bytes::from(nquads), AddOpts { pin: false, ..Default::default() }).await?;
        Resource::Assertion(Assertion { value_id })
    } else {
        let value_id = state.blob.add(body.clone(), AddOpts { pin: false, ..Default::default() }).await?;
        Resource::File(File { value_id, media_type: content_type.to_string(), extent: body.len() as u64 })
    };

    let name = content_disposition_filename(headers).unwrap_or_else(|| child.value_id().to_base32());
    if container.collides_with(&name) {
        return Err(Error::Conflict(format!("{name} collides with an existing member")));
    }

    let child_path = path.child(&name).map_err(|e| Error::Conflict(e.to_string()))?;
    txn.set(&child_path, child.clone())?;
    container.member.push(name.clone());

    let new_value_id = link_child(state, container.value_id, &name, &child).await?;
    percolate_from_parent(state, path.clone(), container, new_value_id, &mut txn).await?;
    state.store.commit(txn).await?;

    info!(path = %path, member = %name, "post");
    let updated = state.store.begin_read().get(path)?;
    let format = negotiate::negotiate(headers.get("accept"), &[N_QUADS, LD_JSON]).unwrap_or(N_QUADS);
    let pkg = updated.as_package().expect("container stays a package");
    let nquads = state.blob.get(pkg.id).await?;
    let response_body = if format == N_QUADS {
        nquads
    } else {
        let text = String::from_utf8_lossy(&nquads).to_string();
        let quads = parse_nquads(&text)?;
        let frame = to_fixed_frame(&updated.uri(), &quads);
        Bytes::from(serde_json::to_vec(&frame).map_err(|e| Error::Internal(e.to_string()))?)
    };

    let mut resp = (StatusCode::OK, response_body).into_response();
    *resp.headers_mut() = base_headers(&updated);
    Ok(resp)
}

fn content_disposition_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("content-disposition")?.to_str().ok()?;
    for part in value.split(';') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("filename=") {
            return Some(rest.trim_matches('"').to_string());
        }
    }
    None
}

// ---------------------------------------------------------------------
// DELETE
// ---------------------------------------------------------------------

async fn delete(state: &AppState, path: &Path, headers: &HeaderMap) -> Result<Response> {
    if path.is_root() {
        return Err(Error::Forbidden("the root package cannot be deleted".to_string()));
    }
    let _guard = state.locks.acquire(path).await;

    let mut txn = state.store.begin_write();
    let resource = txn.get(path)?;
    check_if_match(headers, &resource.etag())?;

    if resource.as_package().is_some() {
        for descendant in txn.scan(path)? {
            txn.delete(&descendant)?;
        }
    }
    txn.delete(path)?;

    let name = path.name().expect("non-root path has a name").to_string();
    let parent_path = path.parent().expect("non-root path has a parent");
    let mut parent = txn
        .get(&parent_path)?
        .into_package()
        .ok_or_else(|| Error::invariant(format!("parent of {path} is not a package")))?;
    parent.member.retain(|m| m != &name);

    let mut new_value_id = state.blob.rm_link(parent.value_id, &name).await?;
    if package_id(&resource).is_some() {
        new_value_id = state.blob.rm_link(new_value_id, &sidecar_name(&name)).await?;
    }

    percolate_from_parent(state, parent_path, parent, new_value_id, &mut txn).await?;
    state.store.commit(txn).await?;

    info!(path = %path, "delete");
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ---------------------------------------------------------------------
// MKCOL
// ---------------------------------------------------------------------

async fn mkcol(state: &AppState, path: &Path, _headers: &HeaderMap) -> Result<Response> {
    if path.is_root() {
        return Err(Error::Forbidden("the root package already exists and cannot be re-created".to_string()));
    }
    let name = path.name().expect("non-root path has a name").to_string();
    let parent_path = path.parent().expect("non-root path has a parent");
    let _guard = state.locks.acquire(path).await;

    let mut txn = state.store.begin_write();
    if txn.exists(path)? {
        return Err(Error::conflict(format!("{path} already exists")));
    }
    let mut parent = txn
        .get(&parent_path)?
        .into_package()
        .ok_or_else(|| Error::Conflict(format!("{parent_path} is not a package")))?;
    if parent.collides_with(&name) {
        return Err(Error::conflict(format!("{name} collides with an existing member")));
    }

    let resource_uri = format!("{}/{}", parent.resource_uri, name);
    let pkg = build_empty_package(state, resource_uri, None, Vec::new()).await?;
    let child = Resource::Package(pkg);
    txn.set(path, child.clone())?;
    parent.member.push(name.clone());

    let new_value_id = link_child(state, parent.value_id, &name, &child).await?;
    percolate_from_parent(state, parent_path, parent, new_value_id, &mut txn).await?;
    state.store.commit(txn).await?;

    info!(path = %path, "mkcol");
    let mut resp = StatusCode::CREATED.into_response();
    *resp.headers_mut() = base_headers(&child);
    Ok(resp)
}

// ---------------------------------------------------------------------
// PATCH
// ---------------------------------------------------------------------

async fn patch(state: &AppState, path: &Path, headers: &HeaderMap, body: Bytes) -> Result<Response> {
    let _guard = state.locks.acquire(path).await;
    let mut txn = state.store.begin_write();
    let mut pkg = txn.get(path)?.into_package().ok_or_else(|| Error::Conflict(format!("{path} is not a package")))?;
    check_if_match(headers, &pkg.id.to_base32())?;

    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok()).unwrap_or(N_QUADS);
    let quads = parse_body_quads(content_type, &body)?;
    let (description, keywords) = extract_description_and_keywords(&quads);
    if let Some(description) = description {
        pkg.description = Some(description);
    }
    if !keywords.is_empty() {
        pkg.keywords = Some(keywords);
    }

    let old_id = pkg.id;
    let old_value_id = pkg.value_id;
    let state_in = PercolationState { path: path.clone(), pkg, old_id, old_value_id, new_value_id: None };
    percolate(state.blob.as_ref(), &mut txn, Utc::now(), state_in).await?;
    state.store.commit(txn).await?;

    info!(path = %path, "patch");
    let updated = state.store.begin_read().get(path)?;
    let format = negotiate::negotiate(headers.get("accept"), &[N_QUADS, LD_JSON]).unwrap_or(N_QUADS);
    let pkg = updated.as_package().expect("patch target stays a package");
    let nquads = state.blob.get(pkg.id).await?;
    let response_body = if format == N_QUADS {
        nquads
    } else {
        let text = String::from_utf8_lossy(&nquads).to_string();
        let quads = parse_nquads(&text)?;
        let frame = to_fixed_frame(&updated.uri(), &quads);
        Bytes::from(serde_json::to_vec(&frame).map_err(|e| Error::Internal(e.to_string()))?)
    };

    let mut resp = (StatusCode::OK, response_body).into_response();
    *resp.headers_mut() = base_headers(&updated);
    Ok(resp)
}
