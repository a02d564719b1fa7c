// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end tests driving the HTTP router through `tower::ServiceExt`,
//! against an in-memory blob store and a temp-directory-backed `sled`
//! resource store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pkgs_blob::MemoryBlobStore;
use pkgs_daemon::{build_app, ensure_root, AppState};
use pkgs_query::GraphIndex;
use pkgs_store::{Index, ResourceStore};
use std::sync::Arc;
use tower::ServiceExt;

async fn test_state() -> (tempfile::TempDir, Arc<AppState>) {
    let tmp = tempfile::tempdir().unwrap();
    let index = Arc::new(GraphIndex::new());
    let indices: Vec<Arc<dyn Index>> = vec![index.clone()];
    let store = ResourceStore::open_with_indices(tmp.path(), indices).unwrap();
    let state = Arc::new(AppState {
        store,
        blob: Arc::new(MemoryBlobStore::new()),
        index,
        locks: Default::default(),
        root_uri: "dweb:/ipns/test".to_string(),
    });
    ensure_root(&state).await.unwrap();
    (tmp, state)
}

fn etag_of(headers: &axum::http::HeaderMap) -> String {
    headers.get("etag").unwrap().to_str().unwrap().to_string()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// 1. Bootstrap then GET root.
#[tokio::test]
async fn bootstrap_then_get_root() {
    let (_tmp, state) = test_state().await;
    let app = build_app(state);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("accept", "application/n-quads")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let etag = etag_of(resp.headers());
    let body = body_text(resp).await;
    assert!(body.contains("_:c14n0"));
    assert!(body.contains("http://www.w3.org/ns/ldp#membershipResource"));
    assert!(body.contains("dweb:/ipns/test"));

    let resp2 = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("accept", "application/n-quads")
                .header("if-none-match", etag.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp2.status(), StatusCode::NOT_MODIFIED);
}

// 2. MKCOL then nested PUT.
#[tokio::test]
async fn mkcol_then_nested_put() {
    let (_tmp, state) = test_state().await;
    let app = build_app(state);

    let root_etag = {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        etag_of(resp.headers())
    };

    let resp = app
        .clone()
        .oneshot(Request::builder().method("MKCOL").uri("/a").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let a_etag_first = etag_of(resp.headers());

    let resp = app
        .clone()
        .oneshot(Request::builder().method("MKCOL").uri("/a/b").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/a/b/hello")
                .header("content-type", "text/plain")
                .header("link", "<http://www.w3.org/ns/ldp#NonRDFSource>; rel=\"type\"")
                .body(Body::from("hi"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let hello_etag = etag_of(resp.headers());

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/a/b/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "text/plain");
    assert_eq!(etag_of(resp.headers()), hello_etag);
    assert_eq!(body_text(resp).await, "hi");

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_ne!(etag_of(resp.headers()), root_etag);

    let resp = app
        .oneshot(Request::builder().uri("/a").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_ne!(etag_of(resp.headers()), a_etag_first);
}

// 3. PUT replace with wrong If-Match.
#[tokio::test]
async fn put_replace_with_wrong_if_match_is_rejected() {
    let (_tmp, state) = test_state().await;
    let app = build_app(state);

    app.clone()
        .oneshot(Request::builder().method("MKCOL").uri("/a").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let put = |body: &'static str| {
        Request::builder()
            .method("PUT")
            .uri("/a/hello")
            .header("content-type", "text/plain")
            .header("link", "<http://www.w3.org/ns/ldp#NonRDFSource>; rel=\"type\"")
            .body(Body::from(body))
            .unwrap()
    };
    app.clone().oneshot(put("hi")).await.unwrap();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/a/hello")
                .header("content-type", "text/plain")
                .header("link", "<http://www.w3.org/ns/ldp#NonRDFSource>; rel=\"type\"")
                .header("if-match", "\"zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz\"")
                .body(Body::from("bye"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);

    let resp = app
        .oneshot(Request::builder().uri("/a/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(resp).await, "hi");
}

// 4. DELETE cascades.
#[tokio::test]
async fn delete_cascades_subtree() {
    let (_tmp, state) = test_state().await;
    let app = build_app(state);

    let pre_delete_root_etag = {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        etag_of(resp.headers())
    };

    app.clone()
        .oneshot(Request::builder().method("MKCOL").uri("/a").body(Body::empty()).unwrap())
        .await
        .unwrap();
    app.clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/a/hello")
                .header("content-type", "text/plain")
                .header("link", "<http://www.w3.org/ns/ldp#NonRDFSource>; rel=\"type\"")
                .body(Body::from("hi"))
                .unwrap(),
        )
        .await
        .unwrap();

    let a_etag = {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/a").body(Body::empty()).unwrap())
            .await
            .unwrap();
        etag_of(resp.headers())
    };

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/a")
                .header("if-match", a_etag.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/a").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/a/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_ne!(etag_of(resp.headers()), pre_delete_root_etag);
}

// 5. PATCH description.
#[tokio::test]
async fn patch_description_is_visible_as_ld_json() {
    let (_tmp, state) = test_state().await;
    let app = build_app(state);

    app.clone()
        .oneshot(Request::builder().method("MKCOL").uri("/x").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let x_etag = {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        etag_of(resp.headers())
    };

    let patch_body = "_:c14n0 <http://purl.org/dc/terms/description> \"sample\" .\n";
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/x")
                .header("content-type", "application/n-quads")
                .header("if-match", x_etag.as_str())
                .body(Body::from(patch_body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/x")
                .header("accept", "application/ld+json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("dcterms:description") || body.contains("http://purl.org/dc/terms/description"));
    assert!(body.contains("sample"));
    assert!(body.contains("wasRevisionOf"));
}

// 6. Query round-trip via the RPC server, wired up alongside the HTTP router.
#[tokio::test]
async fn query_round_trip_over_rpc() {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    let (_tmp, state) = test_state().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let index = state.index.clone();
    tokio::spawn(async move {
        let _ = pkgs_query::serve(listener, index).await;
    });

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let query = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "query",
        "params": { "pattern": {
            "subject": { "termType": "Variable", "value": "s" },
            "predicate": { "termType": "Variable", "value": "p" },
            "object": { "termType": "Variable", "value": "o" },
            "graph": null
        }}
    });
    stream.write_all(format!("{query}\n").as_bytes()).await.unwrap();
    stream.flush().await.unwrap();

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let reply = lines.next_line().await.unwrap().unwrap();
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply["jsonrpc"], "2.0");
    // The root package bootstrapped at startup guarantees at least one
    // quad exists, so the domain comes back non-empty rather than erroring.
    assert!(reply["result"]["domain"].as_array().unwrap().len() >= 2);

    let next = serde_json::json!({ "jsonrpc": "2.0", "id": 2, "method": "next", "params": {} });
    write_half.write_all(format!("{next}\n").as_bytes()).await.unwrap();
    let reply = lines.next_line().await.unwrap().unwrap();
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert!(!reply["result"]["bindings"].is_null());

    let close = serde_json::json!({ "jsonrpc": "2.0", "id": 3, "method": "close", "params": {} });
    write_half.write_all(format!("{close}\n").as_bytes()).await.unwrap();
    let reply = lines.next_line().await.unwrap().unwrap();
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert!(reply["error"].is_null());
}
