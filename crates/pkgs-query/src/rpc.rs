// SPDX-License-Identifier: MIT OR Apache-2.0
//! The RPC session server: JSON-RPC 2.0 over newline-delimited JSON on
//! a raw TCP socket.

use crate::index::GraphIndex;
use crate::iterator::QueryCursor;
use crate::resolve::{self, Pattern};
use pkgs_model::Term;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Response { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    fn err(id: Value, message: impl Into<String>) -> Self {
        Response { jsonrpc: "2.0", id, result: None, error: Some(RpcError { code: -32000, message: message.into() }) }
    }
}

/// Serve query sessions on `listener` until it's dropped or errors.
/// Each accepted connection runs [`handle_connection`] on its own task.
pub async fn serve(listener: TcpListener, index: Arc<GraphIndex>) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let index = index.clone();
        tokio::spawn(async move {
            info!(%peer, "rpc session opened");
            if let Err(e) = handle_connection(stream, index).await {
                warn!(%peer, error = %e, "rpc session ended with error");
            }
            info!(%peer, "rpc session closed");
        });
    }
}

/// Drive one client connection: read newline-delimited JSON-RPC requests,
/// dispatch `query`/`next`/`seek`/`close`, write newline-delimited
/// responses. The session owns at most one live iterator; opening a new
/// `query` closes the previous one. Returning from this function — for
/// any reason, including the client disconnecting — drops `session` and
/// with it any open iterator.
async fn handle_connection(stream: TcpStream, index: Arc<GraphIndex>) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut session = Session::new(index);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let id = request.id.clone();
                match session.dispatch(request) {
                    Ok(result) => Response::ok(id, result),
                    Err(message) => Response::err(id, message),
                }
            }
            Err(e) => Response::err(Value::Null, format!("invalid request: {e}")),
        };
        let mut text = serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
        text.push('\n');
        write_half.write_all(text.as_bytes()).await?;
    }
    Ok(())
}

struct Session {
    index: Arc<GraphIndex>,
    iterator: Option<QueryCursor>,
}

impl Session {
    fn new(index: Arc<GraphIndex>) -> Self {
        Session { index, iterator: None }
    }

    fn dispatch(&mut self, request: Request) -> Result<Value, String> {
        match request.method.as_str() {
            "query" => self.query(request.params),
            "next" => self.next(request.params),
            "seek" => self.seek(request.params),
            "close" => self.close(),
            other => Err(format!("unknown method {other}")),
        }
    }

    fn query(&mut self, params: Value) -> Result<Value, String> {
        let pattern: Pattern = serde_json::from_value(params.get("pattern").cloned().unwrap_or(Value::Null))
            .map_err(|e| format!("invalid pattern: {e}"))?;
        let iterator = resolve::resolve(&self.index, &pattern).map_err(|e| e.to_string())?;
        let domain = iterator.domain().to_vec();
        self.iterator = Some(iterator);
        Ok(json!({ "domain": domain }))
    }

    fn next(&mut self, params: Value) -> Result<Value, String> {
        let var = params.get("var").and_then(Value::as_str);
        let iterator = self.iterator.as_mut().ok_or("no open query")?;
        match iterator.next(var) {
            Some(bindings) => Ok(json!({ "bindings": bindings })),
            None => Ok(json!({ "bindings": null })),
        }
    }

    fn seek(&mut self, params: Value) -> Result<Value, String> {
        let prefix: Vec<Term> = serde_json::from_value(params.get("prefix").cloned().unwrap_or(Value::Array(vec![])))
            .map_err(|e| format!("invalid prefix: {e}"))?;
        let iterator = self.iterator.as_mut().ok_or("no open query")?;
        iterator.seek(prefix);
        Ok(json!({}))
    }

    fn close(&mut self) -> Result<Value, String> {
        if let Some(iterator) = self.iterator.take() {
            iterator.close();
        }
        Ok(json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgs_model::{ContentId, Path, Resource};
    use tokio::io::{AsyncBufReadExt as _, BufReader as TokioBufReader};

    #[tokio::test]
    async fn query_next_seek_close_round_trip_over_tcp() {
        use pkgs_store::Index as _;

        let index = Arc::new(GraphIndex::new());
        let file = Resource::File(pkgs_model::File {
            value_id: ContentId::of_bytes(b"hello"),
            media_type: "text/plain".to_string(),
            extent: 5,
        });
        index.on_set(&Path::parse("/hello.txt").unwrap(), &file).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_index = index.clone();
        tokio::spawn(async move {
            let _ = serve(listener, server_index).await;
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = TokioBufReader::new(read_half).lines();

        let query = json!({
            "jsonrpc": "2.0", "id": 1, "method": "query",
            "params": { "pattern": {
                "subject": { "termType": "Variable", "value": "s" },
                "predicate": { "termType": "Variable", "value": "p" },
                "object": { "termType": "Variable", "value": "o" },
                "graph": null
            }}
        });
        write_half.write_all(format!("{query}\n").as_bytes()).await.unwrap();
        let reply = lines.next_line().await.unwrap().unwrap();
        let reply: Value = serde_json::from_str(&reply).unwrap();
        assert!(reply["result"]["domain"].as_array().unwrap().len() >= 2);

        let next = json!({ "jsonrpc": "2.0", "id": 2, "method": "next", "params": {} });
        write_half.write_all(format!("{next}\n").as_bytes()).await.unwrap();
        let reply = lines.next_line().await.unwrap().unwrap();
        let reply: Value = serde_json::from_str(&reply).unwrap();
        assert!(!reply["result"]["bindings"].is_null());

        let close = json!({ "jsonrpc": "2.0", "id": 3, "method": "close", "params": {} });
        write_half.write_all(format!("{close}\n").as_bytes()).await.unwrap();
        let reply = lines.next_line().await.unwrap().unwrap();
        let reply: Value = serde_json::from_str(&reply).unwrap();
        assert!(reply["error"].is_null());
    }
}
