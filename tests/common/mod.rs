//! Shared utilities for integration tests: a scriptable Gremlin server.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use graph_gateway::config::GraphConfig;
use graph_gateway::gremlin::protocol::split_request_frame;
use graph_gateway::gremlin::CosmosConnector;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// What the server does with the next `eval` request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer 200 with these records.
    Data(Vec<Value>),
    /// Answer with one 206 per chunk, then an empty 200.
    Chunked(Vec<Vec<Value>>),
    /// Close the WebSocket without answering.
    Close,
    /// Answer with an error status.
    Error(u16, String),
    /// Read the request and never answer it.
    Silent,
}

#[derive(Default)]
struct ServerState {
    script: Mutex<VecDeque<Reply>>,
    evals: Mutex<Vec<Value>>,
    sasl: Mutex<Vec<String>>,
    connections: AtomicUsize,
    require_auth: bool,
}

/// Handle to a running mock Gremlin server.
#[derive(Clone)]
pub struct MockGremlin {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
}

impl MockGremlin {
    /// Start a server that answers requests with `script` in order, then
    /// with empty results once the script runs out.
    pub async fn start(script: Vec<Reply>) -> Self {
        Self::spawn(script, false).await
    }

    /// Like [`MockGremlin::start`], but challenges every request with a 407.
    pub async fn start_with_auth(script: Vec<Reply>) -> Self {
        Self::spawn(script, true).await
    }

    async fn spawn(script: Vec<Reply>, require_auth: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState {
            script: Mutex::new(script.into()),
            require_auth,
            ..ServerState::default()
        });

        let server_state = state.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                server_state.connections.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(socket, server_state.clone()));
            }
        });

        Self { addr, state }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Number of WebSocket connections accepted so far.
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Every `eval` request received, as JSON.
    pub fn evals(&self) -> Vec<Value> {
        self.state.evals.lock().unwrap().clone()
    }

    /// Every SASL payload received.
    pub fn sasl(&self) -> Vec<String> {
        self.state.sasl.lock().unwrap().clone()
    }

    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            endpoint: self.endpoint(),
            database: "db".into(),
            collection: "coll".into(),
            key: "secret".into(),
            ..GraphConfig::default()
        }
    }

    pub fn connector(&self) -> CosmosConnector {
        self.connector_with_timeout(Duration::from_secs(5))
    }

    pub fn connector_with_timeout(&self, request_timeout: Duration) -> CosmosConnector {
        CosmosConnector::new(&self.graph_config(), Duration::from_secs(5), request_timeout)
            .unwrap()
    }
}

async fn serve(socket: TcpStream, state: Arc<ServerState>) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
        return;
    };

    while let Some(Ok(message)) = ws.next().await {
        let frame = match message {
            Message::Binary(bytes) => bytes,
            Message::Close(_) => break,
            _ => continue,
        };
        let (_, body) = split_request_frame(&frame).unwrap();
        let request: Value = serde_json::from_slice(body).unwrap();
        let request_id = request["requestId"].as_str().unwrap().to_string();

        match request["op"].as_str() {
            Some("eval") => {
                state.evals.lock().unwrap().push(request.clone());
                if state.require_auth {
                    respond(&mut ws, &request_id, 407, Value::Null).await;
                    continue;
                }
            }
            Some("authentication") => {
                let sasl = request["args"]["sasl"].as_str().unwrap_or_default();
                state.sasl.lock().unwrap().push(sasl.to_string());
            }
            _ => continue,
        }

        let reply = state
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Data(Vec::new()));

        match reply {
            Reply::Data(items) => respond(&mut ws, &request_id, 200, json!(items)).await,
            Reply::Chunked(chunks) => {
                for chunk in chunks {
                    respond(&mut ws, &request_id, 206, json!(chunk)).await;
                }
                respond(&mut ws, &request_id, 200, json!([])).await;
            }
            Reply::Close => {
                let _ = ws.close(None).await;
                break;
            }
            Reply::Error(code, message) => {
                let response = json!({
                    "requestId": request_id,
                    "status": { "code": code, "message": message, "attributes": {} },
                    "result": { "data": null, "meta": {} },
                });
                let _ = ws.send(Message::text(response.to_string())).await;
            }
            Reply::Silent => {}
        }
    }
}

async fn respond(ws: &mut WebSocketStream<TcpStream>, request_id: &str, code: u16, data: Value) {
    let response = json!({
        "requestId": request_id,
        "status": { "code": code, "message": "", "attributes": {} },
        "result": { "data": data, "meta": {} },
    });
    let _ = ws.send(Message::text(response.to_string())).await;
}

/// Address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
