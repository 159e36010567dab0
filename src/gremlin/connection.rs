//! Multiplexed Gremlin connection over a single WebSocket.
//!
//! # Responsibilities
//! - Frame and send requests, route responses back by `requestId`
//! - Answer SASL challenges with the configured credentials
//! - Fail every in-flight request when the socket goes away
//!
//! # Data Flow
//! ```text
//! submit() ──► pending map ──► outbound mpsc ──► writer task ──► sink
//!                  ▲
//! reader task ◄── stream: 206 accumulate, 200/204 complete, 407 authenticate
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use uuid::Uuid;

use crate::gremlin::connector::Credentials;
use crate::gremlin::error::{GremlinError, GremlinResult};
use crate::gremlin::protocol::{status, GremlinRequest, RequestMessage, ResponseMessage};

static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an upstream connection, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gremlin-{}", self.0)
    }
}

/// An open session to the graph endpoint.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Submit one request and collect every result record.
    async fn submit(&self, request: GremlinRequest) -> GremlinResult<Vec<Value>>;

    /// Close the session. Callers treat failures as best-effort.
    async fn close(&self) -> GremlinResult<()>;

    fn id(&self) -> ConnectionId;
}

type Reply = oneshot::Sender<GremlinResult<Vec<Value>>>;

struct Pending {
    items: Vec<Value>,
    reply: Reply,
}

/// State shared between the handle and its reader task.
struct Shared {
    id: ConnectionId,
    pending: DashMap<Uuid, Pending>,
    outbound: mpsc::UnboundedSender<Message>,
    closed: AtomicBool,
    credentials: Credentials,
}

impl Shared {
    fn dispatch(&self, payload: &[u8]) {
        let response = match ResponseMessage::decode(payload) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(connection = %self.id, error = %e, "Dropping undecodable response");
                return;
            }
        };

        let Some(request_id) = response.request_id else {
            tracing::warn!(
                connection = %self.id,
                code = response.status.code,
                "Response without requestId"
            );
            return;
        };

        match response.status.code {
            status::PARTIAL_CONTENT => {
                if let Some(mut entry) = self.pending.get_mut(&request_id) {
                    entry.items.extend(response.into_items());
                }
            }
            status::SUCCESS | status::NO_CONTENT => {
                if let Some((_, mut pending)) = self.pending.remove(&request_id) {
                    pending.items.extend(response.into_items());
                    let _ = pending.reply.send(Ok(pending.items));
                }
            }
            status::AUTHENTICATE => self.authenticate(request_id),
            code => {
                let message = response.error_message();
                if let Some((_, pending)) = self.pending.remove(&request_id) {
                    let _ = pending.reply.send(Err(GremlinError::from_status(code, message)));
                }
            }
        }
    }

    fn authenticate(&self, request_id: Uuid) {
        tracing::debug!(connection = %self.id, %request_id, "Answering SASL challenge");
        let answer = RequestMessage::authentication(
            request_id,
            &self.credentials.username,
            self.credentials.password(),
        );
        let sent = answer
            .encode()
            .and_then(|frame| {
                self.outbound
                    .send(Message::binary(frame))
                    .map_err(|_| GremlinError::ClosedLocally)
            });
        if let Err(e) = sent {
            if let Some((_, pending)) = self.pending.remove(&request_id) {
                let _ = pending.reply.send(Err(e));
            }
        }
    }

    /// Mark closed and fail everything still waiting.
    fn fail_all(&self, make_error: impl Fn() -> GremlinError) {
        self.closed.store(true, Ordering::SeqCst);
        let ids: Vec<Uuid> = self.pending.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, pending)) = self.pending.remove(&id) {
                let _ = pending.reply.send(Err(make_error()));
            }
        }
    }
}

/// A [`Connection`] backed by a WebSocket stream.
pub struct WsConnection {
    shared: Arc<Shared>,
    request_timeout: Duration,
    traversal_source: String,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl WsConnection {
    /// Take ownership of an established WebSocket and start the I/O tasks.
    pub fn spawn<S>(
        stream: WebSocketStream<S>,
        credentials: Credentials,
        traversal_source: String,
        request_timeout: Duration,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, source) = stream.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            id: ConnectionId::next(),
            pending: DashMap::new(),
            outbound,
            closed: AtomicBool::new(false),
            credentials,
        });

        let writer = tokio::spawn(write_loop(sink, outbound_rx, shared.id));
        let reader = tokio::spawn(read_loop(source, shared.clone()));

        tracing::debug!(connection = %shared.id, "Gremlin connection started");

        Self {
            shared,
            request_timeout,
            traversal_source,
            reader,
            writer,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn submit(&self, request: GremlinRequest) -> GremlinResult<Vec<Value>> {
        if self.is_closed() {
            return Err(GremlinError::closed(None));
        }

        let message = RequestMessage::eval(&request, &self.traversal_source);
        let request_id = message.request_id;
        let frame = message.encode()?;

        let (reply, rx) = oneshot::channel();
        self.shared.pending.insert(
            request_id,
            Pending {
                items: Vec::new(),
                reply,
            },
        );

        // The reader may have drained the map between the check above and the insert.
        if self.is_closed() || self.shared.outbound.send(Message::binary(frame)).is_err() {
            self.shared.pending.remove(&request_id);
            return Err(GremlinError::closed(None));
        }

        tracing::trace!(connection = %self.shared.id, %request_id, "Request sent");

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(GremlinError::closed(None)),
            Err(_) => {
                self.shared.pending.remove(&request_id);
                Err(GremlinError::Timeout(self.request_timeout))
            }
        }
    }

    async fn close(&self) -> GremlinResult<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.fail_all(|| GremlinError::ClosedLocally);
        self.shared
            .outbound
            .send(Message::Close(None))
            .map_err(|_| GremlinError::Transport("writer already stopped".into()))
    }

    fn id(&self) -> ConnectionId {
        self.shared.id
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

async fn write_loop<S>(
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    id: ConnectionId,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            tracing::debug!(connection = %id, error = %e, "WebSocket write failed");
            break;
        }
        if closing {
            break;
        }
    }
    let _ = sink.close().await;
}

async fn read_loop<S>(mut source: SplitStream<WebSocketStream<S>>, shared: Arc<Shared>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let error = loop {
        match source.next().await {
            Some(Ok(Message::Text(text))) => shared.dispatch(text.as_bytes()),
            Some(Ok(Message::Binary(bytes))) => shared.dispatch(&bytes),
            Some(Ok(Message::Close(frame))) => {
                let reason = frame
                    .map(|f| f.reason.as_str().to_owned())
                    .filter(|r| !r.is_empty());
                break GremlinError::closed(reason);
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => break GremlinError::from(e),
            None => break GremlinError::closed(None),
        }
    };

    if !shared.closed.load(Ordering::SeqCst) {
        tracing::warn!(connection = %shared.id, error = %error, "Gremlin connection lost");
    }

    // Anything left in flight can only be answered by a new connection.
    let reason = match &error {
        GremlinError::ConnectionClosed { reason } => reason.clone(),
        other => Some(other.to_string()),
    };
    shared.fail_all(|| GremlinError::closed(reason.clone()));
}
