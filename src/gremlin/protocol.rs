//! Gremlin Server wire messages (GraphSON v2).
//!
//! # Framing
//! ```text
//! request  (binary frame): [mime len: u8][mime bytes][json request]
//! response (text/binary):  json response
//! ```
//!
//! A request may be answered by several responses sharing its `requestId`:
//! zero or more `206 Partial Content` followed by a terminal status.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::gremlin::error::{GremlinError, GremlinResult};

/// Mime type prefixed to every request frame.
pub const GRAPHSON_V2: &str = "application/vnd.gremlin-v2.0+json";

/// Response status codes the client acts on.
pub mod status {
    pub const SUCCESS: u16 = 200;
    pub const NO_CONTENT: u16 = 204;
    pub const PARTIAL_CONTENT: u16 = 206;
    pub const AUTHENTICATE: u16 = 407;
}

/// A traversal script plus its named parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GremlinRequest {
    pub gremlin: String,
    pub bindings: Map<String, Value>,
}

impl GremlinRequest {
    pub fn new(gremlin: impl Into<String>) -> Self {
        Self {
            gremlin: gremlin.into(),
            bindings: Map::new(),
        }
    }

    /// Attach a named binding.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }
}

/// Outgoing request message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    pub request_id: Uuid,
    pub op: &'static str,
    pub processor: &'static str,
    pub args: Value,
}

impl RequestMessage {
    /// Build a sessionless `eval` request for the given traversal source.
    pub fn eval(request: &GremlinRequest, traversal_source: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            op: "eval",
            processor: "",
            args: serde_json::json!({
                "gremlin": request.gremlin,
                "bindings": request.bindings,
                "language": "gremlin-groovy",
                "aliases": { "g": traversal_source },
            }),
        }
    }

    /// Build the SASL PLAIN answer to a `407` challenge for `request_id`.
    pub fn authentication(request_id: Uuid, username: &str, password: &str) -> Self {
        Self {
            request_id,
            op: "authentication",
            processor: "",
            args: serde_json::json!({
                "sasl": sasl_plain(username, password),
                "saslMechanism": "PLAIN",
            }),
        }
    }

    /// Serialize into a framed binary payload.
    pub fn encode(&self) -> GremlinResult<Vec<u8>> {
        let body = serde_json::to_vec(self)?;
        let mut frame = Vec::with_capacity(1 + GRAPHSON_V2.len() + body.len());
        frame.push(GRAPHSON_V2.len() as u8);
        frame.extend_from_slice(GRAPHSON_V2.as_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

/// Base64 of `\0username\0password`.
pub fn sasl_plain(username: &str, password: &str) -> String {
    let mut raw = Vec::with_capacity(username.len() + password.len() + 2);
    raw.push(0);
    raw.extend_from_slice(username.as_bytes());
    raw.push(0);
    raw.extend_from_slice(password.as_bytes());
    STANDARD.encode(raw)
}

/// Incoming response message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    pub request_id: Option<Uuid>,
    pub status: ResponseStatus,
    #[serde(default)]
    pub result: ResponseResult,
}

#[derive(Debug, Deserialize)]
pub struct ResponseStatus {
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseResult {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub meta: Value,
}

impl ResponseMessage {
    pub fn decode(payload: &[u8]) -> GremlinResult<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Flatten `result.data` into a list of records.
    pub fn into_items(self) -> Vec<Value> {
        flatten_data(self.result.data)
    }

    /// Server-supplied detail for errors, preferring Cosmos' own message.
    pub fn error_message(&self) -> String {
        if !self.status.message.is_empty() {
            return self.status.message.clone();
        }
        match self.status.attributes.get("x-ms-status-code") {
            Some(code) => format!("upstream status {}", code),
            None => String::new(),
        }
    }
}

fn flatten_data(data: Value) -> Vec<Value> {
    match data {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(mut obj) if obj.get("@type").and_then(Value::as_str) == Some("g:List") => {
            match obj.remove("@value") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        other => vec![other],
    }
}

/// Strip the mime prefix from a request frame. Used by test servers.
pub fn split_request_frame(frame: &[u8]) -> Result<(&str, &[u8]), GremlinError> {
    let (&len, rest) = frame
        .split_first()
        .ok_or_else(|| GremlinError::Protocol("empty request frame".into()))?;
    let len = len as usize;
    if rest.len() < len {
        return Err(GremlinError::Protocol("truncated mime prefix".into()));
    }
    let mime = std::str::from_utf8(&rest[..len])
        .map_err(|e| GremlinError::Protocol(format!("invalid mime prefix: {}", e)))?;
    Ok((mime, &rest[len..]))
}
