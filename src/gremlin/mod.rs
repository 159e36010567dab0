//! Gremlin transport subsystem.
//!
//! # Data Flow
//! ```text
//! GraphConfig (endpoint, database, collection, key)
//!     → connector.rs (URL normalization, WebSocket handshake)
//!     → connection.rs (multiplexed requests, SASL, close detection)
//!     → protocol.rs (GraphSON v2 request/response messages)
//! ```
//!
//! # Design Decisions
//! - One WebSocket carries many concurrent requests, keyed by requestId
//! - Requests are sessionless `eval` ops; a new socket loses no state
//! - A dead socket fails in-flight requests with `ErrorKind::ConnectionClosed`

pub mod connection;
pub mod connector;
pub mod error;
pub mod protocol;

pub use connection::{Connection, ConnectionId, WsConnection};
pub use connector::{Connector, CosmosConnector, Credentials};
pub use error::{ErrorKind, GremlinError, GremlinResult};
pub use protocol::GremlinRequest;
