//! Graph Gateway Library
//!
//! HTTP façade over an Azure Cosmos DB Gremlin endpoint with automatic
//! reconnect on server-initiated disconnects.

pub mod config;
pub mod graph;
pub mod gremlin;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{ResilientSubmitter, RetryPolicy};
