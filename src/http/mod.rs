//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack, graceful shutdown)
//!     → request.rs (request ID span, per-route metrics)
//!     → handlers.rs (payload → parameterized traversal → submitter)
//!     → error.rs (upstream failure → HTTP status + JSON body)
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
