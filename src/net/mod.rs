//! Network layer.
//!
//! Plain TCP listeners are bound directly by `main`; this module only covers
//! optional TLS termination via axum-server.

pub mod tls;
