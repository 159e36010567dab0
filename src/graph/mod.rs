//! Graph traversal construction.
//!
//! Turns validated API payloads into parameterized Gremlin requests. See
//! `queries.rs` for the traversal shapes.

pub mod queries;

pub use queries::{NewEdge, NewVertex, QueryError};
