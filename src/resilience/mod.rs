//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Handler builds an operation
//!     → submitter.rs (run against the shared connection)
//!     → On failure: classify.rs (transient disconnect or fatal?)
//!     → Transient: close + reopen connection, backoff.rs delay, retry
//!     → Fatal or budget exhausted: error returned unchanged
//! ```
//!
//! # Design Decisions
//! - Only server-initiated disconnects are retried; everything else fails fast
//! - Deterministic doubling backoff with a ceiling, no jitter
//! - Retry budget is a per-call count, not a time window

pub mod backoff;
pub mod classify;
pub mod submitter;

pub use backoff::RetryPolicy;
pub use classify::{classify, FailureClass};
pub use submitter::{ConnectionState, ResilientSubmitter};
