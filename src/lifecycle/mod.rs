//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT / SIGTERM → Shutdown::trigger()
//!
//! Shutdown (shutdown.rs):
//!     broadcast → HTTP server drains → submitter closes upstream handle
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
