//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, pretty or JSON)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log collection
//!     → Prometheus scrape of the metrics listener
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) is attached to every HTTP span
//! - Metric updates are no-ops until a recorder is installed
//! - Secrets never appear in log fields

pub mod logging;
pub mod metrics;
