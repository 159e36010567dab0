//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, overlay COSMOS_DB_* / GRAPH_DB_NAME env vars)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates
//!     → HTTP server swaps in the new retry policy
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; a deployment can run on env vars alone
//! - Only the retry policy is reloadable; endpoint changes need a restart
//! - The account key is redacted from Debug output

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    GatewayConfig, GraphConfig, ListenerConfig, LogFormat, ObservabilityConfig, RetryConfig,
    SecurityConfig, TimeoutConfig, TlsConfig,
};
