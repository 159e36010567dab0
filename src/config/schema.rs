//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the graph gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Upstream graph endpoint and credentials.
    pub graph: GraphConfig,

    /// Reconnect-and-retry policy.
    pub retry: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Cosmos DB Gremlin endpoint settings.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    /// Account endpoint, e.g. "wss://<account>.gremlin.cosmos.azure.com:443/".
    pub endpoint: String,

    /// Graph database name.
    pub database: String,

    /// Graph (collection) name inside the database.
    pub collection: String,

    /// Traversal source alias.
    pub traversal_source: String,

    /// Account key. Never logged.
    pub key: String,

    /// Partition key property required on new vertices, if the graph is partitioned.
    pub partition_key: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            database: String::new(),
            collection: "RelationshipGraph".to_string(),
            traversal_source: "g".to_string(),
            key: String::new(),
            partition_key: None,
        }
    }
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("endpoint", &self.endpoint)
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("traversal_source", &self.traversal_source)
            .field("key", &if self.key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("partition_key", &self.partition_key)
            .finish()
    }
}

/// Retry configuration for transient disconnects.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of reconnect-and-retry cycles per submission.
    pub max_retries: u32,

    /// First backoff delay in milliseconds.
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// WebSocket handshake timeout in seconds.
    pub connect_secs: u64,

    /// Per-submission response timeout in seconds.
    pub submit_secs: u64,

    /// Total HTTP request timeout in seconds, retries included.
    pub http_request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            submit_secs: 30,
            http_request_secs: 120,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [graph]
            endpoint = "wss://acct.gremlin.cosmos.azure.com:443/"
            database = "graphdb"
            "#,
        )
        .unwrap();

        assert_eq!(config.graph.collection, "RelationshipGraph");
        assert_eq!(config.graph.traversal_source, "g");
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"
            tls = { cert_path = "cert.pem", key_path = "key.pem" }

            [graph]
            endpoint = "wss://acct.gremlin.cosmos.azure.com:443/"
            database = "graphdb"
            collection = "People"
            key = "secret"
            partition_key = "pk"

            [retry]
            max_retries = 5
            initial_backoff_ms = 250
            max_backoff_ms = 4000

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.tls.unwrap().cert_path, "cert.pem");
        assert_eq!(config.graph.partition_key.as_deref(), Some("pk"));
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_key_not_in_debug_output() {
        let graph = GraphConfig {
            key: "top-secret".into(),
            ..GraphConfig::default()
        };
        assert!(!format!("{:?}", graph).contains("top-secret"));
    }
}
