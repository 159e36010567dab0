//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All problems are
//! collected and returned together.

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::gremlin::connector::gremlin_url;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let graph = &config.graph;
    if graph.endpoint.trim().is_empty() {
        errors.push(ValidationError::new(
            "graph.endpoint",
            "must be set (or COSMOS_DB_ENDPOINT)",
        ));
    } else if let Err(e) = gremlin_url(&graph.endpoint) {
        errors.push(ValidationError::new("graph.endpoint", e.to_string()));
    }
    if graph.database.trim().is_empty() {
        errors.push(ValidationError::new(
            "graph.database",
            "must be set (or GRAPH_DB_NAME)",
        ));
    }
    if graph.collection.trim().is_empty() {
        errors.push(ValidationError::new("graph.collection", "must not be empty"));
    }
    if graph.traversal_source.trim().is_empty() {
        errors.push(ValidationError::new("graph.traversal_source", "must not be empty"));
    }
    if graph.key.is_empty() {
        errors.push(ValidationError::new("graph.key", "must be set (or COSMOS_DB_KEY)"));
    }

    let retry = &config.retry;
    if retry.max_retries < 1 {
        errors.push(ValidationError::new("retry.max_retries", "must be at least 1"));
    }
    if retry.initial_backoff_ms == 0 {
        errors.push(ValidationError::new("retry.initial_backoff_ms", "must be greater than 0"));
    }
    if retry.initial_backoff_ms > retry.max_backoff_ms {
        errors.push(ValidationError::new(
            "retry.max_backoff_ms",
            "must not be smaller than initial_backoff_ms",
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.submit_secs", timeouts.submit_secs),
        ("timeouts.http_request_secs", timeouts.http_request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.graph.endpoint = "wss://acct.gremlin.cosmos.azure.com:443/".into();
        config.graph.database = "graphdb".into();
        config.graph.key = "secret".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = GatewayConfig::default();
        config.retry.max_retries = 0;
        config.retry.initial_backoff_ms = 5_000;
        config.retry.max_backoff_ms = 1_000;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();

        assert!(fields.contains(&"graph.endpoint"));
        assert!(fields.contains(&"graph.database"));
        assert!(fields.contains(&"graph.key"));
        assert!(fields.contains(&"retry.max_retries"));
        assert!(fields.contains(&"retry.max_backoff_ms"));
    }

    #[test]
    fn test_bad_endpoint_scheme() {
        let mut config = valid();
        config.graph.endpoint = "ftp://acct".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "graph.endpoint");
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = valid();
        config.timeouts.submit_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "timeouts.submit_secs");
    }
}
