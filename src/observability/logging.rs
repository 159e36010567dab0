//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn default_filter(config: &ObservabilityConfig) -> EnvFilter {
    let directives = format!(
        "graph_gateway={level},tower_http={level}",
        level = config.log_level
    );
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("invalid log_level '{}': {}, falling back to info", config.log_level, e);
        EnvFilter::new("graph_gateway=info,tower_http=info")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_configured_level() {
        let config = ObservabilityConfig {
            log_level: "debug".into(),
            ..ObservabilityConfig::default()
        };
        let rendered = default_filter(&config).to_string();
        assert!(rendered.contains("graph_gateway=debug"));
        assert!(rendered.contains("tower_http=debug"));
    }
}
