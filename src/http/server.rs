//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, metrics)
//! - Serve over plain TCP or TLS with graceful shutdown
//! - Apply reloaded retry policies

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::request::{make_span, track_metrics};
use crate::lifecycle::shutdown;
use crate::resilience::{ResilientSubmitter, RetryPolicy};

/// Grace period for in-flight requests on TLS shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub submitter: Arc<ResilientSubmitter>,
    pub retry_policy: Arc<ArcSwap<RetryPolicy>>,
    pub partition_key: Option<Arc<str>>,
}

/// HTTP front end for the graph gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    retry_policy: Arc<ArcSwap<RetryPolicy>>,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, submitter: Arc<ResilientSubmitter>) -> Self {
        let retry_policy = Arc::new(ArcSwap::from_pointee(RetryPolicy::from(&config.retry)));

        let state = AppState {
            submitter,
            retry_policy: retry_policy.clone(),
            partition_key: config.graph.partition_key.as_deref().map(Arc::from),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            retry_policy,
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let middleware_stack = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.http_request_secs,
            )));

        Router::new()
            .route("/", get(handlers::index))
            .route("/health", get(handlers::health))
            .route("/test_connection", post(handlers::test_connection))
            .route(
                "/vertices",
                get(handlers::list_vertices).post(handlers::create_vertex),
            )
            .route("/edges", get(handlers::list_edges).post(handlers::create_edge))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(middleware_stack)
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload = self.spawn_reload(config_updates, shutdown.resubscribe());

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        reload.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let reload = self.spawn_reload(config_updates, shutdown.resubscribe());

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        reload.abort();
        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    fn spawn_reload(
        &self,
        mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let retry_policy = self.retry_policy.clone();
        let mut current = self.config.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = updates.recv() => match update {
                        Some(new_config) => {
                            apply_reload(&retry_policy, &current, &new_config);
                            current = new_config;
                        }
                        None => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

/// Swap in the reloaded retry policy; warn about settings that need a restart.
fn apply_reload(
    retry_policy: &ArcSwap<RetryPolicy>,
    current: &GatewayConfig,
    new_config: &GatewayConfig,
) {
    if new_config.retry != current.retry {
        let policy = RetryPolicy::from(&new_config.retry);
        retry_policy.store(Arc::new(policy));
        tracing::info!(
            max_retries = policy.max_retries,
            initial_backoff = ?policy.initial_backoff,
            max_backoff = ?policy.max_backoff,
            "Retry policy reloaded"
        );
    }
    if new_config.graph != current.graph
        || new_config.listener != current.listener
        || new_config.timeouts != current.timeouts
        || new_config.security != current.security
        || new_config.observability != current.observability
    {
        tracing::warn!("Configuration changes outside [retry] take effect after restart");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_swaps_retry_policy() {
        let current = GatewayConfig::default();
        let policy = ArcSwap::from_pointee(RetryPolicy::from(&current.retry));

        let mut updated = current.clone();
        updated.retry.max_retries = 7;
        updated.retry.initial_backoff_ms = 50;
        apply_reload(&policy, &current, &updated);

        let loaded = **policy.load();
        assert_eq!(loaded.max_retries, 7);
        assert_eq!(loaded.initial_backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_reload_ignores_unchanged_retry() {
        let current = GatewayConfig::default();
        let policy = ArcSwap::from_pointee(RetryPolicy::new(
            1,
            Duration::from_millis(1),
            Duration::from_millis(1),
        ));

        let mut updated = current.clone();
        updated.graph.database = "other".into();
        apply_reload(&policy, &current, &updated);

        assert_eq!(policy.load().max_retries, 1);
    }
}
