//! Resilient submission over a single shared upstream connection.
//!
//! # States
//! - Disconnected: no handle open (startup, or a reopen failed)
//! - Connected: serving operations
//! - Reconnecting: stale handle closed, replacement being opened
//!
//! # State Transitions
//! ```text
//! Disconnected → Connected: lazy or warm-up open succeeds
//! Connected → Reconnecting: operation fails with a transient disconnect
//! Reconnecting → Connected: replacement opened
//! Reconnecting → Disconnected: replacement failed to open
//! ```
//!
//! The handle is owned here and guarded by a mutex held across the whole
//! close/reopen/swap sequence, so at most one handle is ever open. Operations
//! run on a cloned `Arc` without holding the lock.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::gremlin::{Connection, Connector, GremlinError, GremlinResult};
use crate::observability::metrics;
use crate::resilience::backoff::RetryPolicy;
use crate::resilience::classify::{classify, FailureClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ConnectionState::Connected,
            2 => ConnectionState::Reconnecting,
            _ => ConnectionState::Disconnected,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Reconnecting => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

/// Result of one attempt, tagged for the retry loop.
enum Attempt<T> {
    Done(T),
    Transient(GremlinError),
    Fatal(GremlinError),
}

/// Owns the upstream connection and runs operations against it with
/// reconnect-and-retry on transient disconnects.
pub struct ResilientSubmitter {
    connector: Arc<dyn Connector>,
    slot: Mutex<Option<Arc<dyn Connection>>>,
    state: AtomicU8,
    reconnects: AtomicU64,
}

impl ResilientSubmitter {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            slot: Mutex::new(None),
            state: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
            reconnects: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Total reconnects performed over the submitter's lifetime.
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
        metrics::record_upstream_connected(state == ConnectionState::Connected);
    }

    /// Open the initial connection eagerly. Failure is logged and left to the
    /// lazy path on first use.
    pub async fn warm_up(&self) {
        match self.current().await {
            Ok(conn) => tracing::info!(connection = %conn.id(), "Upstream connection ready"),
            Err(e) => tracing::warn!(
                endpoint = %self.connector.endpoint(),
                error = %e,
                "Initial upstream connection failed; will retry on first request"
            ),
        }
    }

    /// Execute `op` against the current connection.
    ///
    /// Transient disconnects trigger close → reopen → backoff sleep → retry, up to
    /// `policy.max_retries` times. Any other failure, or the transient failure
    /// that exhausts the budget, is returned unchanged. `op` may run more than
    /// once, so mutations are not exactly-once.
    pub async fn submit<T, F, Fut>(&self, policy: &RetryPolicy, mut op: F) -> GremlinResult<T>
    where
        F: FnMut(Arc<dyn Connection>) -> Fut,
        Fut: Future<Output = GremlinResult<T>>,
    {
        let mut retries: u32 = 0;

        loop {
            let conn = self.current().await?;

            let attempt = match op(conn.clone()).await {
                Ok(value) => Attempt::Done(value),
                Err(e) => match classify(&e) {
                    FailureClass::Transient => Attempt::Transient(e),
                    FailureClass::Fatal => Attempt::Fatal(e),
                },
            };

            match attempt {
                Attempt::Done(value) => {
                    metrics::record_submission("success", retries);
                    return Ok(value);
                }
                Attempt::Fatal(e) => {
                    tracing::debug!(error = %e, "Submission failed with non-transient error");
                    metrics::record_submission("fatal", retries);
                    return Err(e);
                }
                Attempt::Transient(e) if retries >= policy.max_retries => {
                    tracing::error!(
                        retries,
                        max_retries = policy.max_retries,
                        error = %e,
                        "Retries exhausted after transient disconnects"
                    );
                    metrics::record_submission("exhausted", retries);
                    return Err(e);
                }
                Attempt::Transient(e) => {
                    tracing::warn!(
                        connection = %conn.id(),
                        attempt = retries + 1,
                        error = %e,
                        "Upstream closed the connection, reconnecting"
                    );
                    self.replace(&conn).await?;
                    let delay = policy.backoff(retries);
                    retries += 1;
                    metrics::record_retry();
                    tracing::info!(retry = retries, delay = ?delay, "Retrying submission");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Current handle, opening one if the slot is empty.
    async fn current(&self) -> GremlinResult<Arc<dyn Connection>> {
        let mut slot = self.slot.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.open().await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn open(&self) -> GremlinResult<Arc<dyn Connection>> {
        match self.connector.connect().await {
            Ok(conn) => {
                self.set_state(ConnectionState::Connected);
                Ok(conn)
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Swap `stale` for a fresh handle.
    ///
    /// If another caller already replaced `stale`, the slot is left alone.
    async fn replace(&self, stale: &Arc<dyn Connection>) -> GremlinResult<()> {
        let mut slot = self.slot.lock().await;

        match slot.as_ref() {
            Some(current) if !Arc::ptr_eq(current, stale) => {
                tracing::debug!(
                    stale = %stale.id(),
                    current = %current.id(),
                    "Connection already replaced by a concurrent caller"
                );
                return Ok(());
            }
            _ => {}
        }

        self.set_state(ConnectionState::Reconnecting);
        if let Some(old) = slot.take() {
            if let Err(e) = old.close().await {
                tracing::debug!(connection = %old.id(), error = %e, "Ignoring close failure");
            }
        }

        let fresh = self.open().await?;
        self.reconnects.fetch_add(1, Ordering::Relaxed);
        metrics::record_reconnect();
        tracing::info!(stale = %stale.id(), fresh = %fresh.id(), "Upstream connection replaced");
        *slot = Some(fresh);
        Ok(())
    }

    /// Close the current handle, if any.
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(conn) = slot.take() {
            if let Err(e) = conn.close().await {
                tracing::debug!(connection = %conn.id(), error = %e, "Ignoring close failure");
            }
            tracing::info!(connection = %conn.id(), "Upstream connection closed");
        }
        self.set_state(ConnectionState::Disconnected);
    }
}

impl std::fmt::Debug for ResilientSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientSubmitter")
            .field("endpoint", &self.connector.endpoint())
            .field("state", &self.state())
            .field("reconnects", &self.reconnect_count())
            .finish()
    }
}
