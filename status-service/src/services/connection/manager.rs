use super::connector::{Connector, PoolConfig};
use super::state::{ConnectionState, ConnectionStateReader, StateCell};
use metrics::counter;
use service_core::error::AppError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Timing of the retry loop. The delay is constant: no backoff, no cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_delay: Duration,
    pub heartbeat_interval: Duration,
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.retry_delay.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "retry_delay must be greater than zero"
            )));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "heartbeat_interval must be greater than zero"
            )));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Owns the document-store connection lifecycle.
///
/// `start` spawns a background task that connects, retries forever on a
/// fixed delay and, once connected, heartbeats the server so a lost
/// connection is noticed and re-established. The task is the only writer of
/// the connection state; readers come from [`ConnectionManager::reader`].
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    policy: RetryPolicy,
    state: StateCell,
    started: AtomicBool,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                policy,
                state: StateCell::new(),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Begin connecting in the background and return immediately.
    ///
    /// An empty URI, inconsistent pool settings or zero timings are rejected
    /// here instead of being retried forever. A manager can only be started
    /// once.
    pub fn start(&self, uri: impl Into<String>, pool: PoolConfig) -> Result<(), AppError> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MongoDB connection URI must be a non-empty connection string"
            )));
        }
        pool.validate()?;
        self.inner.policy.validate()?;

        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "connection manager already started"
            )));
        }

        let inner = self.inner.clone();
        tokio::spawn(async move { inner.run(uri, pool).await });
        Ok(())
    }

    pub fn current_state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    pub fn reader(&self) -> ConnectionStateReader {
        self.inner.state.reader()
    }
}

impl Inner {
    async fn run(&self, uri: String, pool: PoolConfig) {
        loop {
            self.state.transition(ConnectionState::Connecting);

            match bounded(pool.socket_timeout, self.connector.connect(&uri, &pool)).await {
                Ok(()) => {
                    counter!("db_connection_attempts_total", "outcome" => "success").increment(1);
                    self.state.transition(ConnectionState::Connected);
                    tracing::info!("MongoDB connected successfully");

                    self.monitor(&pool).await;
                }
                Err(e) => {
                    counter!("db_connection_attempts_total", "outcome" => "failure").increment(1);
                    self.state.transition(ConnectionState::Disconnected);
                    tracing::error!(
                        error = %e,
                        retry_in_secs = self.policy.retry_delay.as_secs_f64(),
                        "MongoDB connection error"
                    );
                }
            }

            sleep(self.policy.retry_delay).await;
        }
    }

    /// Heartbeat until the connection is lost, leaving the state `Disconnected`.
    async fn monitor(&self, pool: &PoolConfig) {
        loop {
            sleep(self.policy.heartbeat_interval).await;

            if let Err(e) = bounded(pool.socket_timeout, self.connector.ping()).await {
                self.state.transition(ConnectionState::Disconnected);
                tracing::warn!(error = %e, "MongoDB connection lost");
                return;
            }
        }
    }
}

async fn bounded<F>(limit: Duration, operation: F) -> Result<(), AppError>
where
    F: Future<Output = Result<(), AppError>>,
{
    match timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(AppError::DatabaseError(anyhow::anyhow!(
            "operation timed out after {}s",
            limit.as_secs_f64()
        ))),
    }
}
