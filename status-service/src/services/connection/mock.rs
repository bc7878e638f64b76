//! Scripted [`Connector`] for exercising the retry loop without a database.

use super::connector::{Connector, PoolConfig};
use super::state::{ConnectionState, ConnectionStateReader};
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

/// What a single connect attempt does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Succeed,
    Fail(String),
    /// Never completes; only the attempt timeout ends it.
    Hang,
}

pub struct MockConnector {
    script: Mutex<VecDeque<MockOutcome>>,
    fallback: MockOutcome,
    ping_healthy: AtomicBool,
    attempts: AtomicUsize,
    pings: AtomicUsize,
    observer: OnceLock<ConnectionStateReader>,
    seen_at_connect: Mutex<Vec<ConnectionState>>,
}

impl MockConnector {
    /// Plays `script` in order, then repeats `fallback` forever.
    pub fn new(script: impl IntoIterator<Item = MockOutcome>, fallback: MockOutcome) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            ping_healthy: AtomicBool::new(true),
            attempts: AtomicUsize::new(0),
            pings: AtomicUsize::new(0),
            observer: OnceLock::new(),
            seen_at_connect: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new([], MockOutcome::Succeed)
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::new([], MockOutcome::Fail(reason.into()))
    }

    pub fn failing_then_succeeding(failures: usize) -> Self {
        let script =
            (0..failures).map(|i| MockOutcome::Fail(format!("scripted failure {}", i + 1)));
        Self::new(script, MockOutcome::Succeed)
    }

    pub fn hanging() -> Self {
        Self::new([], MockOutcome::Hang)
    }

    /// Record the manager's state each time `connect` is entered.
    pub fn observe(&self, reader: ConnectionStateReader) {
        let _ = self.observer.set(reader);
    }

    pub fn set_ping_healthy(&self, healthy: bool) {
        self.ping_healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn states_seen_at_connect(&self) -> Vec<ConnectionState> {
        self.seen_at_connect
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }

    fn next_outcome(&self) -> MockOutcome {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _uri: &str, _pool: &PoolConfig) -> Result<(), AppError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(reader) = self.observer.get() {
            if let Ok(mut seen) = self.seen_at_connect.lock() {
                seen.push(reader.current());
            }
        }

        match self.next_outcome() {
            MockOutcome::Succeed => Ok(()),
            MockOutcome::Fail(reason) => Err(AppError::DatabaseError(anyhow::anyhow!(reason))),
            MockOutcome::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.ping_healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::DatabaseError(anyhow::anyhow!("server went away")))
        }
    }
}
