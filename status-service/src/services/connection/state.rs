use metrics::gauge;
use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

/// Lifecycle of the document-store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Whether the retry loop may move from `self` to `next`.
    ///
    /// `Disconnected -> Connected` is never valid: every successful connect
    /// goes through `Connecting` first.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }

    /// Label reported by the health endpoints.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::Connecting | ConnectionState::Disconnected => "Disconnected",
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    fn gauge_value(self) -> f64 {
        match self {
            ConnectionState::Disconnected => 0.0,
            ConnectionState::Connecting => 1.0,
            ConnectionState::Connected => 2.0,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Single-writer cell holding the current [`ConnectionState`].
///
/// Only the connection manager owns one; everybody else gets a
/// [`ConnectionStateReader`].
pub(crate) struct StateCell {
    tx: watch::Sender<ConnectionState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx }
    }

    pub(crate) fn get(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub(crate) fn reader(&self) -> ConnectionStateReader {
        ConnectionStateReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Apply `next` if it is a legal move from the current state.
    /// Returns whether the state changed.
    pub(crate) fn transition(&self, next: ConnectionState) -> bool {
        let mut previous = None;
        let applied = self.tx.send_if_modified(|current| {
            if current.can_transition_to(next) {
                previous = Some(*current);
                *current = next;
                true
            } else {
                false
            }
        });

        if applied {
            tracing::debug!(from = ?previous, to = %next, "Connection state changed");
            gauge!("db_connection_state").set(next.gauge_value());
        } else {
            tracing::warn!(
                current = %self.get(),
                rejected = %next,
                "Ignoring invalid connection state transition"
            );
        }

        applied
    }
}

/// Read-only view of the connection state, cheap to clone.
#[derive(Clone)]
pub struct ConnectionStateReader {
    rx: watch::Receiver<ConnectionState>,
}

impl ConnectionStateReader {
    /// Latest state; never blocks on the retry loop.
    pub fn current(&self) -> ConnectionState {
        *self.rx.borrow()
    }

    /// Wait until the state satisfies `predicate`, returning that state.
    /// Returns `None` once the owning manager is gone.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<ConnectionState>
    where
        F: FnMut(ConnectionState) -> bool,
    {
        self.rx
            .wait_for(|state| predicate(*state))
            .await
            .ok()
            .map(|state| *state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    #[test]
    fn transition_table() {
        assert!(Disconnected.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connecting.can_transition_to(Disconnected));
        assert!(Connected.can_transition_to(Disconnected));

        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Connecting));
        for state in [Disconnected, Connecting, Connected] {
            assert!(!state.can_transition_to(state));
        }
    }

    #[test]
    fn only_connected_is_labelled_connected() {
        assert_eq!(Connected.label(), "Connected");
        assert_eq!(Connecting.label(), "Disconnected");
        assert_eq!(Disconnected.label(), "Disconnected");
    }

    #[test]
    fn cell_rejects_skipping_connecting() {
        let cell = StateCell::new();
        let reader = cell.reader();

        assert!(!cell.transition(Connected));
        assert_eq!(reader.current(), Disconnected);

        assert!(cell.transition(Connecting));
        assert!(cell.transition(Connected));
        assert_eq!(reader.current(), Connected);
    }

    #[tokio::test]
    async fn reader_observes_changes() {
        let cell = StateCell::new();
        let mut reader = cell.reader();

        let waiter = tokio::spawn(async move { reader.wait_for(|s| s.is_connected()).await });

        cell.transition(Connecting);
        cell.transition(Connected);

        assert_eq!(waiter.await.unwrap(), Some(Connected));
    }
}
