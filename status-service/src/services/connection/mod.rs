//! Document-store connection lifecycle.
//!
//! [`ConnectionManager`] drives a background retry loop through the
//! [`Connector`] seam and publishes a [`ConnectionState`] that request
//! handlers observe through a [`ConnectionStateReader`].

pub mod connector;
pub mod manager;
pub mod mock;
pub mod mongo;
pub mod state;

pub use connector::{Connector, PoolConfig};
pub use manager::{ConnectionManager, RetryPolicy, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RETRY_DELAY};
pub use mock::{MockConnector, MockOutcome};
pub use mongo::MongoConnector;
pub use state::{ConnectionState, ConnectionStateReader};
