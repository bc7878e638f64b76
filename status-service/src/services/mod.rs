pub mod connection;
pub mod health;
pub mod metrics;

pub use connection::{
    ConnectionManager, ConnectionState, ConnectionStateReader, Connector, MongoConnector,
    PoolConfig, RetryPolicy,
};
pub use health::{
    HealthReporter, MemoryProbe, MemoryUsage, ProcessMemoryProbe, SamplingError, StatusSnapshot,
};
pub use self::metrics::{get_metrics, init_metrics};
