use async_trait::async_trait;
use service_core::error::AppError;
use std::time::Duration;

/// Pool settings handed to the driver on every connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    /// Upper bound for a single connect attempt or heartbeat ping.
    pub socket_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            min_pool_size: 5,
            socket_timeout: Duration::from_secs(45),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_pool_size == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "max_pool_size must be at least 1"
            )));
        }
        if self.min_pool_size > self.max_pool_size {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "min_pool_size ({}) exceeds max_pool_size ({})",
                self.min_pool_size,
                self.max_pool_size
            )));
        }
        if self.socket_timeout.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "socket_timeout must be greater than zero"
            )));
        }
        Ok(())
    }
}

/// Seam between the retry loop and the document store driver.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Establish a connection and confirm the server answers.
    async fn connect(&self, uri: &str, pool: &PoolConfig) -> Result<(), AppError>;

    /// Check that the established connection is still usable.
    async fn ping(&self) -> Result<(), AppError>;
}
