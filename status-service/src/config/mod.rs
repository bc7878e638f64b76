use crate::services::connection::{PoolConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RETRY_DELAY};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StatusConfig {
    pub common: core_config::Config,
    /// Deployment label echoed by `/api/health` and `/api/test`.
    pub environment: String,
    /// Browser origin allowed by CORS.
    pub frontend_url: String,
    pub static_dir: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub pool: PoolConfig,
    pub retry_delay: Duration,
    pub heartbeat_interval: Duration,
}

impl StatusConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `load` feeds it the process environment.
    pub fn from_lookup<F>(mut common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            common.port = parse_value("PORT", &port)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            common.log_level = level;
        }

        let defaults = PoolConfig::default();

        // Mirrors `parseInt(DATABASE_POOL_SIZE) || 10`: garbage means default.
        let max_pool_size = lookup("DATABASE_POOL_SIZE")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_pool_size);

        let min_pool_size = optional("DATABASE_MIN_POOL_SIZE", &lookup)?
            .unwrap_or(defaults.min_pool_size)
            .min(max_pool_size);

        let socket_timeout = positive_secs("DATABASE_SOCKET_TIMEOUT_SECS", &lookup)?
            .unwrap_or(defaults.socket_timeout);

        let retry_delay =
            positive_secs("DATABASE_RETRY_DELAY_SECS", &lookup)?.unwrap_or(DEFAULT_RETRY_DELAY);

        let heartbeat_interval = positive_secs("DATABASE_HEARTBEAT_SECS", &lookup)?
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or_else(|| "development".to_string());

        Ok(StatusConfig {
            common,
            environment,
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "status-service/static".to_string()),
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.is_empty()),
            mongodb: MongoConfig {
                // Emptiness is rejected by the connection manager at start.
                uri: lookup("MONGODB_URI").unwrap_or_default(),
                database: lookup("MONGODB_DATABASE").unwrap_or_else(|| "admin".to_string()),
                pool: PoolConfig {
                    max_pool_size,
                    min_pool_size,
                    socket_timeout,
                },
                retry_delay,
                heartbeat_interval,
            },
        })
    }

}

fn optional<T, F>(key: &str, lookup: &F) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| parse_value(key, &v)).transpose()
}

/// Whole seconds; zero is rejected since it disables the timing it sets.
fn positive_secs<F>(key: &str, lookup: &F) -> Result<Option<Duration>, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional::<u64, F>(key, lookup)? {
        Some(0) => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be greater than zero",
            key
        ))),
        secs => Ok(secs.map(Duration::from_secs)),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, value, e))
    })
}
