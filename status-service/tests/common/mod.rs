use service_core::config::Config as CoreConfig;
use status_service::config::StatusConfig;
use status_service::services::connection::MockConnector;
use status_service::services::{ConnectionManager, MemoryProbe, MemoryUsage, SamplingError};
use status_service::startup::Application;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct FixedProbe;

impl MemoryProbe for FixedProbe {
    fn sample(&self) -> Result<MemoryUsage, SamplingError> {
        Ok(MemoryUsage {
            used_bytes: 64 * 1024 * 1024,
            reserved_bytes: 256 * 1024 * 1024,
        })
    }
}

pub struct BrokenProbe;

impl MemoryProbe for BrokenProbe {
    fn sample(&self) -> Result<MemoryUsage, SamplingError> {
        Err(SamplingError("platform memory counters unavailable".to_string()))
    }
}

pub fn test_config(vars: &[(&str, &str)]) -> StatusConfig {
    let mut env: HashMap<String, String> = HashMap::from([
        ("MONGODB_URI".to_string(), "mongodb://localhost:27017".to_string()),
        ("ENVIRONMENT".to_string(), "test".to_string()),
    ]);
    for (k, v) in vars {
        env.insert(k.to_string(), v.to_string());
    }

    let mut config = StatusConfig::from_lookup(CoreConfig::default(), |key| env.get(key).cloned())
        .expect("Failed to build test configuration");
    config.common.port = 0; // Random port for testing
    config.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string();
    config.mongodb.retry_delay = Duration::from_millis(50);
    config.mongodb.heartbeat_interval = Duration::from_millis(50);
    config
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub connection: ConnectionManager,
    pub connector: Arc<MockConnector>,
    client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockConnector::succeeding(), Arc::new(FixedProbe)).await
    }

    pub async fn spawn_with(connector: MockConnector, probe: Arc<dyn MemoryProbe>) -> Self {
        let connector = Arc::new(connector);
        let app = Application::build_with(test_config(&[]), connector.clone(), probe)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let connection = app.connection().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/api/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            connection,
            connector,
            client,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Block until the connection manager reports `Connected`.
    pub async fn wait_until_connected(&self) {
        let mut reader = self.connection.reader();
        tokio::time::timeout(Duration::from_secs(5), reader.wait_for(|s| s.is_connected()))
            .await
            .expect("connection was not established in time");
    }
}
