use super::connector::{Connector, PoolConfig};
use async_trait::async_trait;
use mongodb::{bson::doc, options::ClientOptions, Client as MongoClient};
use service_core::error::AppError;
use tokio::sync::RwLock;

/// [`Connector`] backed by the official MongoDB driver.
pub struct MongoConnector {
    database: String,
    client: RwLock<Option<MongoClient>>,
}

impl MongoConnector {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            client: RwLock::new(None),
        }
    }

    /// Client from the most recent successful connect, if any.
    pub async fn client(&self) -> Option<MongoClient> {
        self.client.read().await.clone()
    }

    async fn ping_with(&self, client: &MongoClient) -> Result<(), AppError> {
        client
            .database(&self.database)
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(&self, uri: &str, pool: &PoolConfig) -> Result<(), AppError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.max_pool_size = Some(pool.max_pool_size);
        options.min_pool_size = Some(pool.min_pool_size);
        options.app_name = Some("status-service".to_string());

        tracing::info!(
            hosts = ?options.hosts,
            max_pool_size = pool.max_pool_size,
            min_pool_size = pool.min_pool_size,
            "Connecting to MongoDB"
        );

        // Client construction is lazy; the ping is what proves reachability.
        let client = MongoClient::with_options(options)?;
        self.ping_with(&client).await?;

        *self.client.write().await = Some(client);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        let client = self.client().await.ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("no MongoDB client has been established"))
        })?;
        self.ping_with(&client).await
    }
}
