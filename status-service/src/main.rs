use service_core::observability::init_tracing;
use status_service::config::StatusConfig;
use status_service::services::init_metrics;
use status_service::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StatusConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "status-service",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    init_metrics()?;

    let app = Application::build(config).await?;
    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
