//! Application startup and lifecycle management.
//!
//! Starts the connection manager without waiting for the database, then
//! serves the API, metrics and the static frontend.

use crate::config::StatusConfig;
use crate::handlers;
use crate::services::{
    ConnectionManager, Connector, HealthReporter, MemoryProbe, MongoConnector, ProcessMemoryProbe,
    RetryPolicy,
};
use axum::{
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use service_core::error::{AppError, ErrorResponse};
use service_core::middleware::{
    cors_layer, metrics_middleware, request_id_middleware, request_logging_middleware,
    security_headers_middleware, REQUEST_ID_HEADER,
};
use std::any::Any;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: StatusConfig,
    pub reporter: HealthReporter,
}

/// Routes without middleware.
pub fn routes(config: &StatusConfig) -> Router<AppState> {
    let static_dir = Path::new(&config.static_dir);

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/status", get(handlers::status))
        .route("/api/test", get(handlers::api_test))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(handlers::not_found)
}

/// Wrap `router` in the HTTP middleware stack.
pub fn with_middleware(
    router: Router<AppState>,
    config: &StatusConfig,
) -> Result<Router<AppState>, AppError> {
    Ok(router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&config.frontend_url)?)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_logging_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware)))
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let router = with_middleware(routes(&state.config), &state.config)?;
    Ok(router.with_state(state))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(message = %detail, "Unhandled error");

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (status, Json(ErrorResponse::new(status, "Internal server error"))).into_response()
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    connection: ConnectionManager,
}

impl Application {
    /// Build the application against MongoDB and the real process probe.
    pub async fn build(config: StatusConfig) -> Result<Self, AppError> {
        let connector = Arc::new(MongoConnector::new(config.mongodb.database.clone()));
        let probe = Arc::new(ProcessMemoryProbe::new());
        Self::build_with(config, connector, probe).await
    }

    pub async fn build_with(
        config: StatusConfig,
        connector: Arc<dyn Connector>,
        probe: Arc<dyn MemoryProbe>,
    ) -> Result<Self, AppError> {
        let connection = ConnectionManager::new(
            connector,
            RetryPolicy {
                retry_delay: config.mongodb.retry_delay,
                heartbeat_interval: config.mongodb.heartbeat_interval,
            },
        );
        let reporter = HealthReporter::new(connection.reader(), probe);

        connection
            .start(config.mongodb.uri.clone(), config.mongodb.pool.clone())
            .map_err(|e| {
                tracing::error!("Failed to start connection manager: {}", e);
                e
            })?;

        let state = AppState {
            config: config.clone(),
            reporter,
        };
        let router = build_router(state)?;

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(environment = %config.environment, "Server running on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
            connection,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
