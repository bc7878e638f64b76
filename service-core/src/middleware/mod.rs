pub mod cors;
pub mod metrics;
pub mod security_headers;
pub mod tracing;

pub use cors::cors_layer;
pub use self::metrics::metrics_middleware;
pub use security_headers::security_headers_middleware;
pub use self::tracing::{REQUEST_ID_HEADER, request_id_middleware, request_logging_middleware};
