pub mod app;
pub mod health;
pub mod metrics;

pub use app::{api_test, not_found};
pub use health::{health_check, status};
pub use self::metrics::metrics_endpoint;
