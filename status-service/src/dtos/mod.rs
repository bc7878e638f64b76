use crate::services::health::{iso_timestamp, StatusSnapshot};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub environment: String,
    /// Seconds since process start.
    pub uptime: f64,
    pub database: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReport {
    pub heap_used: String,
    pub heap_total: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub memory: MemoryReport,
    pub uptime: f64,
    pub timestamp: String,
}

impl From<&StatusSnapshot> for StatusResponse {
    fn from(snapshot: &StatusSnapshot) -> Self {
        Self {
            status: "healthy",
            database: snapshot.database.label(),
            memory: MemoryReport {
                heap_used: format!("{} MB", snapshot.memory.used_mb()),
                heap_total: format!("{} MB", snapshot.memory.reserved_mb()),
            },
            uptime: snapshot.uptime.as_secs_f64(),
            timestamp: iso_timestamp(snapshot.timestamp),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnhealthyResponse {
    pub status: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub message: &'static str,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct NotFoundResponse {
    pub success: bool,
    pub message: &'static str,
    pub path: String,
}
