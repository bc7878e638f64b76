//! Point-in-time health sampling.
//!
//! The reporter only observes: it reads the connection state and process
//! memory but never touches the connection itself.

use super::connection::{ConnectionState, ConnectionStateReader};
use chrono::{DateTime, SecondsFormat, Utc};
use service_core::error::AppError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
#[error("memory sampling failed: {0}")]
pub struct SamplingError(pub String);

impl From<SamplingError> for AppError {
    fn from(err: SamplingError) -> Self {
        AppError::ServiceUnavailable(err.to_string())
    }
}

/// Process memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub reserved_bytes: u64,
}

impl MemoryUsage {
    pub fn used_mb(&self) -> u64 {
        bytes_to_mb(self.used_bytes)
    }

    pub fn reserved_mb(&self) -> u64 {
        bytes_to_mb(self.reserved_bytes)
    }
}

fn bytes_to_mb(bytes: u64) -> u64 {
    (bytes as f64 / 1024.0 / 1024.0).round() as u64
}

/// Source of process memory figures.
pub trait MemoryProbe: Send + Sync {
    fn sample(&self) -> Result<MemoryUsage, SamplingError>;
}

/// Reads resident and virtual size of the current process via `sysinfo`.
pub struct ProcessMemoryProbe {
    system: Mutex<System>,
}

impl ProcessMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn sample(&self) -> Result<MemoryUsage, SamplingError> {
        let pid: Pid = sysinfo::get_current_pid().map_err(|e| SamplingError(e.to_string()))?;

        let mut system = self
            .system
            .lock()
            .map_err(|_| SamplingError("system information lock poisoned".to_string()))?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let process = system
            .process(pid)
            .ok_or_else(|| SamplingError(format!("process {} not found", pid)))?;

        Ok(MemoryUsage {
            used_bytes: process.memory(),
            reserved_bytes: process.virtual_memory(),
        })
    }
}

/// Immutable result of one [`HealthReporter::sample`] call.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub timestamp: DateTime<Utc>,
    pub uptime: Duration,
    pub memory: MemoryUsage,
    pub database: ConnectionState,
}

#[derive(Clone)]
pub struct HealthReporter {
    started_at: Instant,
    connection: ConnectionStateReader,
    probe: Arc<dyn MemoryProbe>,
}

impl HealthReporter {
    pub fn new(connection: ConnectionStateReader, probe: Arc<dyn MemoryProbe>) -> Self {
        Self {
            started_at: Instant::now(),
            connection,
            probe,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn database(&self) -> ConnectionState {
        self.connection.current()
    }

    pub fn sample(&self) -> Result<StatusSnapshot, SamplingError> {
        let memory = self.probe.sample()?;

        Ok(StatusSnapshot {
            timestamp: Utc::now(),
            uptime: self.uptime(),
            memory,
            database: self.database(),
        })
    }
}

/// `2024-01-02T03:04:05.678Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
