//! Community alerts and user reports.
//!
//! A small repository over a local key-value store. No sync, no
//! accounts: one device, one list.

mod feed;
mod report;
mod storage;

pub use feed::{default_alerts, AlertStore, STORAGE_KEY};
pub use report::{ReportError, ReportForm};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// How serious an alert or detected adulterant is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// One entry of the alert feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    /// Relative, human-readable time ("Just now", "2 hours ago").
    pub time: String,
    pub severity: Severity,
}

/// Errors from the alert store.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode alerts: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid report: {0}")]
    Invalid(#[from] ReportError),
}
