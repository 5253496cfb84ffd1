//! Trace events recorded against submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a trace event.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl TraceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceLevel::Debug => "debug",
            TraceLevel::Info => "info",
            TraceLevel::Warn => "warn",
            TraceLevel::Error => "error",
        }
    }
}

/// A single append-only log entry about a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    pub id: String,
    pub submission_id: String,
    pub message: String,
    pub level: TraceLevel,
    pub timestamp: DateTime<Utc>,
}

impl TraceEvent {
    pub fn new(submission_id: String, message: String, level: TraceLevel) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            submission_id,
            message,
            level,
            timestamp: Utc::now(),
        }
    }
}
