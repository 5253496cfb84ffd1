//! Static reference entities created by direct calls.

use chrono::{DateTime, Utc};
use evalboard_store::Record;
use serde::{Deserialize, Serialize};

/// A benchmark suite definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// An authenticated subject. Agents are registered as users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Record for Benchmark {
    fn record_key(&self) -> String {
        self.id.clone()
    }
}

impl Record for User {
    fn record_key(&self) -> String {
        self.id.clone()
    }
}
