//! Submissions and their lifecycle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use evalboard_store::Record;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a submission.
///
/// `Submitted -> Running -> Completed | Failed`. Only the runner stage moves a
/// submission out of `Submitted`; the transition methods are crate-private.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Submitted,
    Running,
    Completed,
    Failed,
}

impl SubmissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionStatus::Completed | SubmissionStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Running => "running",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a submission. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub score: f64,
    pub metrics: BTreeMap<String, f64>,
    pub calculated_at: DateTime<Utc>,
}

impl ScoreSummary {
    pub fn new(score: f64, metrics: BTreeMap<String, f64>) -> Self {
        Self {
            score,
            metrics,
            calculated_at: Utc::now(),
        }
    }
}

/// A benchmark run submitted by an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Unique identifier, assigned by the orchestrator.
    pub id: String,

    pub agent_id: String,

    pub benchmark_id: String,

    /// Opaque run payload handed to the evaluator.
    pub payload: String,

    pub submitted_at: DateTime<Utc>,

    /// Set exactly when the status is terminal.
    pub completed_at: Option<DateTime<Utc>>,

    pub status: SubmissionStatus,

    /// Set exactly when the status is `Completed`.
    pub score_summary: Option<ScoreSummary>,
}

impl Submission {
    /// Create a fresh submission in the `Submitted` state.
    pub fn new(agent_id: String, benchmark_id: String, payload: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id,
            benchmark_id,
            payload,
            submitted_at: Utc::now(),
            completed_at: None,
            status: SubmissionStatus::Submitted,
            score_summary: None,
        }
    }

    /// Whether `completed_at` and `score_summary` agree with `status`.
    pub fn is_consistent(&self) -> bool {
        self.completed_at.is_some() == self.status.is_terminal()
            && self.score_summary.is_some() == (self.status == SubmissionStatus::Completed)
    }

    /// Score summary of a completed, consistent submission; `None` for
    /// anything else, including hand-built payloads that break the lifecycle.
    pub fn scored(&self) -> Option<&ScoreSummary> {
        if self.status != SubmissionStatus::Completed || !self.is_consistent() {
            return None;
        }
        self.score_summary.as_ref()
    }

    pub(crate) fn start(mut self) -> Self {
        self.status = SubmissionStatus::Running;
        self
    }

    pub(crate) fn complete(mut self, summary: ScoreSummary, at: DateTime<Utc>) -> Self {
        self.status = SubmissionStatus::Completed;
        self.completed_at = Some(at);
        self.score_summary = Some(summary);
        self
    }

    pub(crate) fn fail(mut self, at: DateTime<Utc>) -> Self {
        self.status = SubmissionStatus::Failed;
        self.completed_at = Some(at);
        self.score_summary = None;
        self
    }
}

impl Record for Submission {
    fn record_key(&self) -> String {
        self.id.clone()
    }
}
