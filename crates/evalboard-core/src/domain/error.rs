//! Domain-level error taxonomy for evalboard.

use crate::bus::PublishError;
use crate::domain::submission::Submission;

/// Errors produced by input validation at a stage boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// evalboard domain errors.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("unauthorized subject: {subject}")]
    Unauthorized { subject: String },

    /// The submission was persisted but part of the downstream chain failed.
    /// Work already stored by earlier stages is kept.
    #[error("submission {} accepted but dispatch failed: {source}", .submission.id)]
    Dispatch {
        submission: Box<Submission>,
        #[source]
        source: PublishError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] evalboard_store::StorageError),
}

/// Errors produced by an evaluator while scoring a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("evaluation of submission {submission_id} failed: {reason}")]
    Failed {
        submission_id: String,
        reason: String,
    },
}

/// Result type for evalboard domain operations.
pub type Result<T> = std::result::Result<T, BoardError>;
