//! Domain models for evalboard.
//!
//! Canonical definitions for the core entities:
//! - `Submission`: a benchmark run submitted by an agent, and its lifecycle
//! - `ScoreSummary`: the evaluation outcome embedded in a completed submission
//! - `TraceEvent`: append-only log lines about a submission
//! - `LeaderboardEntry`: ranked projection of a scored submission
//! - `Benchmark`, `User`: static reference data

pub mod error;
pub mod leaderboard;
pub mod reference;
pub mod submission;
pub mod trace;
pub mod validation;

// Re-export main types and errors
pub use error::{BoardError, EvalError, Result, ValidationError};
pub use leaderboard::LeaderboardEntry;
pub use reference::{Benchmark, User};
pub use submission::{ScoreSummary, Submission, SubmissionStatus};
pub use trace::{TraceEvent, TraceLevel};
