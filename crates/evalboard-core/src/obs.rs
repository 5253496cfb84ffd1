//! Structured observability hooks for the submission pipeline.
//!
//! This module provides:
//! - [`Instrumentation`], the stage identity and metrics sink every stage and
//!   the bus receive once at construction
//! - Emission functions for key pipeline events: submission accepted, run
//!   finished, message ignored, handler failed, ranks recomputed
//!
//! Events are emitted at `info!` level (failures at `warn!`). Filter with
//! `RUST_LOG`; see [`crate::telemetry::init_tracing`] for JSON output.

use std::sync::Arc;

use tracing::{info, warn};

use crate::metrics::{Labels, MetricsRecorder};

/// Stage identity plus the metrics capability it records into.
#[derive(Debug, Clone)]
pub struct Instrumentation {
    stage: &'static str,
    metrics: Arc<dyn MetricsRecorder>,
}

impl Instrumentation {
    pub fn new(stage: &'static str, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self { stage, metrics }
    }

    /// Same metrics sink, different stage identity.
    pub fn for_stage(&self, stage: &'static str) -> Self {
        Self {
            stage,
            metrics: Arc::clone(&self.metrics),
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn metrics(&self) -> &dyn MetricsRecorder {
        self.metrics.as_ref()
    }

    pub fn count(&self, name: &str, labels: Labels<'_>) {
        self.metrics.add_counter(name, labels, 1.0);
    }
}

/// Emit event: a submission was persisted by the orchestrator.
pub fn emit_submission_accepted(submission_id: &str, agent_id: &str, benchmark_id: &str) {
    info!(
        event = "submission.accepted",
        submission_id = %submission_id,
        agent_id = %agent_id,
        benchmark_id = %benchmark_id,
    );
}

/// Emit event: the runner reached a terminal status for a submission.
pub fn emit_run_finished(submission_id: &str, status: &str, duration_ms: u64) {
    info!(
        event = "run.finished",
        submission_id = %submission_id,
        status = %status,
        duration_ms = duration_ms,
    );
}

/// Emit event: a stage received a message variant it does not process.
pub fn emit_message_ignored(stage: &str, topic: &str) {
    info!(event = "message.ignored", stage = %stage, topic = %topic);
}

/// Emit event: a bus handler returned an error (warning level).
pub fn emit_handler_failed(topic: &str, handler: &str, error: &dyn std::fmt::Display) {
    warn!(event = "handler.failed", topic = %topic, handler = %handler, error = %error);
}

/// Emit event: a stage persisted its work but the downstream publish failed.
pub fn emit_publish_failed(stage: &str, submission_id: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "publish.failed",
        stage = %stage,
        submission_id = %submission_id,
        error = %error,
    );
}

/// Emit event: the leaderboard rewrote ranks for one benchmark group.
pub fn emit_ranks_recomputed(benchmark_id: &str, entries: usize) {
    info!(event = "leaderboard.ranked", benchmark_id = %benchmark_id, entries = entries);
}
