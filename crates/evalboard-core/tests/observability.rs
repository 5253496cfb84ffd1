//! Structured log events emitted while a submission moves through the pipeline.

use std::sync::Arc;

use evalboard_core::obs::{emit_handler_failed, emit_ranks_recomputed, emit_run_finished};
use evalboard_core::{CancellationToken, InMemoryMetrics, Pipeline, PipelineConfig};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_run_finished_logs_status() {
    emit_run_finished("sub-1", "completed", 12);
    assert!(logs_contain("run.finished"));
    assert!(logs_contain("completed"));
}

#[traced_test]
#[test]
fn test_emit_handler_failed_logs_warning() {
    emit_handler_failed("score.calculated", "audit", &"refused");
    assert!(logs_contain("handler.failed"));
    assert!(logs_contain("WARN"));
}

#[traced_test]
#[test]
fn test_emit_ranks_recomputed_logs_group() {
    emit_ranks_recomputed("b1", 3);
    assert!(logs_contain("leaderboard.ranked"));
}

#[traced_test]
#[tokio::test]
async fn test_submit_emits_lifecycle_events() {
    let metrics = Arc::new(InMemoryMetrics::new());
    let p = Pipeline::new(PipelineConfig::default().with_metrics(metrics.clone())).unwrap();
    let cancel = CancellationToken::new();

    let s = p
        .orchestrator()
        .submit(&cancel, "a1", "b1", "x")
        .await
        .unwrap();

    assert!(logs_contain("submission.accepted"));
    assert!(logs_contain("run.finished"));
    assert!(logs_contain("leaderboard.ranked"));
    assert!(logs_contain(&s.id));

    metrics.flush();
    assert!(logs_contain("orchestrator_submissions_total"));
}
