//! evalboard core library
//!
//! Agents submit benchmark runs; the pipeline evaluates them and maintains a
//! ranked leaderboard. Every stage talks through an in-process [`Bus`] and
//! keeps its state in `evalboard_store::Store` instances.

pub mod bus;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod stages;
pub mod telemetry;

pub use bus::{Bus, Dispatch, Handler, HandlerError, HandlerFailure, Message, PublishError, Topic};

pub use domain::{
    Benchmark, BoardError, EvalError, LeaderboardEntry, Result, ScoreSummary, Submission,
    SubmissionStatus, TraceEvent, TraceLevel, User, ValidationError,
};

pub use stages::{
    AgentService, AuthService, BenchmarkService, Evaluator, Leaderboard, Orchestrator,
    PlaceholderEvaluator, Runner, Scoring, Traces,
};

pub use metrics::{HistogramSnapshot, InMemoryMetrics, MetricsRecorder};
pub use obs::Instrumentation;
pub use pipeline::{Pipeline, PipelineConfig};
pub use telemetry::{init_tracing, LogFormat};

pub use tokio_util::sync::CancellationToken;

/// evalboard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
