//! HTTP routes over the submission pipeline.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | POST | /auth | authenticate a subject by email |
//! | GET, POST | /agents | list / register agents |
//! | GET, POST | /benchmarks | list / create benchmarks |
//! | GET, POST | /submissions | list accepted / submit |
//! | GET | /submissions/{id} | latest view of one submission |
//! | GET | /results | runner results |
//! | GET | /scores | score summaries |
//! | GET, POST | /traces | list / record trace events |
//! | GET | /leaderboard | full board |
//! | GET | /leaderboard/{benchmark_id} | one benchmark group |
//! | GET | /health | liveness |
//!
//! Other methods on these paths get a bodiless 405 from the method router.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use evalboard_core::{
    Benchmark, LeaderboardEntry, Pipeline, ScoreSummary, Submission, TraceEvent, TraceLevel, User,
    VERSION,
};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    /// Parent of every per-request dispatch token.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, shutdown: CancellationToken) -> Self {
        Self { pipeline, shutdown }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterAgentRequest {
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBenchmarkRequest {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitRequest {
    pub agent_id: String,
    pub benchmark_id: String,
    pub payload: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordTraceRequest {
    pub submission_id: String,
    pub message: String,
    pub level: TraceLevel,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth", post(authenticate))
        .route("/agents", get(list_agents).post(register_agent))
        .route("/benchmarks", get(list_benchmarks).post(create_benchmark))
        .route("/submissions", get(list_submissions).post(submit))
        .route("/submissions/{id}", get(get_submission))
        .route("/results", get(list_results))
        .route("/scores", get(list_scores))
        .route("/traces", get(list_traces).post(record_trace))
        .route("/leaderboard", get(leaderboard))
        .route("/leaderboard/{benchmark_id}", get(benchmark_leaderboard))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "http: request"
    );
    response
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

async fn authenticate(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(state.pipeline.auth().authenticate(&req.email)?))
}

async fn list_agents(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.pipeline.agents().list())
}

async fn register_agent(
    State(state): State<AppState>,
    Json(req): Json<RegisterAgentRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let agent = state
        .pipeline
        .agents()
        .register(&req.id, &req.email, &req.role)?;
    Ok((StatusCode::CREATED, Json(agent)))
}

async fn list_benchmarks(State(state): State<AppState>) -> Json<Vec<Benchmark>> {
    Json(state.pipeline.benchmarks().list())
}

async fn create_benchmark(
    State(state): State<AppState>,
    Json(req): Json<CreateBenchmarkRequest>,
) -> AppResult<(StatusCode, Json<Benchmark>)> {
    let benchmark = state
        .pipeline
        .benchmarks()
        .create(&req.id, &req.name, &req.description)?;
    Ok((StatusCode::CREATED, Json(benchmark)))
}

async fn list_submissions(State(state): State<AppState>) -> Json<Vec<Submission>> {
    Json(state.pipeline.orchestrator().list())
}

#[instrument(skip_all, fields(agent_id = %req.agent_id, benchmark_id = %req.benchmark_id))]
async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> AppResult<(StatusCode, Json<Submission>)> {
    let cancel = state.shutdown.child_token();
    let submission = state
        .pipeline
        .orchestrator()
        .submit(&cancel, &req.agent_id, &req.benchmark_id, &req.payload)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Submission>> {
    state
        .pipeline
        .submission(&id)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("submission {id} not found")))
}

async fn list_results(State(state): State<AppState>) -> Json<Vec<Submission>> {
    Json(state.pipeline.runner().results())
}

async fn list_scores(State(state): State<AppState>) -> Json<Vec<ScoreSummary>> {
    Json(state.pipeline.scoring().list())
}

async fn list_traces(State(state): State<AppState>) -> Json<Vec<TraceEvent>> {
    Json(state.pipeline.traces().list())
}

async fn record_trace(
    State(state): State<AppState>,
    Json(req): Json<RecordTraceRequest>,
) -> AppResult<(StatusCode, Json<TraceEvent>)> {
    let event = state
        .pipeline
        .traces()
        .record(&req.submission_id, &req.message, req.level)?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn leaderboard(State(state): State<AppState>) -> Json<Vec<LeaderboardEntry>> {
    Json(state.pipeline.leaderboard().list())
}

async fn benchmark_leaderboard(
    State(state): State<AppState>,
    Path(benchmark_id): Path<String>,
) -> Json<Vec<LeaderboardEntry>> {
    Json(state.pipeline.leaderboard().for_benchmark(&benchmark_id))
}
