//! Wiring of the bus and every stage into one process-wide pipeline.
//!
//! Subscriptions, in registration order:
//!
//! | Topic | Handlers |
//! |---|---|
//! | `submission.created` | runner |
//! | `score.calculated` | scoring, trace, leaderboard |

use std::sync::Arc;

use tracing::info;

use crate::bus::{Bus, Topic};
use crate::domain::{Result, Submission, User};
use crate::metrics::{InMemoryMetrics, MetricsRecorder};
use crate::obs::Instrumentation;
use crate::stages::{
    AgentService, AuthService, BenchmarkService, Evaluator, Leaderboard, Orchestrator,
    PlaceholderEvaluator, Runner, Scoring, Traces,
};

/// Everything a pipeline needs, supplied once at construction.
#[derive(Clone)]
pub struct PipelineConfig {
    pub evaluator: Arc<dyn Evaluator>,
    pub metrics: Arc<dyn MetricsRecorder>,
    /// Subjects preloaded into the auth store.
    pub seed_users: Vec<User>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            evaluator: Arc::new(PlaceholderEvaluator),
            metrics: Arc::new(InMemoryMetrics::new()),
            seed_users: vec![User {
                id: "admin".to_string(),
                email: "admin@example.com".to_string(),
                role: "admin".to_string(),
            }],
        }
    }
}

impl PipelineConfig {
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }
}

pub struct Pipeline {
    bus: Arc<Bus>,
    orchestrator: Orchestrator,
    runner: Arc<Runner>,
    scoring: Arc<Scoring>,
    traces: Arc<Traces>,
    leaderboard: Arc<Leaderboard>,
    benchmarks: BenchmarkService,
    agents: AgentService,
    auth: AuthService,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let base = Instrumentation::new("bus", config.metrics);
        let bus = Arc::new(Bus::new(base.clone()));

        let runner = Arc::new(Runner::new(config.evaluator, base.for_stage("runner")));
        let scoring = Arc::new(Scoring::new(base.for_stage("scoring")));
        let traces = Arc::new(Traces::new(base.for_stage("trace")));
        let leaderboard = Arc::new(Leaderboard::new(base.for_stage("leaderboard")));

        bus.subscribe(Topic::SubmissionCreated, runner.clone());
        bus.subscribe(Topic::ScoreCalculated, scoring.clone());
        bus.subscribe(Topic::ScoreCalculated, traces.clone());
        bus.subscribe(Topic::ScoreCalculated, leaderboard.clone());

        let auth = AuthService::new(base.for_stage("auth"));
        for user in config.seed_users {
            auth.seed(user)?;
        }

        let pipeline = Self {
            orchestrator: Orchestrator::new(bus.clone(), base.for_stage("orchestrator")),
            benchmarks: BenchmarkService::new(base.for_stage("benchmark")),
            agents: AgentService::new(base.for_stage("agent")),
            auth,
            bus,
            runner,
            scoring,
            traces,
            leaderboard,
        };
        info!(bus = ?pipeline.bus, "pipeline: wired");
        Ok(pipeline)
    }

    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    pub fn traces(&self) -> &Traces {
        &self.traces
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn benchmarks(&self) -> &BenchmarkService {
        &self.benchmarks
    }

    pub fn agents(&self) -> &AgentService {
        &self.agents
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Latest view of a submission: the runner's newest result when one
    /// exists, otherwise the orchestrator's accepted record.
    pub fn submission(&self, submission_id: &str) -> Option<Submission> {
        self.runner
            .latest_for(submission_id)
            .or_else(|| self.orchestrator.get(submission_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiring_registers_every_stage() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        assert_eq!(pipeline.bus().subscriber_count(Topic::SubmissionCreated), 1);
        assert_eq!(pipeline.bus().subscriber_count(Topic::ScoreCalculated), 3);
        let rendered = format!("{:?}", pipeline.bus());
        let order: Vec<_> = ["scoring", "trace", "leaderboard"]
            .iter()
            .map(|n| rendered.find(n).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn default_config_seeds_admin() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let admin = pipeline.auth().authenticate("admin@example.com").unwrap();
        assert_eq!(admin.role, "admin");
    }

    #[test]
    fn duplicate_seed_users_are_rejected() {
        let mut config = PipelineConfig::default();
        let extra = config.seed_users[0].clone();
        config.seed_users.push(extra);
        assert!(Pipeline::new(config).is_err());
    }
}
