//! Stage services.
//!
//! Pipeline stages (subscribe and/or publish on the bus):
//! - `Orchestrator`: accepts submissions, publishes `submission.created`
//! - `Runner`: evaluates, persists results, publishes `score.calculated`
//! - `Scoring`, `Traces`, `Leaderboard`: derived projections of `score.calculated`
//!
//! Reference services (direct calls only): `BenchmarkService`,
//! `AgentService`, `AuthService`.

pub mod evaluator;
pub mod leaderboard;
pub mod orchestrator;
pub mod reference;
pub mod runner;
pub mod scoring;
pub mod trace;

pub use evaluator::{Evaluator, PlaceholderEvaluator};
pub use leaderboard::Leaderboard;
pub use orchestrator::Orchestrator;
pub use reference::{AgentService, AuthService, BenchmarkService};
pub use runner::Runner;
pub use scoring::Scoring;
pub use trace::Traces;
