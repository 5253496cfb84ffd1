//! Reference-data services: benchmarks, agents and authentication.
//!
//! None of these take part in the bus traffic; they are plain stores behind
//! validated create/list calls.

use chrono::Utc;
use evalboard_store::{Record, Store};
use tracing::info;

use crate::domain::validation::require;
use crate::domain::{Benchmark, BoardError, Result, User};
use crate::obs::Instrumentation;

pub struct BenchmarkService {
    benchmarks: Store<Benchmark>,
    instruments: Instrumentation,
}

impl BenchmarkService {
    pub fn new(instruments: Instrumentation) -> Self {
        Self {
            benchmarks: Store::new(),
            instruments,
        }
    }

    /// Create or replace a benchmark definition.
    pub fn create(&self, id: &str, name: &str, description: &str) -> Result<Benchmark> {
        require("id", id)?;
        require("name", name)?;

        let benchmark = Benchmark {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        self.benchmarks
            .save(benchmark.record_key(), benchmark.clone());
        self.instruments.count("benchmarks_created_total", &[]);
        info!(benchmark_id = %id, "benchmark: created");
        Ok(benchmark)
    }

    pub fn list(&self) -> Vec<Benchmark> {
        self.benchmarks.list()
    }

    pub fn get(&self, id: &str) -> Option<Benchmark> {
        self.benchmarks.get(id)
    }
}

pub struct AgentService {
    agents: Store<User>,
    instruments: Instrumentation,
}

impl AgentService {
    pub fn new(instruments: Instrumentation) -> Self {
        Self {
            agents: Store::new(),
            instruments,
        }
    }

    /// Register or update an agent.
    pub fn register(&self, id: &str, email: &str, role: &str) -> Result<User> {
        require("id", id)?;
        require("email", email)?;

        let agent = User {
            id: id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        };
        self.agents.save(agent.record_key(), agent.clone());
        self.instruments.count("agents_registered_total", &[]);
        info!(agent_id = %id, "agent: registered");
        Ok(agent)
    }

    pub fn list(&self) -> Vec<User> {
        self.agents.list()
    }
}

pub struct AuthService {
    users: Store<User>,
    instruments: Instrumentation,
}

impl AuthService {
    pub fn new(instruments: Instrumentation) -> Self {
        Self {
            users: Store::new(),
            instruments,
        }
    }

    /// Preload a known subject.
    pub fn seed(&self, user: User) -> Result<()> {
        self.users.seed(user)?;
        Ok(())
    }

    /// Resolve a subject by email.
    pub fn authenticate(&self, email: &str) -> Result<User> {
        require("email", email)?;

        let found = self
            .users
            .list()
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()));
        match found {
            Some(user) => {
                self.instruments
                    .count("auth_attempts_total", &[("result", "ok")]);
                Ok(user)
            }
            None => {
                self.instruments
                    .count("auth_attempts_total", &[("result", "denied")]);
                Err(BoardError::Unauthorized {
                    subject: email.to_string(),
                })
            }
        }
    }
}
