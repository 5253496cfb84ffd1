//! Daemon configuration from flags and environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use tracing::Level;

use evalboard_core::LogFormat;

#[derive(Parser, Debug, Clone)]
#[command(name = "evalboardd")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agent benchmark submissions, evaluation and leaderboard", long_about = None)]
pub struct Config {
    /// Port the HTTP gateway listens on
    #[arg(long, env = "EVALBOARD_HTTP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "EVALBOARD_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Emit logs as newline-delimited JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::from_json_flag(self.json)
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}
