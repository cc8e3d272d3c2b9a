// Configuration for the proxy
//
// Precedence: CLI flag > environment variable > built-in default. There is
// deliberately no config file: the listen address and the upstream base URL
// are the only external parameters.

use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::cli::Cli;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND: &str = "127.0.0.1:11435";
const DEFAULT_UPSTREAM: &str = "http://127.0.0.1:11434";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the proxy server to
    pub bind_addr: SocketAddr,

    /// Base URL of the upstream inference server (no trailing slash)
    pub upstream_url: String,

    /// Log level used when RUST_LOG is unset: trace, debug, info, warn, error
    pub log_level: String,
}

impl Config {
    /// Resolve configuration: flag > env var > default
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let bind = cli
            .bind
            .clone()
            .or_else(|| std::env::var("UNTHINK_BIND").ok())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {bind}"))?;

        let upstream_url = cli
            .upstream
            .clone()
            .or_else(|| std::env::var("UNTHINK_UPSTREAM").ok())
            .unwrap_or_else(|| DEFAULT_UPSTREAM.to_string())
            .trim_end_matches('/')
            .to_string();

        let log_level = cli.log_level.clone().unwrap_or_else(|| "info".to_string());

        Ok(Self {
            bind_addr,
            upstream_url,
            log_level,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.parse().expect("default bind address is valid"),
            upstream_url: DEFAULT_UPSTREAM.to_string(),
            log_level: "info".to_string(),
        }
    }
}
