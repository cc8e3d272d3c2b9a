// CLI module - command-line argument parsing

use clap::Parser;

use crate::config::VERSION;

/// unthink - reasoning-stripping proxy for local model servers
#[derive(Parser, Debug)]
#[command(name = "unthink")]
#[command(version = VERSION)]
#[command(about = "Strips <think> reasoning spans from model responses", long_about = None)]
pub struct Cli {
    /// Address to listen on (env: UNTHINK_BIND, default: 127.0.0.1:11435)
    #[arg(long)]
    pub bind: Option<String>,

    /// Upstream server base URL (env: UNTHINK_UPSTREAM, default: http://127.0.0.1:11434)
    #[arg(long)]
    pub upstream: Option<String>,

    /// Log level when RUST_LOG is unset: trace, debug, info, warn, error
    #[arg(long)]
    pub log_level: Option<String>,
}
