use std::time::Duration;

use clap::{Parser, ValueEnum};
use mcpserver::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "MCP server for Hong Kong housing statistics", long_about = None)]
pub struct Args {
    /// Serve streamable HTTP instead of stdio
    #[arg(short = 's', long, env = "HK_HOUSING_HTTP")]
    pub http: bool,

    /// Bind address for HTTP mode
    #[arg(long, env = "HK_HOUSING_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port for HTTP mode
    #[arg(long, env = "HK_HOUSING_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Upstream CSV request timeout in seconds
    #[arg(long, env = "HK_HOUSING_FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Log output format (written to stderr)
    #[arg(long, env = "HK_HOUSING_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn transport(&self) -> Transport {
        if self.http {
            Transport::Http {
                host: self.host.clone(),
                port: self.port,
            }
        } else {
            Transport::Stdio
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
