//! Service configuration from flags and environment
//!
//! Every option has an environment fallback so the container only needs env
//! vars: `PORT`, `BIND_ADDRESS`, `REDIS_URL`, `REDIS_PASSWORD`, `LOG_FORMAT`.

use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use kubelab_common::{LogFormat, DEFAULT_API_PORT};

/// Todo API - item CRUD backed by Redis
#[derive(Parser, Debug, Clone)]
#[command(name = "todo-api", version, about, long_about = None)]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_API_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: IpAddr,

    /// Store connection URL (redis://, rediss://, or memory://)
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,

    /// Store credential, overrides any password in the URL
    #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// Log format: json or pretty
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

impl ServerArgs {
    /// Socket address to listen on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
