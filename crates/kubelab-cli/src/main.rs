//! kubelab CLI
//!
//! Stands up and tears down the local kind lab cluster.

use clap::Parser;

use kubelab_cli::{Cli, Result};
use kubelab_common::{init_telemetry, LogFormat, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(TelemetryConfig {
        service_name: "kubelab".to_string(),
        format: LogFormat::Pretty,
        ..Default::default()
    })
    .map_err(|e| kubelab_cli::Error::Other(e.to_string()))?;

    let cli = Cli::parse();
    cli.run().await
}
