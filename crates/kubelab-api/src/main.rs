//! Todo API server

use clap::Parser;
use tracing::info;

use kubelab_api::config::ServerArgs;
use kubelab_api::repository::ItemRepository;
use kubelab_api::server::{self, AppState};
use kubelab_api::store;
use kubelab_common::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    init_telemetry(TelemetryConfig {
        service_name: "todo-api".to_string(),
        format: args.log_format,
        ..Default::default()
    })?;

    info!(store = %redacted(&args.redis_url), "connecting to store");
    let kv = store::connect(&args.redis_url, args.redis_password.as_deref()).await?;

    let state = AppState::new(ItemRepository::new(kv))?;
    server::serve(args.listen_addr(), state).await?;

    Ok(())
}

/// Strips userinfo from a store URL before logging it
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
