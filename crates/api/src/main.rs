use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use larder_api::app::{self, services};
use larder_infra::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    larder_observability::init();

    let config = EngineConfig::from_env()?;
    let services = Arc::new(services::build_services(&config)?);

    if let Some(every) = sweep_interval()? {
        tracing::info!(every_secs = every.as_secs(), "periodic sweep enabled");
        services::spawn_sweeper(services.clone(), every);
    }

    let app = app::build_app(services);

    let bind = std::env::var("LARDER_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

fn sweep_interval() -> anyhow::Result<Option<Duration>> {
    match std::env::var("LARDER_SWEEP_INTERVAL_SECS") {
        Ok(v) if !v.trim().is_empty() => {
            let secs: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("invalid LARDER_SWEEP_INTERVAL_SECS={v:?}"))?;
            anyhow::ensure!(secs > 0, "LARDER_SWEEP_INTERVAL_SECS must be positive");
            Ok(Some(Duration::from_secs(secs)))
        }
        _ => Ok(None),
    }
}
