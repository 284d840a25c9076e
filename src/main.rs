use ai_llm_service::telemetry;
use anyhow::Context;
use tracing::{Level, info, warn};
use tracing_subscriber::{Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment may already be complete.
    let dotenv = dotenvy::dotenv();

    let filter = telemetry::env_filter_with_level("info", Level::INFO);

    tracing_subscriber::registry()
        .with(filter)
        .with(telemetry::layer())
        .with(fmt::layer().with_target(true).with_filter(telemetry::non_workspace()))
        .try_init()
        .context("installing the tracing subscriber")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => info!("no .env file; using process environment"),
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }

    api::start().await.context("api server failed")?;

    Ok(())
}
