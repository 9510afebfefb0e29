//! Content hub — binary entrypoint.
//! Loads config, builds the hub, performs the first load and serves the
//! rendering contract over HTTP.

use std::sync::Arc;

use content_hub::api::{self, AppState};
use content_hub::config::HubConfig;
use content_hub::telemetry::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact dev logs, only when CONTENT_HUB_DEV_LOG=1.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("CONTENT_HUB_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");
    if !dev_flag {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("content_hub=info,warn"));

    // The runtime may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    let cfg = HubConfig::load_default()?;
    let hub = Arc::new(cfg.build_hub()?);

    if let Err(e) = hub.reload().await {
        tracing::warn!(error = %e, "initial load skipped");
    }

    let mut router = api::router(AppState::new(hub));
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics exporter disabled"),
    }

    Ok(router.into())
}
