//! FAQ Assistant: binary entrypoint
//! Boots the Axum HTTP server: configuration, data store, keyword tables, routes, metrics.

use faq_assistant::{build_app, config::AppConfig, metrics::Metrics, telemetry};
use shuttle_axum::ShuttleAxum;
use tracing::info;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let config = AppConfig::from_env()?;
    let app = build_app(&config)?;
    let metrics = Metrics::init()?;
    let router = app.merge(metrics.router());

    info!(
        rules = %config.matching_rules_path.display(),
        admin_token = config.admin_token.is_some(),
        "faq assistant ready"
    );

    Ok(router.into())
}
