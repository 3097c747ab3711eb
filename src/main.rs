//! Coin Trust Score Service: binary entrypoint
//! Boots the Axum HTTP server under Shuttle, wiring config, the orchestrator and metrics.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    coin_trust_score::init_tracing();

    let router = coin_trust_score::app().await?;
    tracing::info!("coin trust score service ready");

    Ok(router.into())
}
