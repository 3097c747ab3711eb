// src/lib.rs
// Public library surface for the server binary, the CLI tools and integration tests.

pub mod aggregate;
pub mod agents;
pub mod api;
pub mod coerce;
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod social;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregateReport, Aggregator, WeightTable};
pub use crate::api::router;
pub use crate::contract::{Component, SubscoreRecord};
pub use crate::error::ScoreError;
pub use crate::orchestrator::Orchestrator;

use axum::Router;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the full in-process app from `config/score.json` (or
/// `SCORE_CONFIG_PATH`) and the environment, including `/metrics`.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = config::ScoreConfig::load_default()?;
    let orchestrator = Orchestrator::from_config(&cfg)?;
    let metrics = metrics::Metrics::init();
    Ok(api::create_router(
        api::AppState::new(orchestrator),
        metrics.as_ref(),
    ))
}

/// Install the tracing subscriber for binaries.
///
/// Filter comes from `RUST_LOG` (default `coin_trust_score=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coin_trust_score=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
}
