//! Score one coin from the command line and print the aggregate report as JSON.
//!
//! Usage: score-coin <coin>   (defaults to "bitcoin")

use coin_trust_score::{config::ScoreConfig, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    coin_trust_score::init_tracing();

    let coin = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "bitcoin".to_string());

    let cfg = ScoreConfig::load_default()?;
    let orchestrator = Orchestrator::from_config(&cfg)?;
    let report = orchestrator.score(&coin).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
