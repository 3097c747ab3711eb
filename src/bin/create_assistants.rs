//! Provision the remote scoring assistants and print their ids.
//!
//! Usage: create-assistants [market_integrity|dev_velocity|on_chain_security ...]
//! With no arguments all three remote components are created. Put the printed
//! ids into MARKET_AGENT_ID / DEV_AGENT_ID / ONCHAIN_AGENT_ID or config/score.json.

use std::time::Duration;

use coin_trust_score::agents::{prompts::assistant_profile, AgentBackend, BackboardClient};
use coin_trust_score::config::ScoreConfig;
use coin_trust_score::Component;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    coin_trust_score::init_tracing();

    let cfg = ScoreConfig::load_default()?;
    if !cfg.has_api_key() {
        anyhow::bail!("BACKBOARD_API_KEY is not set");
    }

    let wanted: Vec<String> = std::env::args().skip(1).collect();
    let components: Vec<Component> = Component::ALL
        .into_iter()
        .filter(|c| c.is_remote())
        .filter(|c| wanted.is_empty() || wanted.iter().any(|w| w == c.as_str()))
        .collect();
    if components.is_empty() {
        anyhow::bail!("no remote component matches {wanted:?}");
    }

    let client = BackboardClient::new(&cfg.api_base_url, &cfg.api_key, Duration::from_secs(30))?;
    for component in components {
        let (name, system_prompt) = assistant_profile(component);
        let id = client.create_assistant(name, system_prompt).await?;
        tracing::info!(%component, assistant_id = %id, "assistant created");
        println!("{component}: {id}");
    }
    Ok(())
}
