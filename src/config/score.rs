// src/config/score.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::warn;

use crate::aggregate::WeightTable;
use crate::agents::backboard::DEFAULT_BASE_URL;
use crate::contract::Component;

pub const ENV_CONFIG_PATH: &str = "SCORE_CONFIG_PATH";
pub const ENV_API_KEY: &str = "BACKBOARD_API_KEY";
pub const ENV_MARKET_AGENT_ID: &str = "MARKET_AGENT_ID";
pub const ENV_DEV_AGENT_ID: &str = "DEV_AGENT_ID";
pub const ENV_ONCHAIN_AGENT_ID: &str = "ONCHAIN_AGENT_ID";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_env() -> String {
    "ENV".to_string()
}
fn default_agent_timeout_secs() -> u64 {
    45
}
fn default_context_timeout_secs() -> u64 {
    60
}
fn default_context_command() -> Vec<String> {
    vec![
        "node".to_string(),
        "backboard/scripts/get_context.js".to_string(),
    ]
}

/// Assistant id per remote component. `"ENV"` (or empty) means: read from
/// MARKET_AGENT_ID / DEV_AGENT_ID / ONCHAIN_AGENT_ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssistantIds {
    #[serde(default = "default_env")]
    pub market_integrity: String,
    #[serde(default = "default_env")]
    pub dev_velocity: String,
    #[serde(default = "default_env")]
    pub on_chain_security: String,
}

impl Default for AssistantIds {
    fn default() -> Self {
        Self {
            market_integrity: default_env(),
            dev_velocity: default_env(),
            on_chain_security: default_env(),
        }
    }
}

impl AssistantIds {
    /// Configured id for a remote component; `None` when unset or local.
    pub fn id_for(&self, component: Component) -> Option<&str> {
        let id = match component {
            Component::MarketIntegrity => &self.market_integrity,
            Component::DevVelocity => &self.dev_velocity,
            Component::OnChainSecurity => &self.on_chain_security,
            Component::SocialSentiment => return None,
        };
        let id = id.trim();
        (!id.is_empty() && !id.eq_ignore_ascii_case("env")).then_some(id)
    }

    fn resolve_env(&mut self) {
        for (slot, var) in [
            (&mut self.market_integrity, ENV_MARKET_AGENT_ID),
            (&mut self.dev_velocity, ENV_DEV_AGENT_ID),
            (&mut self.on_chain_security, ENV_ONCHAIN_AGENT_ID),
        ] {
            if slot.trim().is_empty() || slot.trim().eq_ignore_ascii_case("env") {
                *slot = env::var(var).unwrap_or_default().trim().to_string();
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_base_url")]
    pub api_base_url: String,
    /// "ENV" means: read from BACKBOARD_API_KEY
    #[serde(default = "default_env")]
    pub api_key: String,
    #[serde(default)]
    pub assistants: AssistantIds,
    /// Per remote call, covering thread creation plus the message round-trip.
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,
    #[serde(default = "default_context_timeout_secs")]
    pub context_timeout_secs: u64,
    /// Program and leading args; the coin id is appended.
    #[serde(default = "default_context_command")]
    pub context_command: Vec<String>,
    /// Optional memory mode forwarded to the assistant service (e.g. "Auto").
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub weights: WeightTable,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            api_key: default_env(),
            assistants: AssistantIds::default(),
            agent_timeout_secs: default_agent_timeout_secs(),
            context_timeout_secs: default_context_timeout_secs(),
            context_command: default_context_command(),
            memory: None,
            weights: WeightTable::default(),
        }
    }
}

impl ScoreConfig {
    /// Load from an explicit path. `.toml` is parsed as TOML, anything else as JSON.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading score config from {}", path.display()))?;
        let is_toml = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        let cfg: ScoreConfig = if is_toml {
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
        } else {
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
        };
        Ok(cfg.finish())
    }

    /// Load using env var + fallbacks:
    /// 1) $SCORE_CONFIG_PATH (must exist)
    /// 2) config/score.json
    /// 3) config/score.toml
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        for candidate in ["config/score.json", "config/score.toml"] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
        }
        Ok(Self::default().finish())
    }

    /// Resolve "ENV" placeholders and sanitize ranges.
    fn finish(mut self) -> Self {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_API_KEY).unwrap_or_default().trim().to_string();
        }
        self.assistants.resolve_env();

        self.agent_timeout_secs = self.agent_timeout_secs.clamp(1, 300);
        self.context_timeout_secs = self.context_timeout_secs.clamp(1, 600);

        if !self.weights.is_valid() {
            warn!(weights = ?self.weights, "invalid weight table in config, using defaults");
            self.weights = WeightTable::default();
        }
        self.memory = self
            .memory
            .take()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        self
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn context_timeout(&self) -> Duration {
        Duration::from_secs(self.context_timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn json_config_resolves_env_and_sanitizes() {
        env::set_var(ENV_API_KEY, "secret-key");
        env::set_var(ENV_DEV_AGENT_ID, "dev-from-env");
        env::remove_var(ENV_MARKET_AGENT_ID);

        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("score.json");
        fs::write(
            &p,
            r#"{
                "api_key": "ENV",
                "assistants": { "market_integrity": "ENV", "on_chain_security": "onchain-123" },
                "agent_timeout_secs": 0,
                "memory": "  ",
                "weights": { "market_integrity": 2.0, "dev_velocity": 0.2,
                             "on_chain_security": 0.35, "social_sentiment": 0.2 }
            }"#,
        )
        .unwrap();

        let cfg = ScoreConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.api_key, "secret-key");
        assert_eq!(cfg.assistants.id_for(Component::DevVelocity), Some("dev-from-env"));
        assert_eq!(cfg.assistants.id_for(Component::OnChainSecurity), Some("onchain-123"));
        assert_eq!(cfg.assistants.id_for(Component::MarketIntegrity), None);
        assert_eq!(cfg.assistants.id_for(Component::SocialSentiment), None);
        assert_eq!(cfg.agent_timeout_secs, 1);
        assert_eq!(cfg.memory, None);
        assert_eq!(cfg.weights, WeightTable::default());
        assert_eq!(cfg.api_base_url, DEFAULT_BASE_URL);

        env::remove_var(ENV_API_KEY);
        env::remove_var(ENV_DEV_AGENT_ID);
    }

    #[serial_test::serial]
    #[test]
    fn toml_config_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("score.toml");
        fs::write(
            &p,
            r#"
api_key = "literal"
agent_timeout_secs = 30
context_command = ["node", "fetch-context.js"]
memory = "Auto"

[assistants]
market_integrity = "m-1"
dev_velocity = "d-1"
on_chain_security = "o-1"
"#,
        )
        .unwrap();
        let cfg = ScoreConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.api_key, "literal");
        assert_eq!(cfg.agent_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.context_command, vec!["node", "fetch-context.js"]);
        assert_eq!(cfg.memory.as_deref(), Some("Auto"));
        assert_eq!(cfg.assistants.id_for(Component::MarketIntegrity), Some("m-1"));
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_path_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        // no files: defaults
        let cfg = ScoreConfig::load_default().unwrap();
        assert_eq!(cfg.agent_timeout_secs, 45);
        assert_eq!(cfg.context_command, default_context_command());

        // env path wins, and must exist
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.json"));
        assert!(ScoreConfig::load_default().is_err());

        let p = tmp.path().join("custom.json");
        fs::write(&p, r#"{"agent_timeout_secs": 12}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, &p);
        assert_eq!(ScoreConfig::load_default().unwrap().agent_timeout_secs, 12);
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
