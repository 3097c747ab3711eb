//! Prompt text for the remote scoring agents.

use serde_json::Value;

use crate::contract::Component;

const SCHEMA_INSTRUCTIONS: &str = "Return ONLY a JSON object with EXACT keys:\n\
subscore (number), confidence (number), flags (string array), explanation (string), details (object).\n\
No markdown. No extra text.";

/// Human label and the context section a component is allowed to read.
fn scope(component: Component) -> (&'static str, &'static str) {
    match component {
        Component::MarketIntegrity => ("Market Integrity", "market_metrics"),
        Component::DevVelocity => ("Dev Velocity", "dev_stats"),
        Component::OnChainSecurity => ("On-chain Security", "trust_assessment"),
        Component::SocialSentiment => ("Social Sentiment", "social_sentiment"),
    }
}

/// Per-request instruction embedding the whole context document.
pub fn scoring_prompt(component: Component, ctx: &Value) -> String {
    let (label, section) = scope(component);
    let mut out = String::with_capacity(512);
    out.push_str("You are a scoring module.\n");
    out.push_str(&format!("Compute ONLY the {label} subscore (0-100).\n"));
    out.push_str(&format!(
        "Use ONLY fields under {section} (+ optional name/symbol/age_days).\n"
    ));
    if component == Component::OnChainSecurity {
        out.push_str(&format!(
            "If {section}.note exists, treat it as limited contract signals.\n"
        ));
    }
    out.push_str(SCHEMA_INSTRUCTIONS);
    out.push_str("\n\n");
    out.push_str(&ctx.to_string());
    out
}

/// Assistant name and system prompt used when provisioning a remote agent.
pub fn assistant_profile(component: Component) -> (&'static str, &'static str) {
    match component {
        Component::MarketIntegrity => (
            "Market Integrity Agent",
            "You are the Market Integrity Agent for a crypto trust score. You MUST output ONLY valid JSON.\n\
             Given market_metrics, compute a 0-100 subscore for market integrity.\n\
             Signals: volume to market-cap ratio, distance from all-time high and low, and short-term \
             abnormality proxies from performance (large 1h plus 24h swings).\n\
             Return JSON keys: subscore (0-100), confidence (0-1), flags (array), explanation (string), details (object).\n\
             Flags are short snake_case codes.",
        ),
        Component::DevVelocity => (
            "Dev Velocity Agent",
            "You are the Dev Velocity Agent for a crypto trust score. You MUST output ONLY valid JSON.\n\
             Given dev_stats and optionally project age, compute a 0-100 subscore from recent_commits_4w \
             (diminishing returns), issues_resolution_rate (higher is better) and stars (log-scaled).\n\
             Return JSON keys: subscore (0-100), confidence (0-1), flags (array), explanation (string), details (object).\n\
             Flag very low recent commits and low issue resolution with short snake_case codes.",
        ),
        Component::OnChainSecurity => (
            "On-chain Security Agent",
            "You are the On-chain Security Agent for a crypto trust score. You MUST output ONLY valid JSON.\n\
             Given trust_assessment (and possibly age_days, security_signals), compute a 0-100 subscore \
             emphasizing rug-pull and centralization risk:\n\
             - top_holder_concentration: higher lowers the score; flag above 30%\n\
             - has_burned_liquidity false lowers the score; flag it\n\
             - is_renounced Unknown/No lowers the score; flag it\n\
             - missing deployed_at_block lowers confidence\n\
             - a deployer_address alone is not evidence of safety\n\
             Return JSON keys: subscore (0-100), confidence (0-1), flags (array), explanation (string), details (object).\n\
             Flags are short snake_case, e.g. holder_concentration_high, liquidity_not_burned, ownership_not_renounced_unknown.",
        ),
        Component::SocialSentiment => (
            "Social Sentiment Agent",
            "You are the Social Sentiment Agent for a crypto trust score. You MUST output ONLY valid JSON.\n\
             Return JSON keys: subscore (0-100), confidence (0-1), flags (array), explanation (string), details (object).",
        ),
    }
}
