//! The Subscore Record every scorer produces, and the extraction logic that
//! turns an agent's free-text reply into one.
//!
//! Agents are told to answer with a bare JSON object but regularly wrap it in
//! a markdown fence or add a sentence before/after it. Extraction tolerates
//! both; anything that still isn't a JSON object is `MalformedAgentOutput`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce::{to_float, DEFAULT_CONFIDENCE};
use crate::error::{Result, ScoreError};

/// Subscore assumed when a producer omits it entirely.
pub const NEUTRAL_SUBSCORE: f64 = 50.0;

/// Scoring components, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    MarketIntegrity,
    DevVelocity,
    OnChainSecurity,
    SocialSentiment,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::MarketIntegrity,
        Component::DevVelocity,
        Component::OnChainSecurity,
        Component::SocialSentiment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::MarketIntegrity => "market_integrity",
            Component::DevVelocity => "dev_velocity",
            Component::OnChainSecurity => "on_chain_security",
            Component::SocialSentiment => "social_sentiment",
        }
    }

    /// Social sentiment is scored locally; the rest go to remote agents.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Component::SocialSentiment)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Universal scorer output. Values are coerced but not bounded: the
/// aggregator clamps `subscore` and normalizes `confidence` itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscoreRecord {
    pub subscore: f64,
    pub confidence: f64,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl SubscoreRecord {
    /// Build a record from an untrusted JSON object. Never fails: wrong-typed
    /// or missing fields fall back to neutral values.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let flags = match obj.get("flags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|f| f.as_str())
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        };
        let explanation = obj
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let details = match obj.get("details") {
            Some(Value::Object(m)) => m.clone(),
            _ => Map::new(),
        };

        Self {
            subscore: to_float(obj.get("subscore"), NEUTRAL_SUBSCORE),
            confidence: to_float(obj.get("confidence"), DEFAULT_CONFIDENCE),
            flags,
            explanation,
            details,
        }
    }
}

/// Pull the JSON span out of a model reply and parse it.
///
/// Strips a leading fenced-code line and trailing fence, then (if the text
/// still doesn't open with `{`) slices from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> std::result::Result<Value, serde_json::Error> {
    let mut t = text.trim();

    if t.starts_with("```") {
        t = match t.split_once('\n') {
            Some((_lang, rest)) => rest,
            None => t.trim_start_matches('`'),
        };
        t = t.trim_end();
        if let Some(stripped) = t.strip_suffix("```") {
            t = stripped.trim();
        }
    }

    if !t.starts_with('{') {
        if let (Some(i), Some(j)) = (t.find('{'), t.rfind('}')) {
            if j > i {
                t = &t[i..=j];
            }
        }
    }

    serde_json::from_str(t)
}

/// Extract and validate one agent reply. Only "is it an object" is checked;
/// field-level problems are absorbed by [`SubscoreRecord::from_object`].
pub fn parse_agent_response(assistant_id: &str, raw: &str) -> Result<SubscoreRecord> {
    let malformed = |reason: String| ScoreError::MalformedAgentOutput {
        assistant_id: assistant_id.to_string(),
        reason,
        raw: raw.to_string(),
    };

    match extract_json(raw) {
        Ok(Value::Object(obj)) => Ok(SubscoreRecord::from_object(&obj)),
        Ok(other) => Err(malformed(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(malformed(e.to_string())),
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
