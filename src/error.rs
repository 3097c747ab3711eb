//! Error types for the scoring pipeline.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    /// The context fetcher failed, printed nothing, or printed something that is not JSON.
    #[error("context unavailable for coin '{coin}': {message}")]
    ContextUnavailable { coin: String, message: String },

    /// An agent answered, but not with a JSON object.
    #[error("agent {assistant_id} did not return a JSON object: {reason}")]
    MalformedAgentOutput {
        assistant_id: String,
        reason: String,
        raw: String,
    },

    /// Every component failed; there is nothing to aggregate.
    #[error("aggregation impossible: no scoring component succeeded")]
    AggregationImpossible,

    /// Transport or HTTP status failure talking to the assistant service.
    #[error("agent request failed: {message}")]
    Agent {
        message: String,
        status: Option<u16>,
    },

    #[error("agent {assistant_id} timed out after {elapsed:?}")]
    Timeout {
        assistant_id: String,
        elapsed: Duration,
    },

    #[error("agent {0} is not configured")]
    AgentNotConfigured(&'static str),
}

impl ScoreError {
    /// Short machine-readable code, used for metric labels and JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::ContextUnavailable { .. } => "context_unavailable",
            ScoreError::MalformedAgentOutput { .. } => "malformed_agent_output",
            ScoreError::AggregationImpossible => "aggregation_impossible",
            ScoreError::Agent { .. } => "agent_error",
            ScoreError::Timeout { .. } => "agent_timeout",
            ScoreError::AgentNotConfigured(_) => "agent_not_configured",
        }
    }

    /// Request-level failures abort scoring; everything else only excludes one component.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScoreError::ContextUnavailable { .. } | ScoreError::AggregationImpossible
        )
    }
}

impl From<reqwest::Error> for ScoreError {
    fn from(e: reqwest::Error) -> Self {
        ScoreError::Agent {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoreError>;
