//! # Orchestrator
//! One scoring request: fetch the context, fan it out to the four scorers
//! concurrently, wait for all of them, aggregate.
//!
//! Remote calls are bounded by a per-call timeout. A failed or timed-out
//! component is excluded from aggregation; it never cancels the others.
//! Only a missing context or zero coverage fails the whole request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{info, warn};

use crate::aggregate::{AggregateReport, Aggregator, ComponentOutcome};
use crate::agents::{ask_agent, AgentBackend, BackboardClient};
use crate::config::{AssistantIds, ScoreConfig};
use crate::context::{coin_name, CommandContextProvider, ContextProvider, FixtureContextProvider};
use crate::contract::{Component, SubscoreRecord};
use crate::error::{Result, ScoreError};
use crate::social::score_social;

pub const ENV_FIXTURE_CONTEXT: &str = "SCORE_FIXTURE_CONTEXT";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("score_requests_total", "Scoring requests received.");
        describe_counter!(
            "score_component_failures_total",
            "Components excluded from aggregation, by component and error kind."
        );
        describe_counter!(
            "score_request_failures_total",
            "Scoring requests that failed as a whole."
        );
        describe_gauge!(
            "score_aggregate_coverage",
            "Coverage of the most recent aggregate."
        );
        describe_histogram!("score_duration_ms", "End-to-end scoring time in milliseconds.");
    });
}

pub struct Orchestrator {
    context: Arc<dyn ContextProvider>,
    agents: Arc<dyn AgentBackend>,
    assistants: AssistantIds,
    memory: Option<String>,
    agent_timeout: Duration,
    aggregator: Aggregator,
}

impl Orchestrator {
    pub fn new(
        context: Arc<dyn ContextProvider>,
        agents: Arc<dyn AgentBackend>,
        assistants: AssistantIds,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            context,
            agents,
            assistants,
            memory: None,
            agent_timeout: Duration::from_secs(45),
            aggregator,
        }
    }

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_memory(mut self, memory: Option<String>) -> Self {
        self.memory = memory;
        self
    }

    /// Production wiring: Backboard client plus either the fixture document
    /// named by `SCORE_FIXTURE_CONTEXT` or the configured fetcher command.
    pub fn from_config(cfg: &ScoreConfig) -> anyhow::Result<Self> {
        let context: Arc<dyn ContextProvider> = match std::env::var(ENV_FIXTURE_CONTEXT) {
            Ok(path) if !path.trim().is_empty() => {
                Arc::new(FixtureContextProvider::load_from_file(path.trim())?)
            }
            _ => Arc::new(
                CommandContextProvider::from_command_line(
                    &cfg.context_command,
                    cfg.context_timeout(),
                )
                .ok_or_else(|| anyhow::anyhow!("context_command must not be empty"))?,
            ),
        };

        if !cfg.has_api_key() {
            warn!("BACKBOARD_API_KEY is not set; remote scoring components will fail");
        }
        // HTTP timeout slightly above the per-component budget so the
        // orchestrator's timeout is the one that fires.
        let http_timeout = cfg.agent_timeout() + Duration::from_secs(5);
        let agents = BackboardClient::new(&cfg.api_base_url, &cfg.api_key, http_timeout)?;

        let orchestrator = Self::new(
            context,
            Arc::new(agents),
            cfg.assistants.clone(),
            Aggregator::new(cfg.weights),
        )
        .with_agent_timeout(cfg.agent_timeout())
        .with_memory(cfg.memory.clone());

        info!(
            context = orchestrator.context.name(),
            agents = orchestrator.agents.name(),
            weights = ?orchestrator.aggregator.weights(),
            agent_timeout_secs = orchestrator.agent_timeout.as_secs(),
            "orchestrator ready"
        );
        Ok(orchestrator)
    }

    /// Score one coin end to end.
    pub async fn score(&self, coin: &str) -> Result<AggregateReport> {
        ensure_metrics_described();
        counter!("score_requests_total").increment(1);
        let started = Instant::now();

        let result = self.score_inner(coin).await;

        histogram!("score_duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        if let Err(e) = &result {
            counter!("score_request_failures_total", "kind" => e.kind()).increment(1);
            warn!(coin, error = %e, "scoring request failed");
        }
        result
    }

    async fn score_inner(&self, coin: &str) -> Result<AggregateReport> {
        let ctx = self.context.fetch(coin).await.inspect_err(|e| {
            warn!(coin, provider = self.context.name(), error = %e, "context fetch failed");
        })?;
        let outcomes = self.score_components(&ctx).await;

        for (component, outcome) in &outcomes {
            if let Err(e) = outcome {
                counter!(
                    "score_component_failures_total",
                    "component" => component.as_str(),
                    "kind" => e.kind()
                )
                .increment(1);
                warn!(%component, kind = e.kind(), error = %e, "component excluded");
            }
        }

        let report = self.aggregator.aggregate(&coin_name(&ctx, coin), &outcomes)?;
        gauge!("score_aggregate_coverage").set(report.coverage);
        info!(
            coin = %report.coin,
            master_score = report.master_score,
            confidence = report.confidence,
            coverage = report.coverage,
            excluded = ?report.excluded_components,
            "aggregate computed"
        );
        Ok(report)
    }

    /// Run all four scorers against the same read-only context and wait for
    /// every one of them. Output is in reporting order.
    pub async fn score_components(&self, ctx: &Value) -> Vec<ComponentOutcome> {
        let (market, dev, onchain, social) = tokio::join!(
            self.score_remote(Component::MarketIntegrity, ctx),
            self.score_remote(Component::DevVelocity, ctx),
            self.score_remote(Component::OnChainSecurity, ctx),
            async { Ok::<_, ScoreError>(score_social(ctx)) },
        );
        vec![
            (Component::MarketIntegrity, market),
            (Component::DevVelocity, dev),
            (Component::OnChainSecurity, onchain),
            (Component::SocialSentiment, social),
        ]
    }

    async fn score_remote(&self, component: Component, ctx: &Value) -> Result<SubscoreRecord> {
        let assistant_id = self
            .assistants
            .id_for(component)
            .ok_or(ScoreError::AgentNotConfigured(component.as_str()))?;

        let call = ask_agent(
            self.agents.as_ref(),
            assistant_id,
            component,
            ctx,
            self.memory.as_deref(),
        );
        match tokio::time::timeout(self.agent_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ScoreError::Timeout {
                assistant_id: assistant_id.to_string(),
                elapsed: self.agent_timeout,
            }),
        }
    }
}
