//! # Aggregator
//! Combines per-component Subscore Records into one master score.
//!
//! Weights are renormalized over the components that actually produced a
//! record: a failed component is removed from both the weighted sum and the
//! coverage denominator, and is listed under `excluded_components`.
//! Full precision is kept until the final rounding step.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce::{clamp, round2, unit_confidence};
use crate::contract::{Component, SubscoreRecord};
use crate::error::{Result, ScoreError};

/// Relative importance of each component. Immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub market_integrity: f64,
    pub dev_velocity: f64,
    pub on_chain_security: f64,
    pub social_sentiment: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            market_integrity: 0.25,
            dev_velocity: 0.20,
            on_chain_security: 0.35,
            social_sentiment: 0.20,
        }
    }
}

impl WeightTable {
    pub fn weight(&self, component: Component) -> f64 {
        match component {
            Component::MarketIntegrity => self.market_integrity,
            Component::DevVelocity => self.dev_velocity,
            Component::OnChainSecurity => self.on_chain_security,
            Component::SocialSentiment => self.social_sentiment,
        }
    }

    pub fn total(&self) -> f64 {
        Component::ALL.iter().map(|c| self.weight(*c)).sum()
    }

    /// Every weight finite and within `[0, 1]`, and at least one positive.
    pub fn is_valid(&self) -> bool {
        Component::ALL.iter().all(|c| {
            let w = self.weight(*c);
            w.is_finite() && (0.0..=1.0).contains(&w)
        }) && self.total() > 0.0
    }
}

/// Final output of one scoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub coin: String,
    pub master_score: f64,
    pub confidence: f64,
    pub coverage: f64,
    pub included_components: Vec<Component>,
    pub excluded_components: Vec<Component>,
    pub subscores: BTreeMap<Component, f64>,
    pub flags: Vec<String>,
    pub rationale: BTreeMap<Component, String>,
    pub details: BTreeMap<Component, Map<String, Value>>,
}

/// Outcome of one scoring source within a request.
pub type ComponentOutcome = (Component, Result<SubscoreRecord>);

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    weights: WeightTable,
}

impl Aggregator {
    pub fn new(weights: WeightTable) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Aggregate whatever succeeded. Components missing from `outcomes` or
    /// carrying an error are excluded. Fails only when coverage is zero.
    pub fn aggregate(&self, coin: &str, outcomes: &[ComponentOutcome]) -> Result<AggregateReport> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut coverage = 0.0;
        let mut master_raw = 0.0;
        let mut confidence_raw = 0.0;
        let mut flags = BTreeSet::new();
        let mut subscores = BTreeMap::new();
        let mut rationale = BTreeMap::new();
        let mut details = BTreeMap::new();

        for component in Component::ALL {
            let record = outcomes
                .iter()
                .find(|(c, _)| *c == component)
                .and_then(|(_, r)| r.as_ref().ok());

            let Some(rec) = record else {
                excluded.push(component);
                continue;
            };

            let w = self.weights.weight(component);
            let subscore = clamp(rec.subscore, 0.0, 100.0);

            coverage += w;
            master_raw += w * subscore;
            confidence_raw += w * unit_confidence(rec.confidence);

            flags.extend(rec.flags.iter().cloned());
            included.push(component);
            subscores.insert(component, round2(subscore));
            rationale.insert(component, rec.explanation.clone());
            details.insert(component, rec.details.clone());
        }

        if coverage <= 0.0 {
            return Err(ScoreError::AggregationImpossible);
        }

        Ok(AggregateReport {
            coin: coin.to_string(),
            master_score: round2(master_raw / coverage),
            confidence: round2(confidence_raw / coverage),
            coverage: round2(coverage),
            included_components: included,
            excluded_components: excluded,
            subscores,
            flags: flags.into_iter().collect(),
            rationale,
            details,
        })
    }
}
