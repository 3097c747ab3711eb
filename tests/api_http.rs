// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /score?coin=...      (full and partial coverage)
// - GET /score               (missing coin -> 400)
// - context failure -> 502, zero coverage -> 503

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use coin_trust_score::agents::ScriptedBackend;
use coin_trust_score::api::{self, AppState};
use coin_trust_score::config::AssistantIds;
use coin_trust_score::context::{ContextProvider, FixtureContextProvider};
use coin_trust_score::{Aggregator, Orchestrator, ScoreError, WeightTable};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn ids() -> AssistantIds {
    AssistantIds {
        market_integrity: "mkt".into(),
        dev_velocity: "dev".into(),
        on_chain_security: "chain".into(),
    }
}

fn fixture() -> Json {
    let raw = include_str!("../fixtures/bitcoin_context.json");
    serde_json::from_str(raw).expect("fixture json")
}

fn router_with(backend: ScriptedBackend, weights: WeightTable) -> Router {
    let orch = Orchestrator::new(
        Arc::new(FixtureContextProvider::new(fixture())),
        Arc::new(backend),
        ids(),
        Aggregator::new(weights),
    );
    api::router(AppState::new(orch))
}

fn healthy_backend() -> ScriptedBackend {
    ScriptedBackend::new()
        .reply(
            "mkt",
            r#"{"subscore": 72, "confidence": 0.8, "flags": ["volume_spike"], "explanation": "Healthy volume.", "details": {"volume_to_mcap": 0.028}}"#,
        )
        .reply(
            "dev",
            "```json\n{\"subscore\": 88, \"confidence\": 85, \"flags\": [], \"explanation\": \"Active repo.\", \"details\": {}}\n```",
        )
        .reply(
            "chain",
            r#"Result: {"subscore": 35, "confidence": 0.6, "flags": ["holder_concentration_high", "liquidity_not_burned"], "explanation": "Concentrated holders.", "details": {"top_holder_concentration": 42.87}}"#,
        )
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse json body");
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = router_with(healthy_backend(), WeightTable::default());

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8").trim(), "OK");
}

#[tokio::test]
async fn api_score_returns_full_report() {
    let app = router_with(healthy_backend(), WeightTable::default());
    let (status, v) = get_json(app, "/score?coin=btc").await;
    assert_eq!(status, StatusCode::OK, "body: {v}");

    // Contract checks for UI consumers
    for key in [
        "coin",
        "master_score",
        "confidence",
        "coverage",
        "included_components",
        "excluded_components",
        "subscores",
        "flags",
        "rationale",
        "details",
    ] {
        assert!(v.get(key).is_some(), "missing '{key}' in {v}");
    }

    assert_eq!(v["coin"], json!("Bitcoin"));
    assert_eq!(v["coverage"], json!(1.0));
    // 0.25*72 + 0.20*88 + 0.35*35 + 0.20*79.5 = 18 + 17.6 + 12.25 + 15.9
    assert_eq!(v["master_score"], json!(63.75));
    // 0.25*0.8 + 0.20*0.85 + 0.35*0.6 + 0.20*0.9 = 0.2 + 0.17 + 0.21 + 0.18
    assert_eq!(v["confidence"], json!(0.76));
    assert_eq!(v["excluded_components"], json!([]));
    assert_eq!(
        v["flags"],
        json!([
            "Strong positive sentiment",
            "holder_concentration_high",
            "liquidity_not_burned",
            "volume_spike"
        ])
    );
    assert_eq!(v["subscores"]["social_sentiment"], json!(79.5));
    assert_eq!(v["rationale"]["dev_velocity"], json!("Active repo."));
    assert_eq!(
        v["details"]["on_chain_security"]["top_holder_concentration"],
        json!(42.87)
    );
}

#[tokio::test]
async fn api_score_reports_partial_coverage() {
    let backend = ScriptedBackend::new()
        .reply("mkt", r#"{"subscore": 60, "confidence": 0.5}"#)
        .reply("dev", "I'm unable to produce JSON today.");
    // "chain" has no scripted reply -> agent error
    let app = router_with(backend, WeightTable::default());
    let (status, v) = get_json(app, "/score?coin=btc").await;
    assert_eq!(status, StatusCode::OK, "body: {v}");

    assert_eq!(v["coverage"], json!(0.45));
    assert_eq!(
        v["included_components"],
        json!(["market_integrity", "social_sentiment"])
    );
    assert_eq!(
        v["excluded_components"],
        json!(["dev_velocity", "on_chain_security"])
    );
    assert!(v["subscores"].get("dev_velocity").is_none());
}

#[tokio::test]
async fn api_score_without_coin_is_400() {
    for uri in ["/score", "/score?coin=", "/score?coin=%20%20"] {
        let app = router_with(healthy_backend(), WeightTable::default());
        let (status, v) = get_json(app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
        assert_eq!(v["error"], json!("missing_coin"));
    }
}

#[tokio::test]
async fn api_score_zero_coverage_is_503() {
    let weights = WeightTable {
        market_integrity: 0.4,
        dev_velocity: 0.3,
        on_chain_security: 0.3,
        social_sentiment: 0.0,
    };
    let app = router_with(ScriptedBackend::new(), weights);
    let (status, v) = get_json(app, "/score?coin=btc").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(v["error"], json!("aggregation_impossible"));
    assert!(v["message"].as_str().unwrap_or_default().contains("no scoring component"));
}

struct UnavailableContext;

#[async_trait::async_trait]
impl ContextProvider for UnavailableContext {
    async fn fetch(&self, coin: &str) -> Result<Json, ScoreError> {
        Err(ScoreError::ContextUnavailable {
            coin: coin.to_string(),
            message: "fetcher printed nothing".into(),
        })
    }
    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[tokio::test]
async fn api_score_context_failure_is_502() {
    let orch = Orchestrator::new(
        Arc::new(UnavailableContext),
        Arc::new(healthy_backend()),
        ids(),
        Aggregator::default(),
    );
    let app = api::router(AppState::new(orch));
    let (status, v) = get_json(app, "/score?coin=nosuchcoin").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], json!("context_unavailable"));
    assert!(v["message"].as_str().unwrap_or_default().contains("nosuchcoin"));
}
