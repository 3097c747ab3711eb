//! HTTP surface: one read endpoint that scores a coin, plus health and metrics.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::aggregate::AggregateReport;
use crate::error::ScoreError;
use crate::metrics::Metrics;
use crate::orchestrator::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

pub fn create_router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/score", get(score));
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }
    router.layer(CorsLayer::very_permissive()).with_state(state)
}

/// Router without the metrics endpoint.
pub fn router(state: AppState) -> Router {
    create_router(state, None)
}

#[derive(Deserialize)]
struct ScoreQuery {
    #[serde(default)]
    coin: Option<String>,
}

async fn score(
    State(state): State<AppState>,
    Query(q): Query<ScoreQuery>,
) -> Result<Json<AggregateReport>, ApiError> {
    let coin = q.coin.as_deref().map(str::trim).unwrap_or_default();
    if coin.is_empty() {
        return Err(ApiError::MissingCoin);
    }
    let report = state.orchestrator.score(coin).await?;
    Ok(Json(report))
}

/// JSON body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing coin")]
    MissingCoin,

    #[error(transparent)]
    Score(#[from] ScoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCoin => StatusCode::BAD_REQUEST,
            ApiError::Score(ScoreError::ContextUnavailable { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Score(ScoreError::AggregationImpossible) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Score(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MissingCoin => "missing_coin",
            ApiError::Score(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
