use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use smsgate_metrics::{AppMetrics, CacheStatus, RequestOutcome};
use tracing::info;

use crate::{cache::PredictionCache, classify::Classifier, error::ApiError};

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<AppMetrics>,
    pub cache: Arc<PredictionCache>,
    pub classifier: Arc<dyn Classifier>,
}

/// Build axum router with mounted endpoints.
///
/// Routes:
/// - GET / - Landing page
/// - POST /sms - Classify a message
/// - GET /metrics - Prometheus exposition
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/sms", post(predict))
        .route("/sms/", post(predict))
        .route("/metrics", get(serve_metrics))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    sms: String,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    sms: String,
    result: String,
}

/// GET /
async fn index(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.record_page_view();
    "SMS spam classifier. POST a message to /sms."
}

/// POST /sms
async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.sms.trim().is_empty() {
        return Err(ApiError::InvalidRequest("sms cannot be empty".into()));
    }

    // Holds the in-flight gauge up until the response is built, including
    // classifier failures.
    let _active = state.metrics.track_request();
    let started = Instant::now();

    let (result, cache_status) = if state.cache.enabled() {
        match state.cache.get(&req.sms) {
            Some(result) => (result, CacheStatus::Hit),
            None => {
                let result = state.classifier.classify(&req.sms).await?;
                state.cache.put(&req.sms, &result);
                (result, CacheStatus::Miss)
            }
        }
    } else {
        (state.classifier.classify(&req.sms).await?, CacheStatus::Bypass)
    };

    state.metrics.set_cache_size(state.cache.len());
    state.metrics.record_request(
        RequestOutcome {
            result: &result,
            cache_status,
        },
        started.elapsed().as_secs_f64(),
        req.sms.chars().count(),
    );
    info!(result = %result, cache = cache_status.as_label(), "classified message");

    Ok(Json(PredictResponse {
        sms: req.sms,
        result,
    }))
}

/// GET /metrics
async fn serve_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, AppMetrics::CONTENT_TYPE)],
        state.metrics.render(),
    )
}
