use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::error::InferenceError;
use crate::model::readiness::ModelState;
use crate::server::types::*;
use crate::telemetry;

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the sentiment analysis API. Use the /predict/ endpoint.".to_string(),
    })
}

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status, body) = match state.readiness.state() {
        ModelState::Ready(_) => (
            StatusCode::OK,
            HealthResponse {
                status: "ok".to_string(),
                message: "Model is loaded and ready.".to_string(),
            },
        ),
        ModelState::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthResponse {
                status: "unavailable".to_string(),
                message: "Model is loading, please wait.".to_string(),
            },
        ),
        ModelState::Failed(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthResponse {
                status: "unavailable".to_string(),
                message: reason,
            },
        ),
    };
    (status, Json(body))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, InferenceError> {
    // 1. Validate before touching the model
    if payload.text.trim().is_empty() {
        telemetry::record_rejection("empty_text");
        return Err(InferenceError::EmptyText);
    }

    let classifier = state.readiness.classifier().ok_or_else(|| {
        telemetry::record_rejection("not_ready");
        InferenceError::NotReady
    })?;

    // 2. Tokenize, pad and run the forward pass off the async workers
    let start = Instant::now();
    let text = payload.text;
    let (text, prediction) = tokio::task::spawn_blocking(move || {
        let prediction = classifier.predict(&text);
        (text, prediction)
    })
    .await
    .map_err(|e| InferenceError::TaskFailed(e.to_string()))?;
    let prediction = prediction?;
    let duration = start.elapsed();

    telemetry::record_prediction(prediction.sentiment, duration);
    tracing::debug!(
        sentiment = prediction.sentiment.as_str(),
        score = prediction.score,
        elapsed_ms = duration.as_secs_f64() * 1000.0,
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        text,
        sentiment: prediction.label,
        score: prediction.score,
    }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
