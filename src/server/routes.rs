use crate::model::readiness::Readiness;
use crate::server::{handlers, types::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

pub fn create_router(readiness: Readiness, metrics: PrometheusHandle) -> Router {
    let state = Arc::new(AppState { readiness, metrics });

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/predict/", post(handlers::predict))
        .route("/predict", post(handlers::predict))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}
