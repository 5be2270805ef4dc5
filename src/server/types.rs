use crate::model::readiness::Readiness;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};

/// Shared Application State
#[derive(Clone)]
pub struct AppState {
    pub readiness: Readiness,
    pub metrics: PrometheusHandle,
}

// --- DTOs (Data Transfer Objects) ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PredictResponse {
    /// The submitted text, echoed unmodified.
    pub text: String,
    pub sentiment: String,
    pub score: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WelcomeResponse {
    pub message: String,
}
