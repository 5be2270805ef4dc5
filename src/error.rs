use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ndarray::ShapeError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model not found at path: {0}")]
    ModelNotFound(String),

    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} failed with HTTP status {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Download of {url} was truncated: expected {expected} bytes, got {got}")]
    DownloadTruncated { url: String, expected: u64, got: u64 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    #[error("Failed to load models")]
    LoadFailed(#[source] Box<InferenceError>),

    #[error("Comment text cannot be empty")]
    EmptyText,

    #[error("Model is not ready yet, please retry shortly")]
    NotReady,

    #[error("Unexpected model output shape: {0:?}")]
    OutputShape(Vec<usize>),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ShapeError),

    #[error("Inference task failed: {0}")]
    TaskFailed(String),
}

impl InferenceError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        InferenceError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Walks the `source()` chain and joins every message, outermost first.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

impl IntoResponse for InferenceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            InferenceError::EmptyText => (StatusCode::BAD_REQUEST, self.to_string()),
            InferenceError::NotReady => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            InferenceError::LoadFailed(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            InferenceError::OutputShape(_) | InferenceError::ShapeError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
