//! Browser form for the prediction API.
//!
//! Renders a text box server-side; each submission makes exactly one call to
//! the predict endpoint and renders the label and confidence, or the error.

pub mod client;
pub mod page;

use axum::{extract::State, response::Html, routing::get, Form, Router};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use client::PredictClient;
use page::Outcome;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/predict/";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BIND: &str = "0.0.0.0:8501";

#[derive(Debug, Clone, PartialEq)]
pub struct FormConfig {
    pub api_url: String,
    pub bind: String,
    pub positive_label: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            bind: DEFAULT_BIND.to_string(),
            positive_label: "Positive".to_string(),
        }
    }
}

impl FormConfig {
    /// `FORM_API_URL`, `FORM_BIND` and `FORM_POSITIVE_LABEL` override the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |key: &str, default: String| {
            std::env::var(key)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(default)
        };
        Self {
            api_url: var("FORM_API_URL", defaults.api_url),
            bind: var("FORM_BIND", defaults.bind),
            positive_label: var("FORM_POSITIVE_LABEL", defaults.positive_label),
        }
    }
}

pub struct FormState {
    pub client: PredictClient,
    pub positive_label: String,
}

#[derive(Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub text: String,
}

pub fn create_router(state: FormState) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit))
        .with_state(Arc::new(state))
}

async fn show_form(State(state): State<Arc<FormState>>) -> Html<String> {
    Html(page::render("", None, state.client.url()))
}

async fn submit(
    State(state): State<Arc<FormState>>,
    Form(submission): Form<Submission>,
) -> Html<String> {
    let outcome = analyze(&state, &submission.text).await;
    Html(page::render(
        &submission.text,
        Some(&outcome),
        state.client.url(),
    ))
}

async fn analyze(state: &FormState, text: &str) -> Outcome {
    if text.trim().is_empty() {
        return Outcome::Warning("Please enter a comment to analyze.".to_string());
    }

    match state.client.predict(text).await {
        Ok(response) => Outcome::Result {
            positive: response.sentiment == state.positive_label,
            label: response.sentiment,
            score: response.score,
        },
        Err(err) => {
            tracing::warn!(error = %err, "Prediction request failed");
            Outcome::Error(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::testing::{test_classifier, FixedScoreModel};
    use crate::model::readiness::Readiness;
    use crate::server::routes;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    /// Starts the prediction API on an ephemeral port and returns its predict URL.
    async fn spawn_api(readiness: Readiness) -> String {
        let metrics = PrometheusBuilder::new().build_recorder().handle();
        let app = routes::create_router(readiness, metrics);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/predict/", addr)
    }

    fn form_router(api_url: &str) -> Router {
        create_router(FormState {
            client: PredictClient::new(api_url, REQUEST_TIMEOUT).unwrap(),
            positive_label: "Positive".to_string(),
        })
    }

    async fn submit_text(app: Router, text: &str) -> String {
        let body = format!("text={}", text.replace(' ', "+"));
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_form_page_renders() {
        let app = form_router(DEFAULT_API_URL);
        let request = Request::get("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("<textarea"));
    }

    #[tokio::test]
    async fn test_submit_renders_positive_result() {
        let model = FixedScoreModel::new(0.73);
        let api_url = spawn_api(Readiness::ready(test_classifier(model.clone()))).await;

        let page = submit_text(form_router(&api_url), "great movie").await;

        assert!(page.contains(r#"class="result positive""#));
        assert!(page.contains("73.00%"));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_renders_negative_result() {
        let api_url = spawn_api(Readiness::ready(test_classifier(FixedScoreModel::new(0.2)))).await;

        let page = submit_text(form_router(&api_url), "terrible film").await;

        assert!(page.contains(r#"class="result negative""#));
        assert!(page.contains("20.00%"));
    }

    #[tokio::test]
    async fn test_empty_submission_warns_without_calling_api() {
        let model = FixedScoreModel::new(0.73);
        let api_url = spawn_api(Readiness::ready(test_classifier(model.clone()))).await;

        let page = submit_text(form_router(&api_url), "").await;

        assert!(page.contains(r#"class="warning""#));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_unready_api_renders_error() {
        let api_url = spawn_api(Readiness::new()).await;

        let page = submit_text(form_router(&api_url), "great movie").await;

        assert!(page.contains(r#"class="error""#));
        assert!(page.contains("HTTP 503"));
    }

    #[test]
    fn test_form_config_defaults() {
        let config = FormConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(REQUEST_TIMEOUT, Duration::from_secs(30));
    }
}
