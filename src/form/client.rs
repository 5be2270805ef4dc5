use crate::server::types::{PredictRequest, PredictResponse};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("The API did not answer within {0} seconds")]
    Timeout(u64),

    #[error("Could not reach the API: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("The API answered with HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Unexpected API response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Calls the predict endpoint, one request per submission, no retries.
#[derive(Clone)]
pub struct PredictClient {
    http: Client,
    url: String,
    timeout: Duration,
}

impl PredictClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn predict(&self, text: &str) -> Result<PredictResponse, ClientError> {
        let payload = PredictRequest {
            text: text.to_string(),
        };

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        response.json::<PredictResponse>().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout.as_secs())
            } else {
                ClientError::Decode(e)
            }
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout.as_secs())
        } else {
            ClientError::Transport(err)
        }
    }
}

/// Pulls `error` out of a JSON error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_from_json_body() {
        assert_eq!(
            error_detail(r#"{"error": "Comment text cannot be empty"}"#),
            "Comment text cannot be empty"
        );
    }

    #[test]
    fn test_error_detail_falls_back_to_text() {
        assert_eq!(error_detail("  upstream down \n"), "upstream down");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            PredictClient::new(format!("http://{}/predict/", addr), Duration::from_secs(2)).unwrap();
        let err = client.predict("great movie").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_) | ClientError::Timeout(_)));
    }
}
