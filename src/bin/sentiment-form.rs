use sentiment_serve::form::{self, client::PredictClient, FormConfig, FormState};
use sentiment_serve::telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = FormConfig::from_env();
    let client = PredictClient::new(&config.api_url, form::REQUEST_TIMEOUT)?;
    let app = form::create_router(FormState {
        client,
        positive_label: config.positive_label,
    });

    let listener = TcpListener::bind(&config.bind).await?;
    tracing::info!(api = %config.api_url, "Form listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
