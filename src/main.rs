use sentiment_serve::{config, model, server, telemetry};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Init
    telemetry::init_tracing();
    let metrics = telemetry::install_metrics()?;
    telemetry::spawn_upkeep(metrics.clone(), telemetry::UPKEEP_INTERVAL);

    // 2. Load Config
    let config_path = std::env::var(config::CONFIG_PATH_VAR)
        .unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.to_string());
    let app_config = config::AppConfig::load(&config_path)?;
    let sources = app_config
        .artifacts
        .sources(|key| std::env::var(key).ok())?;

    // 3. Load the model in the background; requests get 503 until it is ready
    let readiness = model::readiness::Readiness::new();
    model::loader::spawn_loader(readiness.clone(), app_config.clone(), sources);

    // 4. Create Router
    let app = server::routes::create_router(readiness, metrics);

    // 5. Bind & Serve
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
