use crate::model::classifier::Sentiment;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const PREDICTIONS_TOTAL: &str = "sentiment_predictions_total";
pub const INFERENCE_SECONDS: &str = "sentiment_inference_seconds";
pub const REJECTED_TOTAL: &str = "sentiment_rejected_total";

pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Installs the global `tracing` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be set (tests, embedding binaries).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Installs the Prometheus recorder globally and returns the handle `/metrics` renders.
pub fn install_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

/// Drains histogram buckets on a fixed interval.
///
/// `install_recorder` leaves upkeep to the caller; without it recorded samples
/// pile up between scrapes.
pub fn spawn_upkeep(handle: PrometheusHandle, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            handle.run_upkeep();
        }
    })
}

pub fn describe_metrics() {
    describe_counter!(PREDICTIONS_TOTAL, "Predictions served, by sentiment");
    describe_histogram!(
        INFERENCE_SECONDS,
        Unit::Seconds,
        "Tokenize, pad and forward-pass latency"
    );
    describe_counter!(REJECTED_TOTAL, "Prediction requests rejected, by reason");
}

pub fn record_prediction(sentiment: Sentiment, elapsed: Duration) {
    counter!(PREDICTIONS_TOTAL, "sentiment" => sentiment.as_str()).increment(1);
    histogram!(INFERENCE_SECONDS).record(elapsed.as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    counter!(REJECTED_TOTAL, "reason" => reason).increment(1);
}
