use crate::config::{AppConfig, ArtifactSource};
use crate::error::InferenceError;
use crate::model::classifier::{Classifier, OnnxSentimentModel};
use crate::model::download::ensure_artifact;
use crate::model::readiness::Readiness;
use crate::preprocessing::text::WordIndexTokenizer;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() -> Result<(), InferenceError> {
    ort::init().with_name("sentiment-serve").commit()?;
    Ok(())
}

/// Loads an ONNX graph from disk and creates an inference session.
///
/// Weights stored as external data are resolved relative to the graph's directory.
pub fn load_model(
    model_path: impl AsRef<Path>,
    intra_threads: usize,
) -> Result<Session, InferenceError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(InferenceError::ModelNotFound(path.display().to_string()));
    }

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?;

    tracing::info!(path = %path.display(), "Loaded model");
    for (i, input) in session.inputs.iter().enumerate() {
        tracing::debug!(index = i, name = %input.name, kind = ?input.input_type, "Model input");
    }

    Ok(session)
}

/// Checks that `weights` is where the graph will look for its external data.
///
/// ONNX Runtime resolves external tensors by the file name stored in the graph,
/// relative to the graph's directory. The configured weights path must match
/// both, otherwise the session would load without reading the downloaded file.
pub fn check_external_data(graph: &Path, weights: &Path) -> Result<(), InferenceError> {
    if weights.parent() != graph.parent() {
        return Err(InferenceError::InvalidConfig(format!(
            "weights {} must sit in the same directory as the graph {}",
            weights.display(),
            graph.display()
        )));
    }

    let name = weights
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = std::fs::read(graph).map_err(|e| InferenceError::io(graph, e))?;
    if name.is_empty() || !bytes.windows(name.len()).any(|w| w == name.as_bytes()) {
        return Err(InferenceError::InvalidConfig(format!(
            "graph {} does not reference external data file {:?}",
            graph.display(),
            name
        )));
    }
    Ok(())
}

/// Downloads whatever is missing, then builds the classifier.
/// Any failure comes back as `LoadFailed` with the real cause chained.
pub async fn load_classifier(
    config: &AppConfig,
    sources: &[ArtifactSource],
) -> Result<Classifier, InferenceError> {
    load_inner(config, sources)
        .await
        .map_err(|e| InferenceError::LoadFailed(Box::new(e)))
}

async fn load_inner(
    config: &AppConfig,
    sources: &[ArtifactSource],
) -> Result<Classifier, InferenceError> {
    let client = reqwest::Client::new();
    for source in sources {
        ensure_artifact(&client, source).await?;
    }

    let artifacts = config.artifacts.clone();
    let settings = config.inference.clone();

    if !artifacts.model_weights_path.exists() {
        return Err(InferenceError::ModelNotFound(
            artifacts.model_weights_path.display().to_string(),
        ));
    }
    tokio::task::spawn_blocking(move || {
        check_external_data(&artifacts.model_config_path, &artifacts.model_weights_path)?;
        init_ort()?;
        let session = load_model(&artifacts.model_config_path, settings.intra_threads)?;
        let model = OnnxSentimentModel::new(session)?;
        let tokenizer = WordIndexTokenizer::from_file(&artifacts.tokenizer_path)?;
        Ok(Classifier::new(tokenizer, Arc::new(model), settings))
    })
    .await
    .map_err(|e| InferenceError::TaskFailed(e.to_string()))?
}

/// Loads the classifier in the background and settles `readiness` with the outcome.
pub fn spawn_loader(
    readiness: Readiness,
    config: AppConfig,
    sources: Vec<ArtifactSource>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Loading model and tokenizer");
        match load_classifier(&config, &sources).await {
            Ok(classifier) => {
                readiness.mark_ready(classifier);
                tracing::info!("Model loaded, ready to serve");
            }
            Err(err) => {
                let reason = err.chain_message();
                tracing::error!(error = %reason, "Model loading failed; service stays unavailable");
                readiness.mark_failed(reason);
            }
        }
    })
}
