use crate::error::InferenceError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const MODEL_CONFIG_URL: &str = "MODEL_CONFIG_URL";
pub const MODEL_WEIGHTS_URL: &str = "MODEL_WEIGHTS_URL";
pub const TOKENIZER_URL: &str = "TOKENIZER_URL";

/// Environment variable pointing at the YAML config file.
pub const CONFIG_PATH_VAR: &str = "SENTIMENT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub inference: InferenceConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Local paths the three artifacts are downloaded to and loaded from.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ArtifactConfig {
    pub model_config_path: PathBuf,
    /// Must be the external-data file name the graph references, next to the graph.
    pub model_weights_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_config_path: PathBuf::from("model/sentiment.onnx"),
            model_weights_path: PathBuf::from("model/sentiment.onnx.data"),
            tokenizer_path: PathBuf::from("model/tokenizer.json"),
        }
    }
}

/// Training-time constants of the model artifact.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    pub max_sequence_length: usize,
    pub threshold: f32,
    pub intra_threads: usize,
    pub positive_label: String,
    pub negative_label: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_sequence_length: 50,
            threshold: 0.5,
            intra_threads: 1,
            positive_label: "Positive".to_string(),
            negative_label: "Negative".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self, InferenceError> {
        let config: AppConfig = serde_yaml::from_str(content)
            .map_err(|e| InferenceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the YAML file at `path`, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| InferenceError::io(path, e))?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        let inference = &self.inference;
        if inference.max_sequence_length == 0 {
            return Err(InferenceError::InvalidConfig(
                "max_sequence_length must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&inference.threshold) {
            return Err(InferenceError::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                inference.threshold
            )));
        }
        if inference.intra_threads == 0 {
            return Err(InferenceError::InvalidConfig(
                "intra_threads must be greater than zero".to_string(),
            ));
        }
        if inference.positive_label.is_empty()
            || inference.negative_label.is_empty()
            || inference.positive_label == inference.negative_label
        {
            return Err(InferenceError::InvalidConfig(
                "positive_label and negative_label must be distinct and non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// One artifact to bootstrap: where it lives locally and where to fetch it from.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactSource {
    pub env_var: &'static str,
    pub url: String,
    pub path: PathBuf,
}

impl ArtifactConfig {
    /// Pairs each local path with its URL from `lookup`, in load order.
    ///
    /// All three URLs are required whether or not the files are already on
    /// disk. A blank value counts as missing, and the error names every
    /// missing variable at once.
    pub fn sources<F>(&self, lookup: F) -> Result<Vec<ArtifactSource>, InferenceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sources = Vec::with_capacity(3);
        let mut missing = Vec::new();
        for (env_var, path) in [
            (MODEL_CONFIG_URL, &self.model_config_path),
            (MODEL_WEIGHTS_URL, &self.model_weights_path),
            (TOKENIZER_URL, &self.tokenizer_path),
        ] {
            match lookup(env_var).filter(|url| !url.trim().is_empty()) {
                Some(url) => sources.push(ArtifactSource {
                    env_var,
                    url,
                    path: path.clone(),
                }),
                None => missing.push(env_var.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(InferenceError::MissingConfig(missing));
        }
        Ok(sources)
    }
}
