use crate::error::InferenceError;
use ndarray::Array2;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Id written into padded positions.
pub const PAD_ID: u32 = 0;

const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Word-index tokenizer compatible with the JSON written by Keras' `Tokenizer.to_json()`.
///
/// Only the forward mapping (text to ids) is supported; the vocabulary is fixed
/// at training time and never mutated while serving.
#[derive(Debug, Clone)]
pub struct WordIndexTokenizer {
    word_index: HashMap<String, u32>,
    num_words: Option<u32>,
    filters: Vec<char>,
    lower: bool,
    split: String,
    char_level: bool,
    oov_index: Option<u32>,
}

#[derive(Deserialize)]
struct TokenizerDocument {
    config: TokenizerConfig,
}

#[derive(Deserialize)]
struct TokenizerConfig {
    #[serde(default)]
    num_words: Option<u32>,
    #[serde(default = "default_filters")]
    filters: String,
    #[serde(default = "default_lower")]
    lower: bool,
    #[serde(default = "default_split")]
    split: String,
    #[serde(default)]
    char_level: bool,
    #[serde(default)]
    oov_token: Option<String>,
    word_index: WordIndexField,
}

// Keras stores the index as a JSON string inside the JSON document.
#[derive(Deserialize)]
#[serde(untagged)]
enum WordIndexField {
    Encoded(String),
    Map(HashMap<String, u32>),
}

fn default_filters() -> String {
    DEFAULT_FILTERS.to_string()
}

fn default_lower() -> bool {
    true
}

fn default_split() -> String {
    " ".to_string()
}

impl WordIndexTokenizer {
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let document: TokenizerDocument = serde_json::from_str(json)
            .map_err(|e| InferenceError::TokenizerError(e.to_string()))?;
        let config = document.config;

        let word_index = match config.word_index {
            WordIndexField::Map(map) => map,
            WordIndexField::Encoded(encoded) => serde_json::from_str(&encoded).map_err(|e| {
                InferenceError::TokenizerError(format!("invalid word_index: {}", e))
            })?,
        };
        if word_index.is_empty() {
            return Err(InferenceError::TokenizerError(
                "word_index is empty".to_string(),
            ));
        }
        if config.split.is_empty() {
            return Err(InferenceError::TokenizerError(
                "split separator cannot be empty".to_string(),
            ));
        }

        let oov_index = config
            .oov_token
            .as_ref()
            .and_then(|token| word_index.get(token).copied());

        Ok(Self {
            word_index,
            num_words: config.num_words,
            filters: config.filters.chars().collect(),
            lower: config.lower,
            split: config.split,
            char_level: config.char_level,
            oov_index,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| InferenceError::io(path, e))?;
        let tokenizer = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            vocabulary = tokenizer.vocabulary_size(),
            "Loaded tokenizer"
        );
        Ok(tokenizer)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.word_index.len()
    }

    /// Splits `text` into the units looked up in the word index.
    fn words(&self, text: &str) -> Vec<String> {
        let text = if self.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        if self.char_level {
            return text.chars().map(String::from).collect();
        }

        let mut translated = String::with_capacity(text.len());
        for c in text.chars() {
            if self.filters.contains(&c) {
                translated.push_str(&self.split);
            } else {
                translated.push(c);
            }
        }

        translated
            .split(self.split.as_str())
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Maps `text` to word ids. Unknown or out-of-range words become the OOV id
    /// when the tokenizer has one, and are dropped otherwise.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.words(text)
            .iter()
            .filter_map(|word| match self.word_index.get(word) {
                Some(&id) => match self.num_words {
                    Some(limit) if id >= limit => self.oov_index,
                    _ => Some(id),
                },
                None => self.oov_index,
            })
            .collect()
    }
}

/// Pads with `value` or truncates at the end so the result is exactly `maxlen` long.
pub fn pad_sequence(ids: &[u32], maxlen: usize, value: u32) -> Vec<u32> {
    let mut padded: Vec<u32> = ids.iter().take(maxlen).copied().collect();
    padded.resize(maxlen, value);
    padded
}

/// Builds the `[1, maxlen]` model input for one text.
pub fn preprocess_text(
    tokenizer: &WordIndexTokenizer,
    text: &str,
    maxlen: usize,
) -> Result<Array2<f32>, InferenceError> {
    let ids = tokenizer.encode(text);
    let padded = pad_sequence(&ids, maxlen, PAD_ID);
    let data: Vec<f32> = padded.into_iter().map(|id| id as f32).collect();

    let array = Array2::from_shape_vec((1, maxlen), data)?;
    Ok(array)
}
