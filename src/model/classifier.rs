use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::preprocessing::text::{preprocess_text, WordIndexTokenizer};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::{Arc, Mutex};

/// A binary sentiment model: one forward pass over a `[1, maxlen]` id batch,
/// returning the probability of the positive class.
pub trait SentimentModel: Send + Sync {
    fn score(&self, input: Array2<f32>) -> Result<f32, InferenceError>;
}

/// ONNX Runtime backed model. `Session::run` needs `&mut`, so the session is
/// locked for the duration of a single forward pass.
pub struct OnnxSentimentModel {
    session: Mutex<Session>,
    input_name: String,
}

impl OnnxSentimentModel {
    pub fn new(session: Session) -> Result<Self, InferenceError> {
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| {
                InferenceError::InvalidConfig("model graph declares no inputs".to_string())
            })?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl SentimentModel for OnnxSentimentModel {
    fn score(&self, input: Array2<f32>) -> Result<f32, InferenceError> {
        let shape = input.shape().to_vec();
        let (data, _) = input.into_raw_vec_and_offset();
        let input_value = Tensor::from_array((shape, data.into_boxed_slice()))?;

        let mut session_guard = self
            .session
            .lock()
            .map_err(|_| InferenceError::TaskFailed("session lock poisoned".to_string()))?;
        let outputs = session_guard.run(ort::inputs![self.input_name.as_str() => input_value])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        data.first().copied().ok_or(InferenceError::OutputShape(dims))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    /// Strictly above the threshold is positive; the threshold itself is negative.
    pub fn from_score(score: f32, threshold: f32) -> Self {
        if score > threshold {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub sentiment: Sentiment,
    pub label: String,
    pub score: f32,
}

/// Tokenizer, model and the training-time constants that tie them together.
pub struct Classifier {
    tokenizer: WordIndexTokenizer,
    model: Arc<dyn SentimentModel>,
    settings: InferenceConfig,
}

impl Classifier {
    pub fn new(
        tokenizer: WordIndexTokenizer,
        model: Arc<dyn SentimentModel>,
        settings: InferenceConfig,
    ) -> Self {
        Self {
            tokenizer,
            model,
            settings,
        }
    }

    pub fn label(&self, sentiment: Sentiment) -> &str {
        match sentiment {
            Sentiment::Positive => &self.settings.positive_label,
            Sentiment::Negative => &self.settings.negative_label,
        }
    }

    pub fn predict(&self, text: &str) -> Result<Prediction, InferenceError> {
        if text.trim().is_empty() {
            return Err(InferenceError::EmptyText);
        }

        let input = preprocess_text(&self.tokenizer, text, self.settings.max_sequence_length)?;
        let score = self.model.score(input)?;
        let sentiment = Sentiment::from_score(score, self.settings.threshold);

        Ok(Prediction {
            sentiment,
            label: self.label(sentiment).to_string(),
            score,
        })
    }
}
