use crate::model::classifier::Classifier;
use std::sync::{Arc, PoisonError, RwLock};

/// Lifecycle of the classifier: `Loading` moves once to `Ready` or `Failed`.
#[derive(Clone)]
pub enum ModelState {
    Loading,
    Ready(Arc<Classifier>),
    Failed(String),
}

/// Shared, cloneable view of the process-wide model state.
/// Readers take a short read lock and walk away with an `Arc<Classifier>`.
#[derive(Clone)]
pub struct Readiness {
    state: Arc<RwLock<ModelState>>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ModelState::Loading)),
        }
    }

    /// Handle that starts out ready, so router tests can skip the loader.
    #[cfg(test)]
    pub(crate) fn ready(classifier: Classifier) -> Self {
        Self {
            state: Arc::new(RwLock::new(ModelState::Ready(Arc::new(classifier)))),
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn classifier(&self) -> Option<Arc<Classifier>> {
        match self.state() {
            ModelState::Ready(classifier) => Some(classifier),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_ready(&self) -> bool {
        matches!(self.state(), ModelState::Ready(_))
    }

    pub fn mark_ready(&self, classifier: Classifier) -> bool {
        self.transition(ModelState::Ready(Arc::new(classifier)))
    }

    pub fn mark_failed(&self, reason: impl Into<String>) -> bool {
        self.transition(ModelState::Failed(reason.into()))
    }

    // Terminal states never change again.
    fn transition(&self, next: ModelState) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*state, ModelState::Loading) {
            tracing::warn!("Ignoring readiness transition, model already settled");
            return false;
        }
        *state = next;
        true
    }
}
