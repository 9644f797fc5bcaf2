//! Mock provider implementation for testing.

use super::{ProviderError, TextProvider};
use crate::models::GenerationRequest;
use async_trait::async_trait;
use secrecy::Secret;
use std::sync::Mutex;

/// One recorded invocation of [`MockTextProvider::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub request: GenerationRequest,
}

enum Outcome {
    Reply(String),
    Fail(String),
}

/// Deterministic stand-in for the Gemini API that records what it was sent.
pub struct MockTextProvider {
    model: String,
    outcome: Outcome,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextProvider {
    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Reply(text.into()))
    }

    /// Always fail with an upstream error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Fail(message.into()))
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            model: "mock-model".to_string(),
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        _api_key: &Secret<String>,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                model: self.model.clone(),
                request: request.clone(),
            });

        match &self.outcome {
            Outcome::Reply(text) => Ok(text.clone()),
            Outcome::Fail(message) => Err(ProviderError::Upstream(message.clone())),
        }
    }
}
