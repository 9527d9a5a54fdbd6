//! Remote recognition engine
//!
//! Calls the hosted image-to-text endpoint for the model variant selected
//! by the request mode. A 503 from the provider means the model is still
//! loading onto a worker; those are retried with an increasing delay up to
//! a fixed budget. Every other non-success status is terminal and carries
//! the status code and response body.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::InferenceConfig;
use crate::inference::retry::{backoff_delay, Sleeper, TokioSleeper, MAX_ATTEMPTS};
use crate::inference::{extract_text, InferenceClient, InferenceTransport, ProviderOutcome};

use super::types::{OcrError, OcrMode, RecognitionRequest, RecognitionResult, SourceEngine};
use super::RecognitionEngine;

/// Hosted image-to-text engine.
pub struct RemoteEngine {
    /// Absent when no API token is configured; surfaced as a configuration
    /// error on the first call, never retried.
    transport: Option<Arc<dyn InferenceTransport>>,
    sleeper: Arc<dyn Sleeper>,
    printed_model: String,
    handwritten_model: String,
}

impl RemoteEngine {
    pub fn from_config(config: &InferenceConfig) -> Self {
        let transport = InferenceClient::from_config(config)
            .map(|client| Arc::new(client) as Arc<dyn InferenceTransport>);

        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            printed_model: config.printed_model.clone(),
            handwritten_model: config.handwritten_model.clone(),
        }
    }

    /// Engine with an explicit transport, for wiring and tests.
    pub fn with_transport(transport: Arc<dyn InferenceTransport>, config: &InferenceConfig) -> Self {
        Self {
            transport: Some(transport),
            sleeper: Arc::new(TokioSleeper),
            printed_model: config.printed_model.clone(),
            handwritten_model: config.handwritten_model.clone(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn model_for(&self, request: &RecognitionRequest) -> String {
        if let Some(model) = &request.model_override {
            return model.clone();
        }
        match request.mode {
            OcrMode::Printed => self.printed_model.clone(),
            OcrMode::Handwritten => self.handwritten_model.clone(),
        }
    }
}

#[async_trait]
impl RecognitionEngine for RemoteEngine {
    fn source(&self) -> SourceEngine {
        SourceEngine::Remote
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<RecognitionResult, OcrError> {
        if request.image.is_empty() {
            return Err(OcrError::InvalidImage("Missing image file".to_string()));
        }

        let transport = self.transport.as_ref().ok_or(OcrError::MissingCredential)?;
        let model = self.model_for(request);

        for attempt in 1..=MAX_ATTEMPTS {
            let outcome = transport
                .post_bytes(&model, request.image.clone())
                .await
                .map_err(|e| OcrError::Transport(e.to_string()))?;

            match outcome {
                ProviderOutcome::Success(value) => {
                    // Unrecognized shapes reduce to an empty string; callers
                    // decide whether empty counts as failure.
                    return Ok(RecognitionResult {
                        text: extract_text(&value),
                        engine: SourceEngine::Remote,
                        model: Some(model),
                    });
                }
                ProviderOutcome::ModelLoading => {
                    tracing::debug!(
                        model = %model,
                        attempt,
                        "OCR model loading, backing off before retry"
                    );
                    self.sleeper.sleep(backoff_delay(attempt)).await;
                }
                ProviderOutcome::Failed { status, body } => {
                    return Err(OcrError::Upstream { status, body });
                }
            }
        }

        Err(OcrError::ServiceUnavailable)
    }
}
