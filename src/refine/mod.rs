//! Refinement client
//!
//! Sends extracted text plus an instruction to a hosted text-generation
//! model and returns a cleaned-up reusable prompt. Independent of the OCR
//! path; invoked on demand.
//!
//! Unlike the OCR path there is no retry budget here: a loading model maps
//! straight to a "retry in a moment" error and the caller decides when to
//! resubmit.

use std::sync::Arc;

use serde_json::json;

use crate::config::InferenceConfig;
use crate::inference::{extract_answer, InferenceClient, InferenceTransport, ProviderOutcome};

/// Instruction used when the caller does not supply one.
pub const DEFAULT_INSTRUCTION: &str = "Refine and clean up this text into a high-quality reusable AI prompt. Return just the improved prompt.";

/// Hard ceiling on generated tokens, regardless of the caller's ask.
pub const MAX_TOKENS_CEILING: u32 = 512;

const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One refinement call.
#[derive(Debug, Clone, Default)]
pub struct RefinementRequest {
    pub source_text: String,
    pub instruction: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RefinementResult {
    pub model: String,
    pub answer: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RefineError {
    #[error("Empty 'prompt' field")]
    EmptyPrompt,

    #[error("Chat service is currently unavailable. The server administrator needs to configure HUGGINGFACE_API_KEY.")]
    MissingCredential,

    #[error("Model is loading. Please retry in a moment.")]
    ModelLoading,

    #[error("Chat model request failed ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Chat inference request failed: {0}")]
    Transport(String),
}

impl RefineError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::EmptyPrompt => StatusCode::BAD_REQUEST,
            Self::MissingCredential | Self::ModelLoading => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Compose the single instruction+text payload. The trailing section header
/// is what the model completes.
pub fn compose_payload(instruction: &str, source_text: &str) -> String {
    format!("Instruction: {instruction}\n---\nOriginal Text:\n{source_text}\n---\nImproved Prompt:")
}

/// Client for the hosted text-generation endpoint.
pub struct RefinementClient {
    transport: Option<Arc<dyn InferenceTransport>>,
    default_model: String,
}

impl RefinementClient {
    pub fn from_config(config: &InferenceConfig) -> Self {
        let transport = InferenceClient::from_config(config)
            .map(|client| Arc::new(client) as Arc<dyn InferenceTransport>);

        Self {
            transport,
            default_model: config.chat_model.clone(),
        }
    }

    /// Client with an explicit transport, for wiring and tests.
    pub fn with_transport(transport: Arc<dyn InferenceTransport>, config: &InferenceConfig) -> Self {
        Self {
            transport: Some(transport),
            default_model: config.chat_model.clone(),
        }
    }

    pub async fn refine(
        &self,
        request: RefinementRequest,
    ) -> Result<RefinementResult, RefineError> {
        let source = request.source_text.trim();
        if source.is_empty() {
            return Err(RefineError::EmptyPrompt);
        }

        let transport = self
            .transport
            .as_ref()
            .ok_or(RefineError::MissingCredential)?;

        let instruction = request
            .instruction
            .as_deref()
            .unwrap_or(DEFAULT_INSTRUCTION);
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let max_tokens = request
            .max_tokens
            .unwrap_or(DEFAULT_MAX_TOKENS)
            .min(MAX_TOKENS_CEILING);
        let temperature = request.temperature.unwrap_or(DEFAULT_TEMPERATURE);

        let payload = json!({
            "inputs": compose_payload(instruction, source),
            "parameters": {
                "max_new_tokens": max_tokens,
                "temperature": temperature,
                "return_full_text": false,
            },
        });

        let outcome = transport
            .post_json(&model, &payload)
            .await
            .map_err(|e| RefineError::Transport(e.to_string()))?;

        match outcome {
            ProviderOutcome::Success(value) => Ok(RefinementResult {
                model,
                answer: extract_answer(&value),
            }),
            ProviderOutcome::ModelLoading => Err(RefineError::ModelLoading),
            ProviderOutcome::Failed { status, body } => Err(RefineError::Upstream { status, body }),
        }
    }
}
