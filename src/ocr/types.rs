//! OCR Types
//!
//! Request/result types shared by the recognition engines and the
//! orchestrator.

use serde::{Deserialize, Serialize};

/// Which recognition engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEngine {
    /// Hosted image-to-text inference
    Remote,
    /// In-process tesseract fallback
    Local,
}

/// Kind of text expected in the image. Selects the remote model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrMode {
    #[default]
    Printed,
    Handwritten,
}

impl OcrMode {
    /// Parse a form field value. Anything other than `handwritten` selects
    /// the printed model, matching the documented default.
    pub fn from_param(value: &str) -> Self {
        if value.eq_ignore_ascii_case("handwritten") {
            OcrMode::Handwritten
        } else {
            OcrMode::Printed
        }
    }
}

/// A single recognition request. Immutable once issued.
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    /// Raw image bytes
    pub image: Vec<u8>,
    /// Printed or handwritten model selection
    pub mode: OcrMode,
    /// Optional upstream model id override
    pub model_override: Option<String>,
}

impl RecognitionRequest {
    pub fn new(image: Vec<u8>, mode: OcrMode) -> Self {
        Self {
            image,
            mode,
            model_override: None,
        }
    }

    pub fn with_model_override(mut self, model: Option<String>) -> Self {
        self.model_override = model;
        self
    }
}

/// Extracted text plus provenance.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionResult {
    /// Recognized text, trimmed
    pub text: String,
    /// Engine that produced the text
    pub engine: SourceEngine,
    /// Upstream model id, when the remote engine ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// OCR error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum OcrError {
    #[error("OCR service is currently unavailable. The server administrator needs to configure HUGGINGFACE_API_KEY.")]
    MissingCredential,

    #[error("{0}")]
    InvalidImage(String),

    #[error("OCR model request failed ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("OCR inference request failed: {0}")]
    Transport(String),

    #[error("OCR inference is not available (model loading or rate limited). Try again.")]
    ServiceUnavailable,

    #[error("OCR processing failed: {0}")]
    Processing(String),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::MissingCredential | Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidImage(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
