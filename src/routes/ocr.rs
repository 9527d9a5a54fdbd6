//! OCR routes
//!
//! - `POST /ocr` - remote recognition only: multipart body with `file`,
//!   optional `mode` (`printed` | `handwritten`) and `model` override;
//!   answers `{ text, model }`.
//! - `POST /ocr/extract` - full acquisition pipeline: same body, but the
//!   hosted engine falls back to local tesseract on failure or blank
//!   output; answers `{ text, engine, model? }`.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::ocr::{OcrMode, RecognitionEngine, RecognitionRequest, SourceEngine};
use crate::state::AppState;

/// Create the OCR router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(recognize_remote))
        .route("/extract", post(extract_with_fallback))
}

#[derive(Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub model: String,
}

#[derive(Serialize)]
pub struct ExtractResponse {
    pub text: String,
    pub engine: SourceEngine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Pull the recognition request out of the multipart form.
async fn parse_request(multipart: &mut Multipart) -> Result<RecognitionRequest> {
    let mut image: Option<Vec<u8>> = None;
    let mut mode = OcrMode::Printed;
    let mut model_override: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => image = Some(field.bytes().await?.to_vec()),
            Some("mode") => mode = OcrMode::from_param(&field.text().await?),
            Some("model") => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    model_override = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let image = image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing image file".to_string()))?;

    // Reject non-image payloads before anything goes upstream
    image::guess_format(&image)
        .map_err(|_| AppError::BadRequest("Unsupported image format".to_string()))?;

    Ok(RecognitionRequest::new(image, mode).with_model_override(model_override))
}

/// Remote recognition, no fallback
async fn recognize_remote(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OcrResponse>> {
    let request = parse_request(&mut multipart).await?;
    let result = state.remote_engine().recognize(&request).await?;

    Ok(Json(OcrResponse {
        text: result.text,
        model: result.model.unwrap_or_default(),
    }))
}

/// Full acquisition pipeline with local fallback
async fn extract_with_fallback(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>> {
    let request = parse_request(&mut multipart).await?;
    let result = state.orchestrator().submit(request).await?;

    Ok(Json(ExtractResponse {
        text: result.text,
        engine: result.engine,
        model: result.model,
    }))
}
