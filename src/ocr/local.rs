//! Local fallback engine
//!
//! Runs the tesseract CLI against a temp file. Single attempt, no retry:
//! any failure here is terminal for the whole acquisition run. Unlike the
//! remote engine, empty output is a valid result.
//!
//! Requires the `tesseract` binary on PATH (or `TESSERACT_PATH`).

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::InferenceConfig;

use super::types::{OcrError, RecognitionRequest, RecognitionResult, SourceEngine};
use super::RecognitionEngine;

/// Tesseract-backed recognizer with a fixed working language.
pub struct LocalEngine {
    tesseract_path: String,
    language: String,
}

impl LocalEngine {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            tesseract_path: config.tesseract_path.clone(),
            language: config.ocr_language.clone(),
        }
    }
}

#[async_trait]
impl RecognitionEngine for LocalEngine {
    fn source(&self) -> SourceEngine {
        SourceEngine::Local
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<RecognitionResult, OcrError> {
        if request.image.is_empty() {
            return Err(OcrError::InvalidImage("Missing image file".to_string()));
        }

        let temp_dir = std::env::temp_dir();
        let input_path = temp_dir.join(format!("ocr_input_{}.png", uuid::Uuid::new_v4()));
        // Tesseract appends .txt itself
        let output_base = temp_dir.join(format!("ocr_output_{}", uuid::Uuid::new_v4()));

        tokio::fs::write(&input_path, &request.image)
            .await
            .map_err(|e| OcrError::Processing(format!("Failed to write temp file: {}", e)))?;

        let output = Command::new(&self.tesseract_path)
            .arg(&input_path)
            .arg(&output_base)
            .arg("-l")
            .arg(&self.language)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("3")
            .output()
            .await;

        let _ = tokio::fs::remove_file(&input_path).await;

        let output =
            output.map_err(|e| OcrError::Processing(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Processing(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        let output_file = format!("{}.txt", output_base.display());
        let text = tokio::fs::read_to_string(&output_file)
            .await
            .map_err(|e| OcrError::Processing(format!("Failed to read output: {}", e)))?;

        let _ = tokio::fs::remove_file(&output_file).await;

        Ok(RecognitionResult {
            text: text.trim().to_string(),
            engine: SourceEngine::Local,
            model: None,
        })
    }
}
