//! OCR Module
//!
//! Image-to-text acquisition with a hosted primary engine and a local
//! fallback.
//!
//! The remote engine calls the hosted inference router and retries while
//! the model variant is still warming up. When it fails, or returns blank
//! text, the [`Orchestrator`] falls back to the local tesseract engine.
//! Both engines implement [`RecognitionEngine`], so orchestration logic is
//! testable with call-counting doubles.

mod local;
mod orchestrator;
mod remote;
mod types;

pub use local::LocalEngine;
pub use orchestrator::{OcrPhase, Orchestrator};
pub use remote::RemoteEngine;
pub use types::{OcrError, OcrMode, RecognitionRequest, RecognitionResult, SourceEngine};

use async_trait::async_trait;

/// Recognition engine trait
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Which engine this is, for result provenance
    fn source(&self) -> SourceEngine;

    /// Extract text from an image
    async fn recognize(&self, request: &RecognitionRequest) -> Result<RecognitionResult, OcrError>;
}
