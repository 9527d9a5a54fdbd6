//! Hosted-inference plumbing shared by the OCR and refinement clients.
//!
//! All upstream calls go through the [`InferenceTransport`] trait so the
//! engines can be exercised in tests without a network. The concrete
//! [`InferenceClient`] talks to the provider's model router and classifies
//! every response into a [`ProviderOutcome`] so callers switch on an enum
//! instead of inspecting raw status codes.

mod response;
pub mod retry;

pub use response::{extract_answer, extract_text};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::config::InferenceConfig;

/// Classified provider response.
///
/// `ModelLoading` is the transient "model is warming up" state (HTTP 503);
/// `Failed` is every other non-success status, carried with its body for
/// diagnosis. Neither is retried here; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    Success(Value),
    ModelLoading,
    Failed { status: u16, body: String },
}

/// Transport-level failure (connection refused, timeout, bad TLS).
#[derive(Debug, Error)]
#[error("inference transport error: {0}")]
pub struct TransportError(String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Abstract upstream transport.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// POST raw bytes (image payloads) to a model endpoint.
    async fn post_bytes(
        &self,
        model: &str,
        body: Vec<u8>,
    ) -> Result<ProviderOutcome, TransportError>;

    /// POST a JSON payload (text-generation requests) to a model endpoint.
    async fn post_json(
        &self,
        model: &str,
        payload: &Value,
    ) -> Result<ProviderOutcome, TransportError>;
}

/// HTTP client for the hosted inference router.
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl InferenceClient {
    /// Build a client from configuration. Returns `None` when no API token
    /// is configured; callers surface that as a configuration error.
    pub fn from_config(config: &InferenceConfig) -> Option<Self> {
        let token = config.api_token.clone()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("reqwest client construction cannot fail with static options");

        Some(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(model))
    }

    async fn classify(response: reqwest::Response) -> Result<ProviderOutcome, TransportError> {
        let status = response.status();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(ProviderOutcome::ModelLoading);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(ProviderOutcome::Failed {
                status: status.as_u16(),
                body,
            });
        }

        let value = response.json::<Value>().await?;
        Ok(ProviderOutcome::Success(value))
    }
}

#[async_trait]
impl InferenceTransport for InferenceClient {
    async fn post_bytes(
        &self,
        model: &str,
        body: Vec<u8>,
    ) -> Result<ProviderOutcome, TransportError> {
        let response = self
            .http
            .post(self.model_url(model))
            .bearer_auth(&self.token)
            .body(body)
            .send()
            .await?;

        Self::classify(response).await
    }

    async fn post_json(
        &self,
        model: &str,
        payload: &Value,
    ) -> Result<ProviderOutcome, TransportError> {
        let response = self
            .http
            .post(self.model_url(model))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;

        Self::classify(response).await
    }
}
