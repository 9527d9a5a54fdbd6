//! Configuration management for Promptbook Server

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Hosted-inference settings shared by the OCR and refinement clients.
///
/// `api_token` stays optional on purpose: a server booted without the
/// credential still serves prompts and reports 503 on the inference
/// endpoints instead of crashing.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub request_timeout: Duration,
    pub printed_model: String,
    pub handwritten_model: String,
    pub chat_model: String,
    pub ocr_language: String,
    pub tesseract_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./promptbook.db".to_string(),
            },
            inference: InferenceConfig::default(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            api_token: None,
            base_url: "https://router.huggingface.co/hf-inference/models".to_string(),
            request_timeout: Duration::from_secs(30),
            printed_model: "microsoft/trocr-base-printed".to_string(),
            handwritten_model: "microsoft/trocr-base-handwritten".to_string(),
            chat_model: "HuggingFaceH4/zephyr-7b-beta".to_string(),
            ocr_language: "eng".to_string(),
            tesseract_path: "tesseract".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = InferenceConfig::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:./promptbook.db".to_string()),
            },
            inference: InferenceConfig {
                api_token: env::var("HUGGINGFACE_API_KEY")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
                base_url: env::var("HF_INFERENCE_BASE_URL").unwrap_or(defaults.base_url),
                request_timeout: env::var("INFERENCE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.request_timeout),
                printed_model: env::var("OCR_PRINTED_MODEL").unwrap_or(defaults.printed_model),
                handwritten_model: env::var("OCR_HANDWRITTEN_MODEL")
                    .unwrap_or(defaults.handwritten_model),
                chat_model: env::var("CHAT_MODEL").unwrap_or(defaults.chat_model),
                ocr_language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr_language),
                tesseract_path: env::var("TESSERACT_PATH").unwrap_or(defaults.tesseract_path),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_credential() {
        let config = Config::default();
        assert!(config.inference.api_token.is_none());
        assert_eq!(config.inference.printed_model, "microsoft/trocr-base-printed");
        assert_eq!(config.server.port, 3000);
    }
}
