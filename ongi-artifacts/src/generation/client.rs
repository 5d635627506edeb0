//! Ollama streaming client
//!
//! One `POST {base_url}/api/generate` per run. The response body is decoded
//! incrementally by [`LineDecoder`]; transport failures are folded into a
//! single terminal [`GenerationEvent::Error`].

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::ndjson::LineDecoder;
use super::{DescriptionGenerator, GenerationEvent, GenerationOptions};
use crate::models::DEFAULT_MODEL_VERSION;

const USER_AGENT: &str = concat!("ongi-artifacts/", env!("CARGO_PKG_VERSION"));

/// Model service settings (`[ollama]` config section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Applies to connecting, receiving headers and each body read
    pub timeout_ms: u64,
    pub options: GenerationOptions,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: DEFAULT_MODEL_VERSION.to_string(),
            timeout_ms: 60_000,
            options: GenerationOptions::default(),
        }
    }
}

/// Model service failures, rendered into `GenerationEvent::Error` messages
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Ollama API timeout")]
    Timeout,

    #[error("Cannot connect to Ollama at {0}. Is it running?")]
    Unavailable(String),

    #[error("Ollama API error: {0}")]
    BadStatus(u16),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl UpstreamError {
    fn from_reqwest(err: reqwest::Error, base_url: &str) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_connect() {
            UpstreamError::Unavailable(base_url.to_string())
        } else {
            UpstreamError::Unexpected(err.to_string())
        }
    }
}

impl From<UpstreamError> for GenerationEvent {
    fn from(err: UpstreamError) -> Self {
        GenerationEvent::Error(err.to_string())
    }
}

/// Request body for `/api/generate`
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerationOptions,
}

/// HTTP client for a local Ollama instance
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http_client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| UpstreamError::Unexpected(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }

    /// Start a run with explicit model settings
    ///
    /// With `stream` false the service answers with one record, which decodes
    /// the same way.
    pub fn generate_with(
        &self,
        prompt: String,
        model: String,
        options: GenerationOptions,
        stream: bool,
    ) -> BoxStream<'static, GenerationEvent> {
        let http_client = self.http_client.clone();
        let url = self.generate_url();
        let base_url = self.config.base_url.clone();
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let request = GenerateRequest {
            model,
            prompt,
            stream,
            options,
        };

        let events = async_stream::stream! {
            tracing::debug!(url = %url, model = %request.model, "Starting generation");

            let send = http_client.post(&url).json(&request).send();
            let response = match tokio::time::timeout(timeout, send).await {
                Err(_) => {
                    tracing::warn!(url = %url, "Model service timed out before responding");
                    yield GenerationEvent::from(UpstreamError::Timeout);
                    return;
                }
                Ok(Err(e)) => {
                    let err = UpstreamError::from_reqwest(e, &base_url);
                    tracing::warn!(url = %url, error = %err, "Model service request failed");
                    yield GenerationEvent::from(err);
                    return;
                }
                Ok(Ok(response)) => response,
            };

            let status = response.status();
            if !status.is_success() {
                tracing::warn!(url = %url, status = status.as_u16(), "Model service returned error status");
                yield GenerationEvent::from(UpstreamError::BadStatus(status.as_u16()));
                return;
            }

            let mut body = Box::pin(response.bytes_stream());
            let mut decoder = LineDecoder::new();
            loop {
                let events = match tokio::time::timeout(timeout, body.next()).await {
                    Err(_) => {
                        tracing::warn!(url = %url, chunks = decoder.chunks_seen(), "Model service stalled mid-stream");
                        yield GenerationEvent::from(UpstreamError::Timeout);
                        return;
                    }
                    Ok(Some(Ok(bytes))) => decoder.push(&bytes),
                    Ok(Some(Err(e))) => {
                        yield GenerationEvent::from(UpstreamError::from_reqwest(e, &base_url));
                        return;
                    }
                    Ok(None) => decoder.finish(),
                };

                for event in events {
                    yield event;
                }

                if decoder.is_finished() {
                    tracing::debug!(chunks = decoder.chunks_seen(), "Generation stream finished");
                    return;
                }
            }
        };

        events.boxed()
    }
}

impl DescriptionGenerator for OllamaClient {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn generate(&self, prompt: String) -> BoxStream<'static, GenerationEvent> {
        self.generate_with(
            prompt,
            self.config.model.clone(),
            self.config.options.clone(),
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest {
            model: "llama3.1:8b".to_string(),
            prompt: "p".to_string(),
            stream: true,
            options: GenerationOptions::default(),
        };
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "llama3.1:8b");
        assert_eq!(body["stream"], true);
        assert_eq!(body["options"]["max_tokens"], 500);
        assert!((body["options"]["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_generate_url_trims_trailing_slash() {
        let client = OllamaClient::new(OllamaConfig {
            base_url: "http://ollama:11434/".to_string(),
            ..OllamaConfig::default()
        })
        .unwrap();
        assert_eq!(client.generate_url(), "http://ollama:11434/api/generate");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(UpstreamError::Timeout.to_string(), "Ollama API timeout");
        assert_eq!(
            UpstreamError::BadStatus(500).to_string(),
            "Ollama API error: 500"
        );
        assert_eq!(
            UpstreamError::Unavailable("http://localhost:11434".into()).to_string(),
            "Cannot connect to Ollama at http://localhost:11434. Is it running?"
        );
    }
}
