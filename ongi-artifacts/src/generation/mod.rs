//! Text generation against a local model service
//!
//! A generator turns a prompt into a lazy, single-pass stream of
//! [`GenerationEvent`]s. Every stream ends with exactly one terminal event
//! (`Done` or `Error`).

pub mod client;
pub mod ndjson;
pub mod prompt;

pub use client::{OllamaClient, OllamaConfig, UpstreamError};
pub use prompt::{build_prompt, PromptContext};

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// One step of a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    /// Incremental piece of generated text
    Chunk(String),
    /// Model reported completion
    Done,
    /// Run failed; carries a human-readable message
    Error(String),
}

impl GenerationEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationEvent::Chunk(_))
    }
}

/// Sampling options forwarded to the model service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 500,
        }
    }
}

/// Source of generated descriptions
///
/// Implemented by [`OllamaClient`]; tests substitute scripted generators.
pub trait DescriptionGenerator: Send + Sync {
    /// Model identifier recorded alongside generated text
    fn model_id(&self) -> &str;

    /// Start a streaming run for `prompt`
    ///
    /// Nothing happens until the returned stream is polled. Dropping the
    /// stream abandons the run.
    fn generate(&self, prompt: String) -> BoxStream<'static, GenerationEvent>;
}

/// Failed non-streaming generation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct GenerationFailed(pub String);

/// Run a generation to completion and return the whole text
pub async fn generate_text(
    generator: &dyn DescriptionGenerator,
    prompt: String,
) -> Result<String, GenerationFailed> {
    let mut events = generator.generate(prompt);
    let mut text = String::new();

    while let Some(event) = events.next().await {
        match event {
            GenerationEvent::Chunk(chunk) => text.push_str(&chunk),
            GenerationEvent::Done => return Ok(text),
            GenerationEvent::Error(message) => return Err(GenerationFailed(message)),
        }
    }

    Err(GenerationFailed(
        "Generation ended without completing".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    struct Scripted(Vec<GenerationEvent>);

    impl DescriptionGenerator for Scripted {
        fn model_id(&self) -> &str {
            "scripted"
        }

        fn generate(&self, _prompt: String) -> BoxStream<'static, GenerationEvent> {
            stream::iter(self.0.clone()).boxed()
        }
    }

    #[tokio::test]
    async fn test_generate_text_concatenates_chunks() {
        let generator = Scripted(vec![
            GenerationEvent::Chunk("고려".into()),
            GenerationEvent::Chunk("시대의".into()),
            GenerationEvent::Done,
        ]);
        let text = generate_text(&generator, "p".into()).await.unwrap();
        assert_eq!(text, "고려시대의");
    }

    #[tokio::test]
    async fn test_generate_text_surfaces_error() {
        let generator = Scripted(vec![
            GenerationEvent::Chunk("a".into()),
            GenerationEvent::Error("Ollama API error: 500".into()),
        ]);
        let err = generate_text(&generator, "p".into()).await.unwrap_err();
        assert_eq!(err.to_string(), "Ollama API error: 500");
    }

    #[tokio::test]
    async fn test_generate_text_requires_terminal_event() {
        let generator = Scripted(vec![GenerationEvent::Chunk("a".into())]);
        assert!(generate_text(&generator, "p".into()).await.is_err());
    }

    #[test]
    fn test_terminal_events() {
        assert!(!GenerationEvent::Chunk("x".into()).is_terminal());
        assert!(GenerationEvent::Done.is_terminal());
        assert!(GenerationEvent::Error("boom".into()).is_terminal());
    }

    #[test]
    fn test_options_defaults_and_partial_toml() {
        let options: GenerationOptions = toml::from_str("temperature = 0.2").unwrap();
        assert_eq!(options.temperature, 0.2);
        assert_eq!(options.top_p, 0.9);
        assert_eq!(options.max_tokens, 500);
    }
}
