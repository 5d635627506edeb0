//! Generation run for one artifact, as a stream of client frames
//!
//! Chunks are forwarded as they arrive and accumulated. On `Done` with
//! non-blank text the full text is persisted and a `complete` frame carries
//! it; every other ending produces one `error` frame. The stream is lazy: dropping it before `Done`
//! drops the model-service connection and nothing is written.

use futures::stream::Stream;
use futures::StreamExt;
use ongi_common::time::now;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::artifacts::save_ai_description;
use crate::generation::{build_prompt, DescriptionGenerator, GenerationEvent, PromptContext};
use crate::models::Artifact;

pub const EMPTY_COMPLETION_MESSAGE: &str = "Model returned an empty description";

/// One outbound frame, serialized as `{"type": ..., <payload>}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DescriptionFrame {
    Chunk { content: String },
    Error { message: String },
    Complete { full_text: String },
}

impl DescriptionFrame {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DescriptionFrame::Chunk { .. })
    }
}

/// Generate, forward and persist a description for `artifact`
pub fn description_frames(
    db: SqlitePool,
    generator: Arc<dyn DescriptionGenerator>,
    artifact: Artifact,
) -> impl Stream<Item = DescriptionFrame> + Send + 'static {
    async_stream::stream! {
        let prompt = build_prompt(&PromptContext::from(&artifact));
        info!(
            artifact_id = %artifact.id,
            model = generator.model_id(),
            "Generating AI description"
        );

        let mut events = generator.generate(prompt);
        let mut full_text = String::new();
        let mut chunk_count = 0usize;

        while let Some(event) = events.next().await {
            match event {
                GenerationEvent::Chunk(content) => {
                    full_text.push_str(&content);
                    chunk_count += 1;
                    yield DescriptionFrame::Chunk { content };
                }
                GenerationEvent::Error(message) => {
                    warn!(
                        artifact_id = %artifact.id,
                        chunks = chunk_count,
                        error = %message,
                        "AI description generation failed"
                    );
                    yield DescriptionFrame::Error { message };
                    return;
                }
                GenerationEvent::Done if full_text.trim().is_empty() => {
                    warn!(artifact_id = %artifact.id, chunks = chunk_count, "Model returned no text");
                    yield DescriptionFrame::Error {
                        message: EMPTY_COMPLETION_MESSAGE.to_string(),
                    };
                    return;
                }
                GenerationEvent::Done => {
                    match save_ai_description(&db, artifact.id, &full_text, now()).await {
                        Ok(()) => {
                            info!(
                                artifact_id = %artifact.id,
                                chunks = chunk_count,
                                chars = full_text.chars().count(),
                                "AI description saved"
                            );
                            yield DescriptionFrame::Complete {
                                full_text: std::mem::take(&mut full_text),
                            };
                        }
                        Err(e) => {
                            error!(artifact_id = %artifact.id, error = %e, "Failed to save AI description");
                            yield DescriptionFrame::Error {
                                message: format!("Failed to save description: {}", e),
                            };
                        }
                    }
                    return;
                }
            }
        }

        warn!(artifact_id = %artifact.id, "Generation ended without a terminal event");
        yield DescriptionFrame::Error {
            message: "Generation ended without completing".to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_wire_shape() {
        let chunk = serde_json::to_value(DescriptionFrame::Chunk {
            content: "고려".into(),
        })
        .unwrap();
        assert_eq!(chunk, json!({"type": "chunk", "content": "고려"}));

        let complete = serde_json::to_value(DescriptionFrame::Complete {
            full_text: "고려시대의".into(),
        })
        .unwrap();
        assert_eq!(complete, json!({"type": "complete", "full_text": "고려시대의"}));

        let error = serde_json::to_value(DescriptionFrame::Error {
            message: "Ollama API timeout".into(),
        })
        .unwrap();
        assert_eq!(error, json!({"type": "error", "message": "Ollama API timeout"}));
    }

    #[test]
    fn test_non_ascii_not_escaped() {
        let text = serde_json::to_string(&DescriptionFrame::Chunk {
            content: "청자".into(),
        })
        .unwrap();
        assert!(text.contains("청자"));
    }

    #[test]
    fn test_terminal_frames() {
        assert!(!DescriptionFrame::Chunk { content: String::new() }.is_terminal());
        assert!(DescriptionFrame::Error { message: String::new() }.is_terminal());
        assert!(DescriptionFrame::Complete { full_text: String::new() }.is_terminal());
    }
}
