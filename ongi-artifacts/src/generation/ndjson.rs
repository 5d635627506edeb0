//! Incremental decoder for the model service's newline-delimited JSON body
//!
//! Bytes are buffered until a full line is available, so records and
//! multi-byte characters split across network reads are reassembled before
//! decoding.

use serde::Deserialize;

use super::GenerationEvent;

/// One record of `POST /api/generate` output
#[derive(Debug, Deserialize)]
struct GenerateRecord {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Turns body bytes into generation events
///
/// After a terminal event the decoder is finished and ignores further input.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    chunks_seen: usize,
    last_malformed: Option<String>,
    finished: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of text chunks produced so far
    pub fn chunks_seen(&self) -> usize {
        self.chunks_seen
    }

    /// Feed one network read
    pub fn push(&mut self, bytes: &[u8]) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.buffer.extend_from_slice(bytes);
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.decode_line(&line[..newline], &mut events);
            if self.finished {
                self.buffer.clear();
                break;
            }
        }

        events
    }

    /// Signal end of body; always leaves the decoder finished
    pub fn finish(&mut self) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(&rest, &mut events);

        if !self.finished {
            events.push(GenerationEvent::Error(self.incomplete_message()));
            self.finished = true;
        }

        events
    }

    fn decode_line(&mut self, line: &[u8], events: &mut Vec<GenerationEvent>) {
        let line = match std::str::from_utf8(line) {
            Ok(line) => line.trim(),
            Err(e) => {
                self.skip_malformed(e.to_string());
                return;
            }
        };
        if line.is_empty() {
            return;
        }

        let record: GenerateRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                self.skip_malformed(e.to_string());
                return;
            }
        };

        if let Some(error) = record.error {
            events.push(GenerationEvent::Error(error));
            self.finished = true;
            return;
        }

        if let Some(text) = record.response.filter(|text| !text.is_empty()) {
            self.chunks_seen += 1;
            events.push(GenerationEvent::Chunk(text));
        }

        if record.done {
            let terminal = match (&self.last_malformed, self.chunks_seen) {
                (Some(decode_error), 0) => {
                    GenerationEvent::Error(format!("JSON decode error: {}", decode_error))
                }
                _ => GenerationEvent::Done,
            };
            events.push(terminal);
            self.finished = true;
        }
    }

    fn skip_malformed(&mut self, error: String) {
        tracing::warn!(error = %error, "Skipping malformed line from model service");
        self.last_malformed = Some(error);
    }

    fn incomplete_message(&self) -> String {
        match (&self.last_malformed, self.chunks_seen) {
            (Some(decode_error), 0) => format!("JSON decode error: {}", decode_error),
            _ => "Ollama stream ended before completion".to_string(),
        }
    }
}
