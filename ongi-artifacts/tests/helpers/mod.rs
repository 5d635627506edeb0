//! Shared fixtures for ongi-artifacts integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use futures::stream::{self, BoxStream, StreamExt};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

use ongi_artifacts::api::STAFF_TOKEN_HEADER;
use ongi_artifacts::db::artifacts::insert_artifact;
use ongi_artifacts::db::feeds::{insert_feed, link_feed};
use ongi_artifacts::generation::{DescriptionGenerator, GenerationEvent};
use ongi_artifacts::models::{Artifact, ArtifactStatus, NewArtifact, NewFeed};
use ongi_artifacts::AppState;

pub const STAFF_TOKEN: &str = "test-staff-token";

/// Generator that replays a fixed event list and records prompts
pub struct ScriptedGenerator {
    events: Vec<GenerationEvent>,
    hang_after_script: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(events: Vec<GenerationEvent>) -> Self {
        Self {
            events,
            hang_after_script: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replays the events, then never produces another one
    pub fn hanging(events: Vec<GenerationEvent>) -> Self {
        Self {
            hang_after_script: true,
            ..Self::new(events)
        }
    }

    pub fn chunks_then_done(chunks: &[&str]) -> Self {
        let mut events: Vec<GenerationEvent> = chunks
            .iter()
            .map(|chunk| GenerationEvent::Chunk(chunk.to_string()))
            .collect();
        events.push(GenerationEvent::Done);
        Self::new(events)
    }
}

impl DescriptionGenerator for ScriptedGenerator {
    fn model_id(&self) -> &str {
        "scripted"
    }

    fn generate(&self, prompt: String) -> BoxStream<'static, GenerationEvent> {
        self.prompts.lock().unwrap().push(prompt);
        let scripted = stream::iter(self.events.clone());
        if self.hang_after_script {
            scripted.chain(stream::pending()).boxed()
        } else {
            scripted.boxed()
        }
    }
}

pub async fn test_pool() -> SqlitePool {
    let pool = ongi_common::db::open_in_memory().await.unwrap();
    ongi_artifacts::db::init_tables(&pool).await.unwrap();
    pool
}

pub fn test_state(db: SqlitePool, generator: Arc<dyn DescriptionGenerator>) -> AppState {
    AppState::new(db, generator, Some(STAFF_TOKEN.to_string()))
}

pub async fn create_artifact(pool: &SqlitePool, name: &str, status: ArtifactStatus) -> Artifact {
    let mut new = NewArtifact::named(name);
    new.status = status;
    insert_artifact(pool, &new).await.unwrap()
}

/// Create `count` feeds with one image each and link them to the artifact
pub async fn link_feeds(pool: &SqlitePool, artifact: &Artifact, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let feed = insert_feed(
            pool,
            &NewFeed::published(artifact.name.clone(), vec![format!("img-{}.jpg", i)]),
        )
        .await
        .unwrap();
        link_feed(pool, artifact.id, feed.id).await.unwrap();
        ids.push(feed.id);
    }
    ids
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn staff_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(STAFF_TOKEN_HEADER, STAFF_TOKEN)
        .body(Body::empty())
        .unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value, staff: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if staff {
        builder = builder.header(STAFF_TOKEN_HEADER, STAFF_TOKEN);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// JSON payloads of every `data:` line in an SSE body
pub fn sse_frames(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).unwrap())
        .collect()
}
