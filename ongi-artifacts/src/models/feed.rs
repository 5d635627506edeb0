//! Feed records linked to artifacts
//!
//! Feeds are user submissions owned by the ingestion side; this service only
//! reads them (plus the fixture/ingestion helpers in `db::feeds`).

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A user-submitted feed post with its images
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    pub id: i64,
    pub artifact_name: String,
    pub content: Option<String>,
    pub status: String,
    /// Image URLs in display order
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Data required to create a feed
#[derive(Debug, Clone)]
pub struct NewFeed {
    pub artifact_name: String,
    pub content: Option<String>,
    pub status: String,
    pub images: Vec<String>,
}

impl NewFeed {
    pub fn published(artifact_name: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            artifact_name: artifact_name.into(),
            content: None,
            status: "published".to_string(),
            images,
        }
    }
}
