//! Cached AI description state: read view, staleness and reset

use chrono::{DateTime, Duration, Utc};
use ongi_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::artifacts::clear_ai_description;
use crate::models::Artifact;

/// Cached descriptions older than this are regenerated
pub const STALE_AFTER_DAYS: i64 = 30;

pub const NO_DESCRIPTION_PLACEHOLDER: &str = "No description available.";

/// Whether a new AI description should be generated
///
/// `now` is passed in so callers control the clock.
pub fn needs_regeneration(artifact: &Artifact, now: DateTime<Utc>) -> bool {
    if artifact.cached_ai_description().is_none() {
        return true;
    }

    match artifact.ai_description_generated_at {
        Some(generated_at) => now - generated_at > Duration::days(STALE_AFTER_DAYS),
        None => false,
    }
}

/// Response body of `GET /api/artifacts/{id}/description/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionView {
    pub description: String,
    pub is_ai_generated: bool,
    pub generated_at: Option<DateTime<Utc>>,
    pub needs_regeneration: bool,
    pub artifact_name: String,
    pub time_period: Option<String>,
}

/// Best available description for display
pub fn describe(artifact: &Artifact, now: DateTime<Utc>) -> DescriptionView {
    let ai_description = artifact.cached_ai_description();
    let description = ai_description
        .or_else(|| artifact.description.as_deref().filter(|d| !d.is_empty()))
        .unwrap_or(NO_DESCRIPTION_PLACEHOLDER)
        .to_string();

    DescriptionView {
        description,
        is_ai_generated: ai_description.is_some(),
        generated_at: artifact.ai_description_generated_at,
        needs_regeneration: needs_regeneration(artifact, now),
        artifact_name: artifact.name.clone(),
        time_period: artifact.time_period.clone(),
    }
}

/// Forget the cached description; the next generation request recreates it
pub async fn reset(pool: &SqlitePool, artifact_id: Uuid) -> Result<()> {
    clear_ai_description(pool, artifact_id).await?;
    tracing::info!(artifact_id = %artifact_id, "AI description reset");
    Ok(())
}
