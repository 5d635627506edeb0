//! Artifact record and its API representations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::feed::Feed;
use crate::services::descriptions::needs_regeneration;

/// Model recorded for descriptions when nothing else is configured
pub const DEFAULT_MODEL_VERSION: &str = "llama3.1:8b";

/// Review status of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Created automatically from feed submissions
    #[default]
    AutoGenerated,
    Verified,
    Featured,
    /// Hidden from non-staff callers
    Rejected,
}

impl ArtifactStatus {
    pub const ALL: [ArtifactStatus; 4] = [
        ArtifactStatus::AutoGenerated,
        ArtifactStatus::Verified,
        ArtifactStatus::Featured,
        ArtifactStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStatus::AutoGenerated => "auto_generated",
            ArtifactStatus::Verified => "verified",
            ArtifactStatus::Featured => "featured",
            ArtifactStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("\"{}\" is not a valid choice.", s))
    }
}

/// Cultural heritage item as stored in the `artifacts` table
///
/// `ai_description` and `ai_description_generated_at` are always both set or
/// both null. Only `db::artifacts::save_ai_description` and
/// `db::artifacts::clear_ai_description` write them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub name: String,
    /// Human-written description
    pub description: Option<String>,
    pub time_period: Option<String>,
    pub estimated_year: Option<String>,
    pub origin_location: Option<String>,
    pub status: ArtifactStatus,
    pub image_count: i64,
    pub ai_description: Option<String>,
    pub ai_description_generated_at: Option<DateTime<Utc>>,
    pub ai_model_version: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artifact {
    /// Cached AI description, treating an empty string as absent
    pub fn cached_ai_description(&self) -> Option<&str> {
        self.ai_description.as_deref().filter(|text| !text.is_empty())
    }

    pub fn is_rejected(&self) -> bool {
        self.status == ArtifactStatus::Rejected
    }
}

/// Data required to create a new artifact
#[derive(Debug, Clone, Default)]
pub struct NewArtifact {
    pub name: String,
    pub description: Option<String>,
    pub time_period: Option<String>,
    pub estimated_year: Option<String>,
    pub origin_location: Option<String>,
    pub status: ArtifactStatus,
    pub image_count: i64,
}

impl NewArtifact {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Artifact as returned by list, update and (flattened) detail endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub time_period: Option<String>,
    pub estimated_year: Option<String>,
    pub origin_location: Option<String>,
    pub status: ArtifactStatus,
    pub image_count: i64,
    pub feed_count: i64,
    pub thumbnail_url: Option<String>,
    pub ai_description: Option<String>,
    pub ai_description_generated_at: Option<DateTime<Utc>>,
    pub ai_model_version: Option<String>,
    pub has_ai_description: bool,
    pub needs_ai_generation: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArtifactSummary {
    pub fn new(
        artifact: Artifact,
        feed_count: i64,
        thumbnail_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let has_ai_description = artifact.cached_ai_description().is_some();
        let needs_ai_generation = needs_regeneration(&artifact, now);

        Self {
            id: artifact.id,
            name: artifact.name,
            description: artifact.description,
            time_period: artifact.time_period,
            estimated_year: artifact.estimated_year,
            origin_location: artifact.origin_location,
            status: artifact.status,
            image_count: artifact.image_count,
            feed_count,
            thumbnail_url,
            ai_description: artifact.ai_description,
            ai_description_generated_at: artifact.ai_description_generated_at,
            ai_model_version: artifact.ai_model_version,
            has_ai_description,
            needs_ai_generation,
            created_at: artifact.created_at,
            updated_at: artifact.updated_at,
        }
    }
}

/// Detail view: summary fields plus the first few linked feeds
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactDetail {
    #[serde(flatten)]
    pub summary: ArtifactSummary,
    pub feeds: Vec<Feed>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_artifact() -> Artifact {
        let now = Utc::now();
        Artifact {
            id: Uuid::new_v4(),
            name: "청동거울".to_string(),
            description: Some("고려 시대 청동 거울".to_string()),
            time_period: Some("고려".to_string()),
            estimated_year: None,
            origin_location: Some("개성".to_string()),
            status: ArtifactStatus::Verified,
            image_count: 12,
            ai_description: None,
            ai_description_generated_at: None,
            ai_model_version: Some(DEFAULT_MODEL_VERSION.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ArtifactStatus::ALL {
            assert_eq!(status.as_str().parse::<ArtifactStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_status_rejects_unknown_value() {
        let err = "archived".parse::<ArtifactStatus>().unwrap_err();
        assert!(err.contains("archived"));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ArtifactStatus::AutoGenerated).unwrap();
        assert_eq!(json, "\"auto_generated\"");
    }

    #[test]
    fn test_empty_ai_description_counts_as_absent() {
        let mut artifact = sample_artifact();
        artifact.ai_description = Some(String::new());
        artifact.ai_description_generated_at = Some(Utc::now());
        assert_eq!(artifact.cached_ai_description(), None);
    }

    #[test]
    fn test_summary_flags_follow_cached_description() {
        let now = Utc::now();
        let mut artifact = sample_artifact();
        artifact.ai_description = Some("고려 시대의 거울".to_string());
        artifact.ai_description_generated_at = Some(now - Duration::days(1));

        let summary = ArtifactSummary::new(artifact, 3, None, now);
        assert!(summary.has_ai_description);
        assert!(!summary.needs_ai_generation);
        assert_eq!(summary.feed_count, 3);
    }

    #[test]
    fn test_detail_flattens_summary() {
        let summary = ArtifactSummary::new(sample_artifact(), 0, None, Utc::now());
        let detail = ArtifactDetail {
            summary,
            feeds: Vec::new(),
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["name"], "청동거울");
        assert_eq!(value["status"], "verified");
        assert!(value["feeds"].as_array().unwrap().is_empty());
        assert_eq!(value["needs_ai_generation"], true);
    }
}
