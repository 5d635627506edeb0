//! Artifact list, detail, update and feed listing

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;

use super::{find_artifact, Caller};
use crate::db::artifacts::{self as artifact_db, StatusFilter};
use crate::db::feeds::{count_linked_feeds, first_feed_image, list_linked_feeds};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Artifact, ArtifactChanges, ArtifactDetail, ArtifactStatus, ArtifactSummary, Feed,
};
use crate::pagination::{Page, PageRequest};
use crate::AppState;

/// Number of feeds embedded in the detail view
pub const DETAIL_FEED_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `verified` when absent; `all` or a status value otherwise
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedsQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn status_filter(raw: Option<&str>, caller: Caller) -> ApiResult<StatusFilter> {
    let filter = match raw {
        None => StatusFilter::Only(ArtifactStatus::Verified),
        Some("all") if caller.is_staff => StatusFilter::Any,
        Some("all") => StatusFilter::ExcludeRejected,
        Some(raw) => {
            let status: ArtifactStatus = raw.parse().map_err(ApiError::BadRequest)?;
            if status == ArtifactStatus::Rejected && !caller.is_staff {
                return Err(ApiError::Forbidden(
                    "Rejected artifacts are visible to staff only".to_string(),
                ));
            }
            StatusFilter::Only(status)
        }
    };
    Ok(filter)
}

fn ensure_visible(artifact: &Artifact, caller: Caller) -> ApiResult<()> {
    if artifact.is_rejected() && !caller.is_staff {
        return Err(ApiError::Forbidden(format!(
            "Artifact {} is not available",
            artifact.id
        )));
    }
    Ok(())
}

async fn summarize(
    db: &SqlitePool,
    artifact: Artifact,
    now: DateTime<Utc>,
) -> ApiResult<ArtifactSummary> {
    let feed_count = count_linked_feeds(db, artifact.id).await?;
    let thumbnail_url = first_feed_image(db, artifact.id).await?;
    Ok(ArtifactSummary::new(artifact, feed_count, thumbnail_url, now))
}

/// GET /api/artifacts/
pub async fn list_artifacts(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ArtifactSummary>>> {
    let filter = status_filter(query.status.as_deref(), caller)?;
    let artifacts = artifact_db::list_artifacts(&state.db, filter).await?;

    let now = Utc::now();
    let mut summaries = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        summaries.push(summarize(&state.db, artifact, now).await?);
    }

    Ok(Json(summaries))
}

/// GET /api/artifacts/:artifact_id/
pub async fn get_artifact(
    State(state): State<AppState>,
    caller: Caller,
    Path(artifact_id): Path<String>,
) -> ApiResult<Json<ArtifactDetail>> {
    let artifact = find_artifact(&state, &artifact_id).await?;
    ensure_visible(&artifact, caller)?;

    let feeds = list_linked_feeds(&state.db, artifact.id, DETAIL_FEED_LIMIT, 0).await?;
    let summary = summarize(&state.db, artifact, Utc::now()).await?;

    Ok(Json(ArtifactDetail { summary, feeds }))
}

/// PATCH|PUT /api/artifacts/:artifact_id/update/
///
/// Both methods are partial updates. Unknown and read-only keys are ignored.
pub async fn update_artifact(
    State(state): State<AppState>,
    caller: Caller,
    Path(artifact_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<ArtifactSummary>> {
    caller.require_staff()?;
    let artifact = find_artifact(&state, &artifact_id).await?;

    let changes = ArtifactChanges::from_json(&body).map_err(ApiError::Validation)?;
    let updated = if changes.is_empty() {
        artifact
    } else {
        let updated = artifact_db::update_artifact(&state.db, artifact.id, &changes).await?;
        info!(artifact_id = %updated.id, "Artifact updated");
        updated
    };

    Ok(Json(summarize(&state.db, updated, Utc::now()).await?))
}

/// GET /api/artifacts/:artifact_id/feeds/
pub async fn list_artifact_feeds(
    State(state): State<AppState>,
    caller: Caller,
    Path(artifact_id): Path<String>,
    Query(query): Query<FeedsQuery>,
) -> ApiResult<Json<Page<Feed>>> {
    let artifact = find_artifact(&state, &artifact_id).await?;
    ensure_visible(&artifact, caller)?;

    let request = PageRequest::parse(query.page.as_deref(), query.page_size.as_deref())
        .map_err(ApiError::BadRequest)?;

    let count = count_linked_feeds(&state.db, artifact.id).await?;
    let feeds =
        list_linked_feeds(&state.db, artifact.id, request.page_size, request.offset()).await?;

    Ok(Json(Page::new(feeds, count, request)))
}

/// Build artifact routes
pub fn artifact_routes() -> Router<AppState> {
    Router::new()
        .route("/api/artifacts/", get(list_artifacts))
        .route("/api/artifacts/:artifact_id/", get(get_artifact))
        .route(
            "/api/artifacts/:artifact_id/update/",
            patch(update_artifact).put(update_artifact),
        )
        .route("/api/artifacts/:artifact_id/feeds/", get(list_artifact_feeds))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAFF: Caller = Caller { is_staff: true };
    const PUBLIC: Caller = Caller { is_staff: false };

    #[test]
    fn test_default_filter_is_verified() {
        assert_eq!(
            status_filter(None, PUBLIC).unwrap(),
            StatusFilter::Only(ArtifactStatus::Verified)
        );
    }

    #[test]
    fn test_all_depends_on_caller() {
        assert_eq!(status_filter(Some("all"), STAFF).unwrap(), StatusFilter::Any);
        assert_eq!(
            status_filter(Some("all"), PUBLIC).unwrap(),
            StatusFilter::ExcludeRejected
        );
    }

    #[test]
    fn test_rejected_needs_staff() {
        assert!(matches!(
            status_filter(Some("rejected"), PUBLIC),
            Err(ApiError::Forbidden(_))
        ));
        assert_eq!(
            status_filter(Some("rejected"), STAFF).unwrap(),
            StatusFilter::Only(ArtifactStatus::Rejected)
        );
    }

    #[test]
    fn test_unknown_status_is_bad_request() {
        assert!(matches!(
            status_filter(Some("archived"), STAFF),
            Err(ApiError::BadRequest(_))
        ));
    }
}
