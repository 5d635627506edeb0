//! HTTP API handlers for ongi-artifacts

pub mod artifacts;
pub mod caller;
pub mod descriptions;
pub mod health;

pub use artifacts::artifact_routes;
pub use caller::{Caller, STAFF_TOKEN_HEADER};
pub use descriptions::description_routes;
pub use health::health_routes;

use uuid::Uuid;

use crate::db::artifacts::load_artifact;
use crate::error::{ApiError, ApiResult};
use crate::models::Artifact;
use crate::AppState;

/// Parse an artifact id from the path (400 when malformed)
pub(crate) fn parse_artifact_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid artifact id", raw)))
}

/// Load an artifact or fail with 404
pub(crate) async fn find_artifact(state: &AppState, raw_id: &str) -> ApiResult<Artifact> {
    let id = parse_artifact_id(raw_id)?;
    load_artifact(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Artifact {}", id)))
}
