//! AI description endpoints: streaming generation, read and reset

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::{find_artifact, parse_artifact_id};
use crate::error::ApiResult;
use crate::services::{self, description_frames, DescriptionFrame, DescriptionView};
use crate::AppState;

fn frame_event(frame: &DescriptionFrame) -> Event {
    match serde_json::to_string(frame) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            warn!("SSE: Failed to serialize description frame: {}", e);
            Event::default().data(r#"{"type":"error","message":"Failed to encode frame"}"#)
        }
    }
}

/// POST /api/artifacts/:artifact_id/generate-description/
///
/// Streams `chunk` frames while the model writes, then one `complete` or
/// `error` frame. An unknown artifact is a plain 404 before any streaming.
pub async fn generate_description(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let artifact = find_artifact(&state, &artifact_id).await?;
    info!(artifact_id = %artifact.id, "SSE: Description stream requested");

    let frames = description_frames(state.db.clone(), state.generator.clone(), artifact)
        .map(|frame| Ok::<Event, Infallible>(frame_event(&frame)));

    let sse = Sse::new(frames).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    );

    Ok((
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ),
        ],
        sse,
    ))
}

/// GET /api/artifacts/:artifact_id/description/
pub async fn get_description(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> ApiResult<Json<DescriptionView>> {
    let artifact = find_artifact(&state, &artifact_id).await?;
    Ok(Json(services::describe(&artifact, Utc::now())))
}

#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub message: String,
    pub artifact_id: Uuid,
}

/// POST /api/artifacts/:artifact_id/regenerate-description/
///
/// Clears the cached description; the client then requests a new stream.
pub async fn regenerate_description(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> ApiResult<Json<RegenerateResponse>> {
    let id = parse_artifact_id(&artifact_id)?;
    services::reset(&state.db, id).await?;

    Ok(Json(RegenerateResponse {
        message: "AI description cleared. Request a new generation.".to_string(),
        artifact_id: id,
    }))
}

/// Build description routes
pub fn description_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/artifacts/:artifact_id/generate-description/",
            post(generate_description),
        )
        .route(
            "/api/artifacts/:artifact_id/description/",
            get(get_description),
        )
        .route(
            "/api/artifacts/:artifact_id/regenerate-description/",
            post(regenerate_description),
        )
}
