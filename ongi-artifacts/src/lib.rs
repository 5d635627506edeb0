//! ongi-artifacts library interface
//!
//! Artifact records, their linked feeds, and AI-written descriptions streamed
//! from a local Ollama instance.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod models;
pub mod pagination;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::generation::DescriptionGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Source of AI descriptions
    pub generator: Arc<dyn DescriptionGenerator>,
    /// Token that marks a request as staff; `None` means nobody is staff
    pub staff_token: Option<String>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        generator: Arc<dyn DescriptionGenerator>,
        staff_token: Option<String>,
    ) -> Self {
        Self {
            db,
            generator,
            staff_token: staff_token.filter(|token| !token.is_empty()),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::artifact_routes())
        .merge(api::description_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
