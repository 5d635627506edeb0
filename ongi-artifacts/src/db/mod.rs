//! Database access for ongi-artifacts
//!
//! UUIDs and timestamps are stored as TEXT; see `ongi_common::time` for the
//! timestamp format.

pub mod artifacts;
pub mod feeds;

use ongi_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open the service database and create tables if needed
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let pool = ongi_common::db::open_pool(db_path).await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create service tables (idempotent)
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // The CHECK keeps the AI description and its timestamp set or cleared together
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artifacts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            time_period TEXT,
            estimated_year TEXT,
            origin_location TEXT,
            status TEXT NOT NULL DEFAULT 'auto_generated'
                CHECK (status IN ('auto_generated', 'verified', 'featured', 'rejected')),
            image_count INTEGER NOT NULL DEFAULT 0,
            ai_description TEXT,
            ai_description_generated_at TEXT,
            ai_model_version TEXT DEFAULT 'llama3.1:8b',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK ((ai_description IS NULL) = (ai_description_generated_at IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_artifacts_status_created ON artifacts (status, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feeds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            artifact_name TEXT NOT NULL,
            content TEXT,
            status TEXT NOT NULL DEFAULT 'published',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feed_images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            feed_id INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
            image_url TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artifact_feeds (
            id TEXT PRIMARY KEY,
            artifact_id TEXT NOT NULL REFERENCES artifacts(id) ON DELETE CASCADE,
            feed_id INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            UNIQUE (artifact_id, feed_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_artifact_feeds_artifact ON artifact_feeds (artifact_id, created_at)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (artifacts, feeds, feed_images, artifact_feeds)");

    Ok(())
}
