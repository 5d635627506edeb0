//! Feed reads for artifact detail pages
//!
//! `insert_feed` and `link_feed` exist for the ingestion side and fixtures.

use ongi_common::time::{now, parse_db_timestamp, to_db_timestamp};
use ongi_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Feed, NewFeed};

async fn load_images(pool: &SqlitePool, feed_id: i64) -> Result<Vec<String>> {
    let images = sqlx::query_scalar::<_, String>(
        "SELECT image_url FROM feed_images WHERE feed_id = ? ORDER BY position, id",
    )
    .bind(feed_id)
    .fetch_all(pool)
    .await?;
    Ok(images)
}

async fn feed_from_row(pool: &SqlitePool, row: &SqliteRow) -> Result<Feed> {
    let id: i64 = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Feed {
        id,
        artifact_name: row.try_get("artifact_name")?,
        content: row.try_get("content")?,
        status: row.try_get("status")?,
        images: load_images(pool, id).await?,
        created_at: parse_db_timestamp(&created_at)?,
    })
}

/// Insert a feed and its images
pub async fn insert_feed(pool: &SqlitePool, feed: &NewFeed) -> Result<Feed> {
    let created_at = now();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO feeds (artifact_name, content, status, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&feed.artifact_name)
    .bind(&feed.content)
    .bind(&feed.status)
    .bind(to_db_timestamp(created_at))
    .execute(&mut *tx)
    .await?;
    let feed_id = result.last_insert_rowid();

    for (position, url) in feed.images.iter().enumerate() {
        sqlx::query("INSERT INTO feed_images (feed_id, image_url, position) VALUES (?, ?, ?)")
            .bind(feed_id)
            .bind(url)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(Feed {
        id: feed_id,
        artifact_name: feed.artifact_name.clone(),
        content: feed.content.clone(),
        status: feed.status.clone(),
        images: feed.images.clone(),
        created_at: parse_db_timestamp(&to_db_timestamp(created_at))?,
    })
}

/// Link a feed to an artifact; linking twice is a no-op
pub async fn link_feed(pool: &SqlitePool, artifact_id: Uuid, feed_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO artifact_feeds (id, artifact_id, feed_id, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(artifact_id.to_string())
    .bind(feed_id)
    .bind(to_db_timestamp(now()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn count_linked_feeds(pool: &SqlitePool, artifact_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM artifact_feeds WHERE artifact_id = ?",
    )
    .bind(artifact_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Linked feeds in link order (oldest link first)
pub async fn list_linked_feeds(
    pool: &SqlitePool,
    artifact_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Feed>> {
    let rows = sqlx::query(
        r#"
        SELECT f.id, f.artifact_name, f.content, f.status, f.created_at
        FROM artifact_feeds af
        JOIN feeds f ON f.id = af.feed_id
        WHERE af.artifact_id = ?
        ORDER BY af.created_at, af.rowid
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(artifact_id.to_string())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut feeds = Vec::with_capacity(rows.len());
    for row in &rows {
        feeds.push(feed_from_row(pool, row).await?);
    }
    Ok(feeds)
}

/// First image of the first linked feed, used as the list thumbnail
pub async fn first_feed_image(pool: &SqlitePool, artifact_id: Uuid) -> Result<Option<String>> {
    let url = sqlx::query_scalar::<_, String>(
        r#"
        SELECT fi.image_url
        FROM feed_images fi
        WHERE fi.feed_id = (
            SELECT af.feed_id FROM artifact_feeds af
            WHERE af.artifact_id = ?
            ORDER BY af.created_at, af.rowid
            LIMIT 1
        )
        ORDER BY fi.position, fi.id
        LIMIT 1
        "#,
    )
    .bind(artifact_id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(url)
}
