//! Artifact database operations
//!
//! The AI description pair is only ever written by [`save_ai_description`]
//! and [`clear_ai_description`], each a single UPDATE of exactly those two
//! columns.

use chrono::{DateTime, Utc};
use ongi_common::time::{now, parse_db_timestamp, to_db_timestamp};
use ongi_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{Artifact, ArtifactChanges, ArtifactStatus, NewArtifact};

const ARTIFACT_COLUMNS: &str = "id, name, description, time_period, estimated_year, \
     origin_location, status, image_count, ai_description, ai_description_generated_at, \
     ai_model_version, created_at, updated_at";

/// Which statuses a listing includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Any,
    ExcludeRejected,
    Only(ArtifactStatus),
}

fn artifact_from_row(row: &SqliteRow) -> Result<Artifact> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Invalid artifact id '{}': {}", id, e)))?;

    let status: String = row.try_get("status")?;
    let status = status.parse::<ArtifactStatus>().map_err(Error::Internal)?;

    let generated_at: Option<String> = row.try_get("ai_description_generated_at")?;
    let generated_at = generated_at
        .as_deref()
        .map(parse_db_timestamp)
        .transpose()?;

    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Artifact {
        id,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        time_period: row.try_get("time_period")?,
        estimated_year: row.try_get("estimated_year")?,
        origin_location: row.try_get("origin_location")?,
        status,
        image_count: row.try_get("image_count")?,
        ai_description: row.try_get("ai_description")?,
        ai_description_generated_at: generated_at,
        ai_model_version: row.try_get("ai_model_version")?,
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}

/// Insert a new artifact and return the stored record
pub async fn insert_artifact(pool: &SqlitePool, artifact: &NewArtifact) -> Result<Artifact> {
    let id = Uuid::new_v4();
    let timestamp = to_db_timestamp(now());

    sqlx::query(
        r#"
        INSERT INTO artifacts (
            id, name, description, time_period, estimated_year, origin_location,
            status, image_count, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&artifact.name)
    .bind(&artifact.description)
    .bind(&artifact.time_period)
    .bind(&artifact.estimated_year)
    .bind(&artifact.origin_location)
    .bind(artifact.status.as_str())
    .bind(artifact.image_count)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await?;

    load_artifact(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Artifact {} vanished after insert", id)))
}

/// Load one artifact by id
pub async fn load_artifact(pool: &SqlitePool, id: Uuid) -> Result<Option<Artifact>> {
    let sql = format!("SELECT {} FROM artifacts WHERE id = ?", ARTIFACT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(artifact_from_row).transpose()
}

/// List artifacts, newest first
pub async fn list_artifacts(pool: &SqlitePool, filter: StatusFilter) -> Result<Vec<Artifact>> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM artifacts", ARTIFACT_COLUMNS));

    match filter {
        StatusFilter::Any => {}
        StatusFilter::ExcludeRejected => {
            builder
                .push(" WHERE status <> ")
                .push_bind(ArtifactStatus::Rejected.as_str());
        }
        StatusFilter::Only(status) => {
            builder.push(" WHERE status = ").push_bind(status.as_str());
        }
    }
    builder.push(" ORDER BY created_at DESC, rowid DESC");

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(artifact_from_row).collect()
}

/// Apply editable-field changes and return the updated record
pub async fn update_artifact(
    pool: &SqlitePool,
    id: Uuid,
    changes: &ArtifactChanges,
) -> Result<Artifact> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE artifacts SET updated_at = ");
    builder.push_bind(to_db_timestamp(now()));

    if let Some(name) = &changes.name {
        builder.push(", name = ").push_bind(name.clone());
    }

    let nullable_columns = [
        ("description", &changes.description),
        ("time_period", &changes.time_period),
        ("estimated_year", &changes.estimated_year),
        ("origin_location", &changes.origin_location),
        ("ai_model_version", &changes.ai_model_version),
    ];
    for (column, value) in nullable_columns {
        if let Some(value) = value {
            builder
                .push(format!(", {} = ", column))
                .push_bind(value.clone());
        }
    }

    if let Some(status) = changes.status {
        builder.push(", status = ").push_bind(status.as_str());
    }

    builder.push(" WHERE id = ").push_bind(id.to_string());

    let result = builder.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Artifact {}", id)));
    }

    load_artifact(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Artifact {}", id)))
}

/// Store a generated description together with its generation time
pub async fn save_ai_description(
    pool: &SqlitePool,
    id: Uuid,
    description: &str,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE artifacts
        SET ai_description = ?, ai_description_generated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(description)
    .bind(to_db_timestamp(generated_at))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Artifact {}", id)));
    }

    Ok(())
}

/// Drop the cached description and its timestamp
pub async fn clear_ai_description(pool: &SqlitePool, id: Uuid) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE artifacts
        SET ai_description = NULL, ai_description_generated_at = NULL
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Artifact {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn test_pool() -> SqlitePool {
        let pool = ongi_common::db::open_in_memory().await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_then_load() {
        let pool = test_pool().await;
        let mut new = NewArtifact::named("청동거울");
        new.time_period = Some("고려".to_string());

        let inserted = insert_artifact(&pool, &new).await.unwrap();
        let loaded = load_artifact(&pool, inserted.id).await.unwrap().unwrap();

        assert_eq!(loaded, inserted);
        assert_eq!(loaded.status, ArtifactStatus::AutoGenerated);
        assert_eq!(loaded.ai_model_version.as_deref(), Some("llama3.1:8b"));
        assert!(loaded.ai_description.is_none());
        assert!(loaded.ai_description_generated_at.is_none());
    }

    #[tokio::test]
    async fn test_load_unknown_is_none() {
        let pool = test_pool().await;
        assert!(load_artifact(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let pool = test_pool().await;
        for (name, status) in [
            ("a", ArtifactStatus::Verified),
            ("b", ArtifactStatus::Rejected),
            ("c", ArtifactStatus::AutoGenerated),
        ] {
            let mut new = NewArtifact::named(name);
            new.status = status;
            insert_artifact(&pool, &new).await.unwrap();
        }

        let all = list_artifacts(&pool, StatusFilter::Any).await.unwrap();
        assert_eq!(all.len(), 3);
        // Newest first
        assert_eq!(all[0].name, "c");

        let visible = list_artifacts(&pool, StatusFilter::ExcludeRejected).await.unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|a| !a.is_rejected()));

        let verified = list_artifacts(&pool, StatusFilter::Only(ArtifactStatus::Verified))
            .await
            .unwrap();
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].name, "a");
    }

    #[tokio::test]
    async fn test_update_only_touches_given_columns() {
        let pool = test_pool().await;
        let mut new = NewArtifact::named("분청사기");
        new.origin_location = Some("강진".to_string());
        let artifact = insert_artifact(&pool, &new).await.unwrap();

        let changes = ArtifactChanges {
            time_period: Some(Some("조선".to_string())),
            status: Some(ArtifactStatus::Verified),
            ..ArtifactChanges::default()
        };
        let updated = update_artifact(&pool, artifact.id, &changes).await.unwrap();

        assert_eq!(updated.name, "분청사기");
        assert_eq!(updated.time_period.as_deref(), Some("조선"));
        assert_eq!(updated.origin_location.as_deref(), Some("강진"));
        assert_eq!(updated.status, ArtifactStatus::Verified);
        assert!(updated.updated_at >= artifact.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let pool = test_pool().await;
        let err = update_artifact(&pool, Uuid::new_v4(), &ArtifactChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_internal_error() {
        let pool = test_pool().await;
        let artifact = insert_artifact(&pool, &NewArtifact::named("석탑"))
            .await
            .unwrap();
        sqlx::query("UPDATE artifacts SET created_at = 'not-a-date' WHERE id = ?")
            .bind(artifact.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let err = load_artifact(&pool, artifact.id).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn test_save_and_clear_description_pair() {
        let pool = test_pool().await;
        let artifact = insert_artifact(&pool, &NewArtifact::named("금동관"))
            .await
            .unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

        save_ai_description(&pool, artifact.id, "신라의 금관", at).await.unwrap();
        let saved = load_artifact(&pool, artifact.id).await.unwrap().unwrap();
        assert_eq!(saved.ai_description.as_deref(), Some("신라의 금관"));
        assert_eq!(saved.ai_description_generated_at, Some(at));
        // Saving a description is not an edit
        assert_eq!(saved.updated_at, artifact.updated_at);

        clear_ai_description(&pool, artifact.id).await.unwrap();
        let cleared = load_artifact(&pool, artifact.id).await.unwrap().unwrap();
        assert!(cleared.ai_description.is_none());
        assert!(cleared.ai_description_generated_at.is_none());
    }

    #[tokio::test]
    async fn test_save_description_for_missing_artifact_fails() {
        let pool = test_pool().await;
        let err = save_ai_description(&pool, Uuid::new_v4(), "text", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_schema_rejects_half_written_description() {
        let pool = test_pool().await;
        let artifact = insert_artifact(&pool, &NewArtifact::named("철검"))
            .await
            .unwrap();

        let result = sqlx::query("UPDATE artifacts SET ai_description = 'x' WHERE id = ?")
            .bind(artifact.id.to_string())
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }
}
