use api_types::Photo;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use thiserror::Error;

pub const PHOTO_LIST_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum PhotoRepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields supplied when a photo record is first inserted.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub owner_id: Option<i64>,
    pub original_path: String,
    pub name: String,
    pub size_bytes: i64,
}

pub struct PhotoRepository;

impl PhotoRepository {
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Photo>, PhotoRepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let record = sqlx::query_as::<_, Photo>(
            r#"
            SELECT id, owner_id, original_path, thumbnail_path, name, size_bytes, created_at, updated_at
            FROM photos
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }

    /// Newest first, ties broken by id so insertion order is kept within a timestamp.
    pub async fn list_recent(
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<Photo>, PhotoRepositoryError> {
        let records = sqlx::query_as::<_, Photo>(
            r#"
            SELECT id, owner_id, original_path, thumbnail_path, name, size_bytes, created_at, updated_at
            FROM photos
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    pub async fn create(pool: &SqlitePool, new: NewPhoto) -> Result<Photo, PhotoRepositoryError> {
        let now: DateTime<Utc> = Utc::now();

        let record = sqlx::query_as::<_, Photo>(
            r#"
            INSERT INTO photos (owner_id, original_path, thumbnail_path, name, size_bytes, created_at, updated_at)
            VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?5)
            RETURNING id, owner_id, original_path, thumbnail_path, name, size_bytes, created_at, updated_at
            "#,
        )
        .bind(new.owner_id)
        .bind(new.original_path)
        .bind(new.name)
        .bind(new.size_bytes)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Attach a thumbnail only if the photo has none yet.
    ///
    /// Returns `None` when the photo is gone or already has a thumbnail.
    pub async fn set_thumbnail_if_absent(
        pool: &SqlitePool,
        id: i64,
        thumbnail_path: &str,
    ) -> Result<Option<Photo>, PhotoRepositoryError> {
        let record = sqlx::query_as::<_, Photo>(
            r#"
            UPDATE photos
            SET thumbnail_path = ?2, updated_at = ?3
            WHERE id = ?1 AND thumbnail_path IS NULL
            RETURNING id, owner_id, original_path, thumbnail_path, name, size_bytes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(thumbnail_path)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<u64, PhotoRepositoryError> {
        let result = sqlx::query("DELETE FROM photos WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
