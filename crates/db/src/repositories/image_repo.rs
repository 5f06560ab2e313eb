//! Repository for the `images` table.

use sqlx::PgPool;
use tabula_core::pagination::PageRequest;
use tabula_core::types::DbId;

use crate::models::image::{CreateImage, Image};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, filename, url, public_id, created_at, updated_at";

/// Provides persistence for hosted image records.
pub struct ImageRepo;

impl ImageRepo {
    /// Record a hosted image. Fails with a `uq_images_public_id` violation if
    /// the public id is already recorded.
    pub async fn create(pool: &PgPool, input: &CreateImage) -> Result<Image, sqlx::Error> {
        let query = format!(
            "INSERT INTO images (filename, url, public_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(&input.filename)
            .bind(&input.url)
            .bind(&input.public_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE id = $1");
        sqlx::query_as::<_, Image>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_public_id(
        pool: &PgPool,
        public_id: &str,
    ) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE public_id = $1");
        sqlx::query_as::<_, Image>(&query)
            .bind(public_id)
            .fetch_optional(pool)
            .await
    }

    /// One page of images ordered by id.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images ORDER BY id LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, Image>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM images")
            .fetch_one(pool)
            .await
    }

    /// Point a record at a new hosted URL (after a transform overwrote it).
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_url(
        pool: &PgPool,
        id: DbId,
        url: &str,
    ) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("UPDATE images SET url = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Image>(&query)
            .bind(id)
            .bind(url)
            .fetch_optional(pool)
            .await
    }

    /// Delete an image record by id. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
