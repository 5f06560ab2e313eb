//! Repository for the `movies` table.

use sqlx::PgPool;
use tabula_core::csv_import::MovieCsvRow;
use tabula_core::movie::contains_pattern;
use tabula_core::pagination::PageRequest;
use tabula_core::types::DbId;

use super::{push_value_tuples, INSERT_CHUNK_ROWS};
use crate::models::movie::{CreateMovie, Movie, MovieFilter, UpdateMovie};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, director, release_year, runtime, genre, rating, gross, \
                       created_at, updated_at";

/// Columns written by a CSV import (explicit ids).
const IMPORT_COLUMNS: &str = "id, title, director, release_year, runtime, genre, rating, gross";

/// Provides CRUD, search and filtered listing for movies.
pub struct MovieRepo;

impl MovieRepo {
    /// Insert a new movie, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMovie) -> Result<Movie, sqlx::Error> {
        let query = format!(
            "INSERT INTO movies (title, director, release_year, runtime, genre, rating, gross)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(&input.title)
            .bind(&input.director)
            .bind(input.release_year)
            .bind(input.runtime)
            .bind(&input.genre)
            .bind(input.rating)
            .bind(input.gross)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of movies ordered by id.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<Vec<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies ORDER BY id LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, Movie>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(pool)
            .await
    }

    /// Update a movie. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMovie,
    ) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!(
            "UPDATE movies SET
                title = COALESCE($2, title),
                director = COALESCE($3, director),
                release_year = COALESCE($4, release_year),
                runtime = COALESCE($5, runtime),
                genre = COALESCE($6, genre),
                rating = COALESCE($7, rating),
                gross = COALESCE($8, gross)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .bind(input.title.as_deref())
            .bind(input.director.as_deref())
            .bind(input.release_year)
            .bind(input.runtime)
            .bind(input.genre.as_deref())
            .bind(input.rating)
            .bind(input.gross)
            .fetch_optional(pool)
            .await
    }

    /// Delete a movie by id. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert imported rows with their explicit ids in one transaction and
    /// advance the id sequence past the largest id.
    pub async fn bulk_insert(pool: &PgPool, rows: &[MovieCsvRow]) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut query = format!("INSERT INTO movies ({IMPORT_COLUMNS}) VALUES ");
            push_value_tuples(&mut query, chunk.len(), 8);

            let mut q = sqlx::query(&query);
            for row in chunk {
                q = q
                    .bind(row.id)
                    .bind(&row.title)
                    .bind(&row.director)
                    .bind(row.release_year)
                    .bind(row.runtime)
                    .bind(&row.genre)
                    .bind(row.rating)
                    .bind(row.gross);
            }
            inserted += q.execute(&mut *tx).await?.rows_affected();
        }

        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('movies', 'id'), \
                    COALESCE(MAX(id), 1), MAX(id) IS NOT NULL) \
             FROM movies",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(table = "movies", inserted, "Bulk import committed");
        Ok(inserted)
    }

    /// Case-insensitive substring match on title or director, ordered by id.
    /// `%` and `_` in `term` match literally.
    pub async fn search(pool: &PgPool, term: &str) -> Result<Vec<Movie>, sqlx::Error> {
        let query = format!(
            r"SELECT {COLUMNS} FROM movies
             WHERE title ILIKE $1 ESCAPE '\' OR director ILIKE $1 ESCAPE '\'
             ORDER BY id"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(contains_pattern(term))
            .fetch_all(pool)
            .await
    }

    /// One page of movies matching every present condition in `filter`.
    pub async fn filter(
        pool: &PgPool,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> Result<Vec<Movie>, sqlx::Error> {
        let (where_clause, bind_idx) = build_movie_filter(filter);
        let query = format!(
            "SELECT {COLUMNS} FROM movies {where_clause} \
             ORDER BY id \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, Movie>(&query);
        if let Some(ref genre) = filter.genre {
            q = q.bind(contains_pattern(genre));
        }
        if let Some(year) = filter.release_year {
            q = q.bind(year);
        }
        if let Some(min_gross) = filter.min_gross {
            q = q.bind(min_gross);
        }
        if let Some(min_rating) = filter.min_rating {
            q = q.bind(min_rating);
        }
        q.bind(page.limit()).bind(page.offset()).fetch_all(pool).await
    }

    /// Count movies matching `filter` (for pagination metadata).
    pub async fn count_filtered(pool: &PgPool, filter: &MovieFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, _) = build_movie_filter(filter);
        let query = format!("SELECT COUNT(*) FROM movies {where_clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        if let Some(ref genre) = filter.genre {
            q = q.bind(contains_pattern(genre));
        }
        if let Some(year) = filter.release_year {
            q = q.bind(year);
        }
        if let Some(min_gross) = filter.min_gross {
            q = q.bind(min_gross);
        }
        if let Some(min_rating) = filter.min_rating {
            q = q.bind(min_rating);
        }
        q.fetch_one(pool).await
    }
}

/// Build the WHERE clause for [`MovieFilter`]. Binds must follow the field
/// order genre, release_year, min_gross, min_rating.
///
/// Returns `(where_clause, next_bind_index)`.
fn build_movie_filter(filter: &MovieFilter) -> (String, u32) {
    let mut conditions = Vec::new();
    let mut bind_idx = 1u32;

    if filter.genre.is_some() {
        conditions.push(format!(r"genre ILIKE ${bind_idx} ESCAPE '\'"));
        bind_idx += 1;
    }
    if filter.release_year.is_some() {
        conditions.push(format!("release_year = ${bind_idx}"));
        bind_idx += 1;
    }
    if filter.min_gross.is_some() {
        conditions.push(format!("gross >= ${bind_idx}"));
        bind_idx += 1;
    }
    if filter.min_rating.is_some() {
        conditions.push(format!("rating >= ${bind_idx}"));
        bind_idx += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, bind_idx)
}
