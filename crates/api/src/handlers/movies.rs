//! Handlers for the `/movies` resource: CRUD, CSV import, search and
//! filtered listing.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tabula_core::csv_import::{parse_movie_csv, MovieCsvRow};
use tabula_core::error::CoreError;
use tabula_core::movie::{normalize_query, validate_movie_fields};
use tabula_core::pagination::{Page, PageRequest, DEFAULT_PER_PAGE};
use tabula_core::types::DbId;
use tabula_core::validation::require;
use tabula_db::models::movie::{CreateMovie, Movie, MovieFilter, UpdateMovie};
use tabula_db::repositories::MovieRepo;

use super::{in_row, read_csv_upload};
use crate::error::{AppError, AppResult};
use crate::query::{PaginationParams, SearchParams};
use crate::response::{ImportResponse, MessageResponse};
use crate::state::AppState;

/// Body of `POST /movies`. Every field is required.
#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub runtime: Option<i32>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub gross: Option<f64>,
}

impl CreateMovieRequest {
    fn validate(self) -> Result<CreateMovie, CoreError> {
        let movie = CreateMovie {
            title: require(self.title, "title")?.trim().to_string(),
            director: require(self.director, "director")?.trim().to_string(),
            release_year: require(self.release_year, "release_year")?,
            runtime: require(self.runtime, "runtime")?,
            genre: require(self.genre, "genre")?.trim().to_string(),
            rating: require(self.rating, "rating")?,
            gross: require(self.gross, "gross")?,
        };
        validate_movie_fields(
            &movie.title,
            &movie.director,
            movie.release_year,
            movie.runtime,
            &movie.genre,
            movie.rating,
            movie.gross,
        )?;
        Ok(movie)
    }
}

#[derive(Debug, Serialize)]
pub struct MovieCreatedResponse {
    pub message: String,
    pub id: DbId,
}

#[derive(Debug, Serialize)]
pub struct MovieUpdatedResponse {
    pub message: String,
    pub movie: Movie,
}

/// Query string of `GET /movies/filter`.
#[derive(Debug, Default, Deserialize)]
pub struct MovieFilterParams {
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub min_gross: Option<f64>,
    pub min_rating: Option<f64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl MovieFilterParams {
    fn split(self) -> (MovieFilter, PageRequest) {
        let filter = MovieFilter {
            genre: normalize_query(self.genre.as_deref()).map(str::to_string),
            release_year: self.release_year,
            min_gross: self.min_gross,
            min_rating: self.min_rating,
        };
        let page = PageRequest::resolve(self.page, self.per_page, DEFAULT_PER_PAGE);
        (filter, page)
    }
}

/// Merge a partial update onto the stored row and validate the result, so
/// range checks see the values that will actually be written.
fn validate_update(current: &Movie, input: &UpdateMovie) -> Result<UpdateMovie, CoreError> {
    let trimmed = |v: &Option<String>| v.as_deref().map(|s| s.trim().to_string());
    let update = UpdateMovie {
        title: trimmed(&input.title),
        director: trimmed(&input.director),
        genre: trimmed(&input.genre),
        ..input.clone()
    };
    validate_movie_fields(
        update.title.as_deref().unwrap_or(&current.title),
        update.director.as_deref().unwrap_or(&current.director),
        update.release_year.unwrap_or(current.release_year),
        update.runtime.unwrap_or(current.runtime),
        update.genre.as_deref().unwrap_or(&current.genre),
        update.rating.unwrap_or(current.rating),
        update.gross.unwrap_or(current.gross),
    )?;
    Ok(update)
}

fn validate_csv_row(row: &MovieCsvRow) -> Result<(), CoreError> {
    validate_movie_fields(
        &row.title,
        &row.director,
        row.release_year,
        row.runtime,
        &row.genre,
        row.rating,
        row.gross,
    )
    .map_err(|e| in_row(e, "id", row.id))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Movie", id })
}

/// POST /api/v1/movies/upload_csv
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ImportResponse>)> {
    let data = read_csv_upload(&mut multipart).await?;
    let import = parse_movie_csv(&data)?;
    for row in &import.rows {
        validate_csv_row(row)?;
    }

    let inserted = MovieRepo::bulk_insert(&state.pool, &import.rows).await?;
    tracing::info!(inserted, dropped = import.dropped, "Movies imported from CSV");

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            message: format!("{inserted} movies successfully added to the database"),
            inserted,
            dropped: import.dropped,
        }),
    ))
}

/// POST /api/v1/movies
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateMovieRequest>,
) -> AppResult<(StatusCode, Json<MovieCreatedResponse>)> {
    let input = input.validate()?;
    let movie = MovieRepo::create(&state.pool, &input).await?;
    tracing::info!(movie_id = movie.id, "Movie created");

    Ok((
        StatusCode::CREATED,
        Json(MovieCreatedResponse {
            message: "Movie created".to_string(),
            id: movie.id,
        }),
    ))
}

/// GET /api/v1/movies?page=&per_page=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Page<Movie>>> {
    let page = params.resolve(DEFAULT_PER_PAGE);
    let total = MovieRepo::count(&state.pool).await?;
    let movies = MovieRepo::list(&state.pool, page).await?;
    Ok(Json(Page::new(page, total, movies)))
}

/// GET /api/v1/movies/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Movie>> {
    let movie = MovieRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(movie))
}

/// PUT /api/v1/movies/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMovie>,
) -> AppResult<Json<MovieUpdatedResponse>> {
    let current = MovieRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let input = validate_update(&current, &input)?;

    let movie = MovieRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(movie_id = id, "Movie updated");

    Ok(Json(MovieUpdatedResponse {
        message: "Movie updated".to_string(),
        movie,
    }))
}

/// DELETE /api/v1/movies/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !MovieRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(movie_id = id, "Movie deleted");
    Ok(Json(MessageResponse::new("Movie deleted")))
}

/// GET /api/v1/movies/search?query=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Movie>>> {
    let term = normalize_query(params.query.as_deref())
        .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;
    let movies = MovieRepo::search(&state.pool, term).await?;
    Ok(Json(movies))
}

/// GET /api/v1/movies/filter?genre=&release_year=&min_gross=&min_rating=&page=&per_page=
pub async fn filter(
    State(state): State<AppState>,
    Query(params): Query<MovieFilterParams>,
) -> AppResult<Json<Page<Movie>>> {
    let (filter, page) = params.split();
    let total = MovieRepo::count_filtered(&state.pool, &filter).await?;
    let movies = MovieRepo::filter(&state.pool, &filter, page).await?;
    Ok(Json(Page::new(page, total, movies)))
}
