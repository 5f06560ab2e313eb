//! Integration tests for the movie repository.

use sqlx::PgPool;
use tabula_core::csv_import::MovieCsvRow;
use tabula_core::pagination::PageRequest;
use tabula_db::models::movie::{CreateMovie, MovieFilter, UpdateMovie};
use tabula_db::repositories::MovieRepo;

fn new_movie(title: &str, director: &str, year: i32, genre: &str, rating: f64, gross: f64) -> CreateMovie {
    CreateMovie {
        title: title.to_string(),
        director: director.to_string(),
        release_year: year,
        runtime: 120,
        genre: genre.to_string(),
        rating,
        gross,
    }
}

async fn seed(pool: &PgPool) {
    let movies = [
        new_movie("Heat", "Michael Mann", 1995, "Crime", 8.3, 187.4),
        new_movie("Collateral", "Michael Mann", 2004, "Crime Thriller", 7.5, 220.9),
        new_movie("Alien", "Ridley Scott", 1979, "Sci-Fi", 8.5, 104.9),
        new_movie("100% Wolf", "Alexs Stadermann", 2020, "Animation", 5.1, 3.2),
    ];
    for movie in &movies {
        MovieRepo::create(pool, movie).await.unwrap();
    }
}

fn first_page() -> PageRequest {
    PageRequest::resolve(None, None, 20)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_crud_round_trip(pool: PgPool) {
    let movie = MovieRepo::create(&pool, &new_movie("Heat", "Michael Mann", 1995, "Crime", 8.3, 187.4))
        .await
        .unwrap();

    let patch = UpdateMovie {
        rating: Some(8.4),
        ..Default::default()
    };
    let updated = MovieRepo::update(&pool, movie.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.rating, 8.4);
    assert_eq!(updated.title, "Heat");

    assert!(MovieRepo::delete(&pool, movie.id).await.unwrap());
    assert!(MovieRepo::find_by_id(&pool, movie.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_matches_title_or_director(pool: PgPool) {
    seed(&pool).await;

    let by_director = MovieRepo::search(&pool, "michael").await.unwrap();
    let titles: Vec<&str> = by_director.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Heat", "Collateral"]);

    let by_title = MovieRepo::search(&pool, "ALIEN").await.unwrap();
    assert_eq!(by_title.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_treats_wildcards_literally(pool: PgPool) {
    seed(&pool).await;
    let hits = MovieRepo::search(&pool, "0%").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "100% Wolf");

    assert!(MovieRepo::search(&pool, "_eat").await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_filter_combines_conditions(pool: PgPool) {
    seed(&pool).await;

    let crime = MovieFilter {
        genre: Some("crime".into()),
        ..Default::default()
    };
    assert_eq!(MovieRepo::count_filtered(&pool, &crime).await.unwrap(), 2);

    let crime_rated = MovieFilter {
        genre: Some("crime".into()),
        min_rating: Some(8.3),
        ..Default::default()
    };
    let rows = MovieRepo::filter(&pool, &crime_rated, first_page()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Heat");

    let by_year = MovieFilter {
        release_year: Some(1979),
        min_gross: Some(104.9),
        ..Default::default()
    };
    assert_eq!(MovieRepo::count_filtered(&pool, &by_year).await.unwrap(), 1);

    let everything = MovieRepo::filter(&pool, &MovieFilter::default(), first_page())
        .await
        .unwrap();
    assert_eq!(everything.len(), 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_insert_advances_sequence(pool: PgPool) {
    let rows = vec![MovieCsvRow {
        id: 7,
        title: "Heat".into(),
        director: "Michael Mann".into(),
        release_year: 1995,
        runtime: 170,
        genre: "Crime".into(),
        rating: 8.3,
        gross: 187.4,
    }];
    assert_eq!(MovieRepo::bulk_insert(&pool, &rows).await.unwrap(), 1);

    let next = MovieRepo::create(&pool, &new_movie("Thief", "Michael Mann", 1981, "Crime", 7.4, 11.5))
        .await
        .unwrap();
    assert_eq!(next.id, 8);
    assert_eq!(MovieRepo::count(&pool).await.unwrap(), 2);
}
