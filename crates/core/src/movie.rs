//! Movie field validation and search-pattern helpers.

use crate::error::CoreError;
use crate::validation::{validate_non_negative, validate_range, validate_text};

/// Maximum length of `title` and `director`.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length of `genre`.
pub const MAX_GENRE_LENGTH: usize = 100;

/// Earliest accepted release year.
pub const MIN_RELEASE_YEAR: i32 = 1870;

/// Latest accepted release year.
pub const MAX_RELEASE_YEAR: i32 = 2100;

/// Ratings are on a 0-10 scale.
pub const MAX_RATING: f64 = 10.0;

/// Validate every column of a movie row.
#[allow(clippy::too_many_arguments)]
pub fn validate_movie_fields(
    title: &str,
    director: &str,
    release_year: i32,
    runtime: i32,
    genre: &str,
    rating: f64,
    gross: f64,
) -> Result<(), CoreError> {
    validate_text(title, MAX_NAME_LENGTH, "title")?;
    validate_text(director, MAX_NAME_LENGTH, "director")?;
    validate_text(genre, MAX_GENRE_LENGTH, "genre")?;
    validate_range(
        f64::from(release_year),
        f64::from(MIN_RELEASE_YEAR),
        f64::from(MAX_RELEASE_YEAR),
        "release_year",
    )?;
    if runtime <= 0 {
        return Err(CoreError::Validation(format!(
            "runtime must be a positive number of minutes, got {runtime}"
        )));
    }
    validate_range(rating, 0.0, MAX_RATING, "rating")?;
    validate_non_negative(gross, "gross")
}

/// Build an `ILIKE` substring pattern, escaping `%`, `_` and `\` so they
/// match literally. Use with `ESCAPE '\'`.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Normalize a search query: trimmed, and `None` when blank.
pub fn normalize_query(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_typical_movie() {
        assert!(validate_movie_fields("Heat", "Michael Mann", 1995, 170, "Crime", 8.3, 187.4).is_ok());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(validate_movie_fields("", "D", 2000, 90, "Drama", 5.0, 0.0).is_err());
        assert!(validate_movie_fields("T", "D", 1800, 90, "Drama", 5.0, 0.0).is_err());
        assert!(validate_movie_fields("T", "D", 2000, 0, "Drama", 5.0, 0.0).is_err());
        assert!(validate_movie_fields("T", "D", 2000, 90, "Drama", 10.5, 0.0).is_err());
        assert!(validate_movie_fields("T", "D", 2000, 90, "Drama", 5.0, -1.0).is_err());
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("nolan"), "%nolan%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn normalize_query_drops_blank() {
        assert_eq!(normalize_query(None), None);
        assert_eq!(normalize_query(Some("   ")), None);
        assert_eq!(normalize_query(Some(" heat ")), Some("heat"));
    }
}
