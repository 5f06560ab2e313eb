//! CSV ingestion for the loan and movie bulk-upload endpoints.
//!
//! Rules shared by both tables:
//! - header names and cells are trimmed
//! - every required column must be present (extra columns are ignored)
//! - a row with any required cell missing is dropped, not rejected
//! - a present cell that fails to parse rejects the whole file

use std::collections::HashMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::stats::round1;

/// Required header for loan uploads.
pub const LOAN_CSV_COLUMNS: &[&str] = &[
    "loan_id",
    "income",
    "loan_amount",
    "credit_score",
    "loan_status",
    "asset_value",
];

/// Required header for movie uploads.
pub const MOVIE_CSV_COLUMNS: &[&str] = &[
    "id",
    "title",
    "director",
    "release_year",
    "runtime",
    "genre",
    "rating",
    "gross",
];

/// Cell spellings treated as missing.
const MISSING_MARKERS: &[&str] = &["na", "n/a", "nan", "null", "none"];

/// Result of parsing an upload: the usable rows plus how many were dropped.
#[derive(Debug, Clone, Serialize)]
pub struct CsvImport<T> {
    pub rows: Vec<T>,
    pub dropped: usize,
}

/// A loan row parsed from CSV, numeric columns already rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanCsvRow {
    pub loan_id: i64,
    pub income: f64,
    pub loan_amount: f64,
    pub credit_score: i32,
    pub loan_status: String,
    pub asset_value: f64,
}

/// A movie row parsed from CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieCsvRow {
    pub id: i64,
    pub title: String,
    pub director: String,
    pub release_year: i32,
    pub runtime: i32,
    pub genre: String,
    pub rating: f64,
    pub gross: f64,
}

/// Required cells of one CSV record, looked up by column name.
struct Record<'a> {
    line: u64,
    cells: HashMap<&'static str, &'a str>,
}

impl Record<'_> {
    fn text(&self, column: &'static str) -> String {
        self.cells.get(column).copied().unwrap_or_default().to_string()
    }

    fn float(&self, column: &'static str) -> Result<f64, CoreError> {
        let raw = self.cells.get(column).copied().unwrap_or_default();
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(column, raw))
    }

    /// Integer column; accepts `"12"` and `"12.0"` but not `"12.5"`.
    fn int(&self, column: &'static str) -> Result<i64, CoreError> {
        let raw = self.cells.get(column).copied().unwrap_or_default();
        if let Ok(v) = raw.parse::<i64>() {
            return Ok(v);
        }
        match raw.parse::<f64>() {
            // `i64::MAX as f64` rounds up to 2^63, hence the half-open range.
            Ok(v) if v.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&v) => {
                Ok(v as i64)
            }
            _ => Err(self.invalid(column, raw)),
        }
    }

    fn int32(&self, column: &'static str) -> Result<i32, CoreError> {
        let raw = self.cells.get(column).copied().unwrap_or_default();
        i32::try_from(self.int(column)?).map_err(|_| self.invalid(column, raw))
    }

    fn invalid(&self, column: &str, raw: &str) -> CoreError {
        CoreError::Validation(format!(
            "Line {}: column '{column}' must be numeric, got '{raw}'",
            self.line
        ))
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_MARKERS.iter().any(|m| cell.eq_ignore_ascii_case(m))
}

/// Walk the CSV, yielding every record whose required cells are all present.
fn read_records<T>(
    data: &[u8],
    required: &[&'static str],
    mut build: impl FnMut(&Record<'_>) -> Result<T, CoreError>,
) -> Result<CsvImport<T>, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("Unreadable CSV header: {e}")))?
        .clone();

    let mut positions = Vec::with_capacity(required.len());
    for column in required {
        let idx = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == *column)
            .ok_or_else(|| CoreError::Validation(format!("Missing required column: {column}")))?;
        positions.push((*column, idx));
    }

    let mut rows = Vec::new();
    let mut dropped = 0;
    for result in reader.records() {
        let record =
            result.map_err(|e| CoreError::Validation(format!("Malformed CSV row: {e}")))?;
        let line = record.position().map_or(0, |p| p.line());

        let mut cells = HashMap::with_capacity(positions.len());
        let mut complete = true;
        for (column, idx) in &positions {
            match record.get(*idx) {
                Some(cell) if !is_missing(cell) => {
                    cells.insert(*column, cell);
                }
                _ => {
                    complete = false;
                    break;
                }
            }
        }
        if !complete {
            dropped += 1;
            continue;
        }
        rows.push(build(&Record { line, cells })?);
    }

    Ok(CsvImport { rows, dropped })
}

/// Parse a loan upload. Monetary columns are rounded to one decimal and the
/// credit score to the nearest integer.
pub fn parse_loan_csv(data: &[u8]) -> Result<CsvImport<LoanCsvRow>, CoreError> {
    read_records(data, LOAN_CSV_COLUMNS, |r| {
        let credit_score = r.float("credit_score")?.round();
        if credit_score < f64::from(i32::MIN) || credit_score > f64::from(i32::MAX) {
            return Err(r.invalid("credit_score", &credit_score.to_string()));
        }
        Ok(LoanCsvRow {
            loan_id: r.int("loan_id")?,
            income: round1(r.float("income")?),
            loan_amount: round1(r.float("loan_amount")?),
            credit_score: credit_score as i32,
            loan_status: r.text("loan_status"),
            asset_value: round1(r.float("asset_value")?),
        })
    })
}

/// Parse a movie upload.
pub fn parse_movie_csv(data: &[u8]) -> Result<CsvImport<MovieCsvRow>, CoreError> {
    read_records(data, MOVIE_CSV_COLUMNS, |r| {
        Ok(MovieCsvRow {
            id: r.int("id")?,
            title: r.text("title"),
            director: r.text("director"),
            release_year: r.int32("release_year")?,
            runtime: r.int32("runtime")?,
            genre: r.text("genre"),
            rating: r.float("rating")?,
            gross: r.float("gross")?,
        })
    })
}
