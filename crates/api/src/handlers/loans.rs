//! Handlers for the `/loans` resource: CRUD, CSV import, filtering with
//! aggregates, and per-column statistics and charts.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tabula_core::chart::{self, Series, BLUE};
use tabula_core::csv_import::{parse_loan_csv, LoanCsvRow};
use tabula_core::error::CoreError;
use tabula_core::loan::{
    numeric_column, parse_filters, validate_loan_fields, Aggregate, LoanColumn, RawFilter,
    MAX_CREDIT_SCORE, MAX_LOAN_STATUS_LENGTH,
};
use tabula_core::pagination::{total_pages, Page, PageRequest, DEFAULT_PER_PAGE};
use tabula_core::stats::{compute_advanced_stats, histogram, AdvancedStats};
use tabula_core::types::DbId;
use tabula_core::validation::{require, validate_non_negative, validate_range, validate_text};
use tabula_db::models::loan::{CreateLoan, LoanApproval, UpdateLoan};
use tabula_db::repositories::LoanRepo;

use super::{in_row, read_csv_upload, run_blocking};
use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::{png_response, ImportResponse, MessageResponse};
use crate::state::AppState;

/// Number of equal-width buckets in the column histogram.
const CHART_BINS: usize = 10;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /loans`. Every field is required; they are optional here
/// so a missing one is reported by name.
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub income: Option<f64>,
    pub loan_amount: Option<f64>,
    pub credit_score: Option<f64>,
    pub loan_status: Option<String>,
    pub asset_value: Option<f64>,
}

/// Body of `PUT /loans/{loan_id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLoanRequest {
    pub income: Option<f64>,
    pub loan_amount: Option<f64>,
    pub credit_score: Option<f64>,
    pub loan_status: Option<String>,
    pub asset_value: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LoanCreatedResponse {
    pub message: String,
    pub loan_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct LoanUpdatedResponse {
    pub message: String,
    pub loan: LoanApproval,
}

/// Body of `POST /loans/filter`.
#[derive(Debug, Default, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub filters: Vec<RawFilter>,
    pub aggregate_type: Option<String>,
    pub field: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub aggregate_type: String,
    pub field: String,
    /// A number, a string for `max`/`min` over `loan_status`, or `null`.
    pub result: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct FilteredLoansResponse {
    pub filtered_loans: Vec<LoanApproval>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
    pub per_page: i64,
}

/// `POST /loans/filter` answers with an aggregate when one is requested,
/// otherwise with a page of matching loans.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FilterResponse {
    Aggregate(AggregateResponse),
    Loans(FilteredLoansResponse),
}

/// Body of the per-column endpoints (`/stats`, `/chart`, `/graph`).
#[derive(Debug, Deserialize)]
pub struct ColumnRequest {
    pub column_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Round a credit score to the nearest integer and check its range.
fn round_credit_score(value: f64) -> Result<i32, CoreError> {
    let rounded = value.round();
    validate_range(rounded, 0.0, f64::from(MAX_CREDIT_SCORE), "credit_score")?;
    Ok(rounded as i32)
}

impl CreateLoanRequest {
    fn validate(self) -> Result<CreateLoan, CoreError> {
        let income = require(self.income, "income")?;
        let loan_amount = require(self.loan_amount, "loan_amount")?;
        let credit_score = round_credit_score(require(self.credit_score, "credit_score")?)?;
        let loan_status = require(self.loan_status, "loan_status")?;
        let asset_value = require(self.asset_value, "asset_value")?;
        validate_loan_fields(income, loan_amount, credit_score, asset_value, &loan_status)?;
        Ok(CreateLoan {
            income,
            loan_amount,
            credit_score,
            loan_status: loan_status.trim().to_string(),
            asset_value,
        })
    }
}

impl UpdateLoanRequest {
    fn validate(self) -> Result<UpdateLoan, CoreError> {
        for (value, name) in [
            (self.income, "income"),
            (self.loan_amount, "loan_amount"),
            (self.asset_value, "asset_value"),
        ] {
            if let Some(v) = value {
                validate_non_negative(v, name)?;
            }
        }
        if let Some(status) = &self.loan_status {
            validate_text(status, MAX_LOAN_STATUS_LENGTH, "loan_status")?;
        }
        Ok(UpdateLoan {
            income: self.income,
            loan_amount: self.loan_amount,
            credit_score: self.credit_score.map(round_credit_score).transpose()?,
            loan_status: self.loan_status.map(|s| s.trim().to_string()),
            asset_value: self.asset_value,
        })
    }
}

fn validate_csv_row(row: &LoanCsvRow) -> Result<(), CoreError> {
    validate_loan_fields(
        row.income,
        row.loan_amount,
        row.credit_score,
        row.asset_value,
        &row.loan_status,
    )
    .map_err(|e| in_row(e, "loan_id", row.loan_id))
}

/// Resolve the `column_name` of a per-column request to a numeric column.
fn requested_column(input: &ColumnRequest) -> AppResult<(String, LoanColumn)> {
    let name = input
        .column_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest(
                "Please provide a 'column_name' in the request body".to_string(),
            )
        })?;
    Ok((name.to_string(), numeric_column(name)?))
}

/// Load every value of the requested column, failing when the table is empty.
async fn chart_values(state: &AppState, input: &ColumnRequest) -> AppResult<Vec<f64>> {
    let (name, column) = requested_column(input)?;
    let values = LoanRepo::column_values(&state.pool, column).await?;
    if values.is_empty() {
        return Err(AppError::BadRequest(format!(
            "No data available for column '{name}'"
        )));
    }
    Ok(values)
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "LoanApproval",
        id,
    })
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/loans/upload_csv
///
/// Multipart field `file`. Rows with an empty required cell are dropped;
/// the rest are inserted in one transaction.
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ImportResponse>)> {
    let data = read_csv_upload(&mut multipart).await?;
    let import = parse_loan_csv(&data)?;
    for row in &import.rows {
        validate_csv_row(row)?;
    }

    let inserted = LoanRepo::bulk_insert(&state.pool, &import.rows).await?;
    tracing::info!(inserted, dropped = import.dropped, "Loans imported from CSV");

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            message: format!("{inserted} loans successfully added to the database"),
            inserted,
            dropped: import.dropped,
        }),
    ))
}

/// POST /api/v1/loans
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanCreatedResponse>)> {
    let input = input.validate()?;
    let loan = LoanRepo::create(&state.pool, &input).await?;
    tracing::info!(loan_id = loan.loan_id, "Loan approval created");

    Ok((
        StatusCode::CREATED,
        Json(LoanCreatedResponse {
            message: "Loan approval created".to_string(),
            loan_id: loan.loan_id,
        }),
    ))
}

/// GET /api/v1/loans?page=&per_page=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Page<LoanApproval>>> {
    let page = params.resolve(DEFAULT_PER_PAGE);
    let total = LoanRepo::count(&state.pool).await?;
    let loans = LoanRepo::list(&state.pool, page).await?;
    Ok(Json(Page::new(page, total, loans)))
}

/// GET /api/v1/loans/{loan_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(loan_id): Path<DbId>,
) -> AppResult<Json<LoanApproval>> {
    let loan = LoanRepo::find_by_id(&state.pool, loan_id)
        .await?
        .ok_or_else(|| not_found(loan_id))?;
    Ok(Json(loan))
}

/// PUT /api/v1/loans/{loan_id}
pub async fn update(
    State(state): State<AppState>,
    Path(loan_id): Path<DbId>,
    Json(input): Json<UpdateLoanRequest>,
) -> AppResult<Json<LoanUpdatedResponse>> {
    let input = input.validate()?;
    let loan = LoanRepo::update(&state.pool, loan_id, &input)
        .await?
        .ok_or_else(|| not_found(loan_id))?;
    tracing::info!(loan_id, "Loan approval updated");

    Ok(Json(LoanUpdatedResponse {
        message: "Loan approval updated".to_string(),
        loan,
    }))
}

/// DELETE /api/v1/loans/{loan_id}
pub async fn delete(
    State(state): State<AppState>,
    Path(loan_id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !LoanRepo::delete(&state.pool, loan_id).await? {
        return Err(not_found(loan_id));
    }
    tracing::info!(loan_id, "Loan approval deleted");
    Ok(Json(MessageResponse::new("Loan approval deleted")))
}

// ---------------------------------------------------------------------------
// Filtering and aggregates
// ---------------------------------------------------------------------------

/// POST /api/v1/loans/filter
///
/// Filters are AND-ed. When both `aggregate_type` and `field` are given the
/// aggregate is computed over the filtered rows; otherwise a page of the
/// filtered rows is returned.
pub async fn filter(
    State(state): State<AppState>,
    Json(input): Json<FilterRequest>,
) -> AppResult<Json<FilterResponse>> {
    let filters = parse_filters(&input.filters)?;

    if let (Some(aggregate_type), Some(field)) = (&input.aggregate_type, &input.field) {
        let aggregate = Aggregate::parse(aggregate_type, field)?;
        let result = LoanRepo::aggregate(&state.pool, &filters, aggregate).await?;
        return Ok(Json(FilterResponse::Aggregate(AggregateResponse {
            aggregate_type: aggregate_type.clone(),
            field: field.clone(),
            result,
        })));
    }

    let page = PageRequest::resolve(input.page, input.per_page, DEFAULT_PER_PAGE);
    let total = LoanRepo::count_filtered(&state.pool, &filters).await?;
    let loans = LoanRepo::filter(&state.pool, &filters, page).await?;
    Ok(Json(FilterResponse::Loans(FilteredLoansResponse {
        filtered_loans: loans,
        total,
        pages: total_pages(total, page.per_page),
        current_page: page.page,
        per_page: page.per_page,
    })))
}

// ---------------------------------------------------------------------------
// Column statistics and charts
// ---------------------------------------------------------------------------

/// POST /api/v1/loans/stats
pub async fn stats(
    State(state): State<AppState>,
    Json(input): Json<ColumnRequest>,
) -> AppResult<Json<AdvancedStats>> {
    let (_, column) = requested_column(&input)?;
    let values = LoanRepo::column_values(&state.pool, column).await?;
    Ok(Json(compute_advanced_stats(&values)?))
}

/// POST /api/v1/loans/chart
///
/// PNG histogram of the column with equal-width buckets.
pub async fn chart(
    State(state): State<AppState>,
    Json(input): Json<ColumnRequest>,
) -> AppResult<impl IntoResponse> {
    let values = chart_values(&state, &input).await?;
    let png = run_blocking(move || {
        let bins = histogram(&values, CHART_BINS);
        chart::bar_chart(&bins, BLUE, chart::DEFAULT_WIDTH, chart::DEFAULT_HEIGHT)
    })
    .await?;
    Ok(png_response(png))
}

/// POST /api/v1/loans/graph
///
/// PNG line graph of the column's values in ascending order.
pub async fn graph(
    State(state): State<AppState>,
    Json(input): Json<ColumnRequest>,
) -> AppResult<impl IntoResponse> {
    let mut values = chart_values(&state, &input).await?;
    let png = run_blocking(move || {
        values.sort_by(f64::total_cmp);
        chart::line_chart(
            &[Series::indexed(&values, BLUE)],
            chart::DEFAULT_WIDTH,
            chart::DEFAULT_HEIGHT,
        )
    })
    .await?;
    Ok(png_response(png))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn full_request() -> CreateLoanRequest {
        CreateLoanRequest {
            income: Some(52000.0),
            loan_amount: Some(15000.0),
            credit_score: Some(712.6),
            loan_status: Some(" Approved ".to_string()),
            asset_value: Some(90000.0),
        }
    }

    #[test]
    fn create_request_rounds_score_and_trims_status() {
        let loan = full_request().validate().unwrap();
        assert_eq!(loan.credit_score, 713);
        assert_eq!(loan.loan_status, "Approved");
    }

    #[test]
    fn create_request_names_first_missing_field() {
        let input = CreateLoanRequest {
            loan_amount: None,
            asset_value: None,
            ..full_request()
        };
        let err = input.validate().unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Missing required field: loan_amount");
    }

    #[test]
    fn create_request_rejects_out_of_range_score() {
        let input = CreateLoanRequest {
            credit_score: Some(1000.6),
            ..full_request()
        };
        assert_matches!(input.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn update_request_validates_only_present_fields() {
        let update = UpdateLoanRequest {
            credit_score: Some(650.4),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(update.credit_score, Some(650));
        assert_eq!(update.income, None);

        let bad = UpdateLoanRequest {
            income: Some(-1.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn csv_row_errors_name_the_loan() {
        let row = LoanCsvRow {
            loan_id: 9,
            income: 1.0,
            loan_amount: 1.0,
            credit_score: 2000,
            loan_status: "Approved".to_string(),
            asset_value: 1.0,
        };
        let err = validate_csv_row(&row).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("loan_id 9: credit_score"));
    }
}
