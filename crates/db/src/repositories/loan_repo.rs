//! Repository for the `loan_approval` table.

use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Postgres};
use tabula_core::csv_import::LoanCsvRow;
use tabula_core::loan::{Aggregate, AggregateType, FilterValue, LoanColumn, LoanFilter};
use tabula_core::pagination::PageRequest;
use tabula_core::types::DbId;

use super::{push_value_tuples, INSERT_CHUNK_ROWS};
use crate::models::loan::{CreateLoan, LoanApproval, UpdateLoan};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "loan_id, income, loan_amount, credit_score, loan_status, asset_value, \
                       created_at, updated_at";

/// Columns written by a CSV import (explicit ids).
const IMPORT_COLUMNS: &str = "loan_id, income, loan_amount, credit_score, loan_status, asset_value";

/// Provides CRUD, filtering and aggregation over loan approvals.
pub struct LoanRepo;

impl LoanRepo {
    /// Insert a new loan, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateLoan) -> Result<LoanApproval, sqlx::Error> {
        let query = format!(
            "INSERT INTO loan_approval (income, loan_amount, credit_score, loan_status, asset_value)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoanApproval>(&query)
            .bind(input.income)
            .bind(input.loan_amount)
            .bind(input.credit_score)
            .bind(&input.loan_status)
            .bind(input.asset_value)
            .fetch_one(pool)
            .await
    }

    /// Find a loan by its id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LoanApproval>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loan_approval WHERE loan_id = $1");
        sqlx::query_as::<_, LoanApproval>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of loans ordered by id.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<Vec<LoanApproval>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM loan_approval ORDER BY loan_id LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, LoanApproval>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM loan_approval")
            .fetch_one(pool)
            .await
    }

    /// Update a loan. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLoan,
    ) -> Result<Option<LoanApproval>, sqlx::Error> {
        let query = format!(
            "UPDATE loan_approval SET
                income = COALESCE($2, income),
                loan_amount = COALESCE($3, loan_amount),
                credit_score = COALESCE($4, credit_score),
                loan_status = COALESCE($5, loan_status),
                asset_value = COALESCE($6, asset_value)
             WHERE loan_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoanApproval>(&query)
            .bind(id)
            .bind(input.income)
            .bind(input.loan_amount)
            .bind(input.credit_score)
            .bind(input.loan_status.as_deref())
            .bind(input.asset_value)
            .fetch_optional(pool)
            .await
    }

    /// Delete a loan by id. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM loan_approval WHERE loan_id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert imported rows with their explicit ids in one transaction, then
    /// move the id sequence past the largest id so later creates don't
    /// collide. Returns the number of inserted rows.
    pub async fn bulk_insert(pool: &PgPool, rows: &[LoanCsvRow]) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut query = format!("INSERT INTO loan_approval ({IMPORT_COLUMNS}) VALUES ");
            push_value_tuples(&mut query, chunk.len(), 6);

            let mut q = sqlx::query(&query);
            for row in chunk {
                q = q
                    .bind(row.loan_id)
                    .bind(row.income)
                    .bind(row.loan_amount)
                    .bind(row.credit_score)
                    .bind(&row.loan_status)
                    .bind(row.asset_value);
            }
            inserted += q.execute(&mut *tx).await?.rows_affected();
        }

        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('loan_approval', 'loan_id'), \
                    COALESCE(MAX(loan_id), 1), MAX(loan_id) IS NOT NULL) \
             FROM loan_approval",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(table = "loan_approval", inserted, "Bulk import committed");
        Ok(inserted)
    }

    /// One page of loans matching every filter, ordered by id.
    pub async fn filter(
        pool: &PgPool,
        filters: &[LoanFilter],
        page: PageRequest,
    ) -> Result<Vec<LoanApproval>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_loan_filter(filters);
        let query = format!(
            "SELECT {COLUMNS} FROM loan_approval {where_clause} \
             ORDER BY loan_id \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );
        let q = bind_loan_values(sqlx::query_as::<_, LoanApproval>(&query), &bind_values);
        q.bind(page.limit()).bind(page.offset()).fetch_all(pool).await
    }

    /// Count loans matching every filter (for pagination metadata).
    pub async fn count_filtered(pool: &PgPool, filters: &[LoanFilter]) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_loan_filter(filters);
        let query = format!("SELECT COUNT(*) FROM loan_approval {where_clause}");
        bind_loan_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values)
            .fetch_one(pool)
            .await
    }

    /// Evaluate an aggregate over the rows matching every filter.
    ///
    /// `count` yields an integer; numeric aggregates yield a float or `null`
    /// on an empty set; `max`/`min` over `loan_status` yield a string.
    pub async fn aggregate(
        pool: &PgPool,
        filters: &[LoanFilter],
        aggregate: Aggregate,
    ) -> Result<Value, sqlx::Error> {
        let (where_clause, bind_values, _) = build_loan_filter(filters);
        let column = aggregate.column.name();
        let function = aggregate.kind.sql();

        if aggregate.kind == AggregateType::Count {
            let query = format!("SELECT COUNT({column}) FROM loan_approval {where_clause}");
            let count = bind_loan_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values)
                .fetch_one(pool)
                .await?;
            return Ok(Value::from(count));
        }

        if aggregate.column.is_numeric() {
            let query =
                format!("SELECT {function}({column})::float8 FROM loan_approval {where_clause}");
            let result = bind_loan_values_scalar(
                sqlx::query_scalar::<_, Option<f64>>(&query),
                &bind_values,
            )
            .fetch_one(pool)
            .await?;
            return Ok(result.map_or(Value::Null, Value::from));
        }

        let query = format!("SELECT {function}({column}) FROM loan_approval {where_clause}");
        let result = bind_loan_values_scalar(
            sqlx::query_scalar::<_, Option<String>>(&query),
            &bind_values,
        )
        .fetch_one(pool)
        .await?;
        Ok(result.map_or(Value::Null, Value::from))
    }

    /// Every value of a numeric column, as floats, in id order.
    pub async fn column_values(pool: &PgPool, column: LoanColumn) -> Result<Vec<f64>, sqlx::Error> {
        debug_assert!(column.is_numeric());
        let query = format!(
            "SELECT {}::float8 FROM loan_approval ORDER BY loan_id",
            column.name()
        );
        sqlx::query_scalar::<_, f64>(&query).fetch_all(pool).await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built loan queries.
enum BindValue {
    Float(f64),
    Text(String),
}

/// Build a WHERE clause and bind values from validated filters.
///
/// Column names and operators come from closed enums, so only values are
/// bound. Returns `(where_clause, bind_values, next_bind_index)`.
fn build_loan_filter(filters: &[LoanFilter]) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::with_capacity(filters.len());
    let mut bind_values: Vec<BindValue> = Vec::with_capacity(filters.len());
    let mut bind_idx = 1u32;

    for filter in filters {
        let column = filter.column.name();
        let op = filter.operator.sql();
        match &filter.value {
            FilterValue::Number(n) => {
                conditions.push(format!("{column}::float8 {op} ${bind_idx}"));
                bind_values.push(BindValue::Float(*n));
            }
            FilterValue::Text(s) => {
                conditions.push(format!("{column} {op} ${bind_idx}"));
                bind_values.push(BindValue::Text(s.clone()));
            }
        }
        bind_idx += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_loan_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Float(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_loan_values_scalar<'q, O>(
    mut q: sqlx::query::QueryScalar<'q, Postgres, O, PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, Postgres, O, PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Float(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
        }
    }
    q
}
