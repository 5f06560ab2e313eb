//! Loan approval columns, filter/aggregate query model and field validation.
//!
//! The `/loans/filter` endpoint accepts free-form column, operator and
//! aggregate names. Everything here maps those strings onto a closed set of
//! enums so the repository only ever interpolates known identifiers into SQL.

use serde::Deserialize;

use crate::error::CoreError;
use crate::validation::{validate_non_negative, validate_range, validate_text};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of the `loan_status` column.
pub const MAX_LOAN_STATUS_LENGTH: usize = 20;

/// Inclusive upper bound accepted for a credit score.
pub const MAX_CREDIT_SCORE: i32 = 1000;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// A column of the `loan_approval` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanColumn {
    LoanId,
    Income,
    LoanAmount,
    CreditScore,
    LoanStatus,
    AssetValue,
}

impl LoanColumn {
    pub const ALL: [LoanColumn; 6] = [
        Self::LoanId,
        Self::Income,
        Self::LoanAmount,
        Self::CreditScore,
        Self::LoanStatus,
        Self::AssetValue,
    ];

    /// Columns that may appear in a filter condition.
    pub const FILTERABLE: [LoanColumn; 5] = [
        Self::Income,
        Self::LoanAmount,
        Self::CreditScore,
        Self::LoanStatus,
        Self::AssetValue,
    ];

    /// Parse a column from its SQL name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// SQL column name.
    pub fn name(self) -> &'static str {
        match self {
            Self::LoanId => "loan_id",
            Self::Income => "income",
            Self::LoanAmount => "loan_amount",
            Self::CreditScore => "credit_score",
            Self::LoanStatus => "loan_status",
            Self::AssetValue => "asset_value",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::LoanStatus)
    }

    pub fn is_filterable(self) -> bool {
        Self::FILTERABLE.contains(&self)
    }
}

/// Resolve a numeric column for statistics and charts.
///
/// Unknown and non-numeric columns are both reported as missing from the
/// table, matching what a caller sees when asking for `loan_status` stats.
pub fn numeric_column(name: &str) -> Result<LoanColumn, CoreError> {
    match LoanColumn::from_name(name) {
        Some(column) if column.is_numeric() => Ok(column),
        _ => Err(CoreError::Validation(format!(
            "Column '{name}' does not exist in the LoanApproval table"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Comparison operator of a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    GreaterThan,
    LessThan,
}

impl FilterOperator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "equals" => Some(Self::Equals),
            "greater_than" => Some(Self::GreaterThan),
            "less_than" => Some(Self::LessThan),
            _ => None,
        }
    }

    /// SQL comparison token.
    pub fn sql(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
        }
    }
}

/// The right-hand side of a filter, typed to match its column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

/// A filter condition as it arrives in the request body.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFilter {
    pub column: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
    pub operator: Option<String>,
}

/// A validated filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanFilter {
    pub column: LoanColumn,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl LoanFilter {
    /// Validate a raw condition. The operator defaults to `equals`.
    pub fn parse(raw: &RawFilter) -> Result<Self, CoreError> {
        let name = raw.column.as_deref().unwrap_or_default();
        let column = LoanColumn::from_name(name)
            .filter(|c| c.is_filterable())
            .ok_or_else(|| CoreError::Validation(format!("Unsupported column: {name}")))?;

        let op_name = raw.operator.as_deref().unwrap_or("equals");
        let operator = FilterOperator::from_name(op_name)
            .ok_or_else(|| CoreError::Validation(format!("Unsupported operator: {op_name}")))?;

        let value = filter_value(column, &raw.value)?;
        Ok(Self {
            column,
            operator,
            value,
        })
    }
}

/// Validate every condition, failing on the first bad one.
pub fn parse_filters(raw: &[RawFilter]) -> Result<Vec<LoanFilter>, CoreError> {
    raw.iter().map(LoanFilter::parse).collect()
}

fn filter_value(column: LoanColumn, value: &serde_json::Value) -> Result<FilterValue, CoreError> {
    use serde_json::Value;

    if !column.is_numeric() {
        return match value {
            Value::String(s) => Ok(FilterValue::Text(s.clone())),
            _ => Err(CoreError::Validation(format!(
                "Filter value for '{}' must be a string",
                column.name()
            ))),
        };
    }

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(FilterValue::Number(n)),
        _ => Err(CoreError::Validation(format!(
            "Filter value for '{}' must be numeric",
            column.name()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// SQL aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateType {
    Sum,
    Avg,
    Count,
    Max,
    Min,
}

impl AggregateType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "count" => Some(Self::Count),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Count => "COUNT",
            Self::Max => "MAX",
            Self::Min => "MIN",
        }
    }

    /// Whether the aggregate only makes sense over numbers.
    pub fn requires_numeric(self) -> bool {
        matches!(self, Self::Sum | Self::Avg)
    }
}

/// A validated aggregate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub kind: AggregateType,
    pub column: LoanColumn,
}

impl Aggregate {
    pub fn parse(aggregate_type: &str, field: &str) -> Result<Self, CoreError> {
        let kind = AggregateType::from_name(aggregate_type).ok_or_else(|| {
            CoreError::Validation(format!("Unsupported aggregate type: {aggregate_type}"))
        })?;
        let column = LoanColumn::from_name(field)
            .ok_or_else(|| CoreError::Validation(format!("Unsupported field: {field}")))?;
        if kind.requires_numeric() && !column.is_numeric() {
            return Err(CoreError::Validation(format!(
                "Aggregate '{aggregate_type}' requires a numeric field, got '{field}'"
            )));
        }
        Ok(Self { kind, column })
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

/// Validate the value columns of a loan row.
pub fn validate_loan_fields(
    income: f64,
    loan_amount: f64,
    credit_score: i32,
    asset_value: f64,
    loan_status: &str,
) -> Result<(), CoreError> {
    validate_non_negative(income, "income")?;
    validate_non_negative(loan_amount, "loan_amount")?;
    validate_non_negative(asset_value, "asset_value")?;
    validate_range(
        f64::from(credit_score),
        0.0,
        f64::from(MAX_CREDIT_SCORE),
        "credit_score",
    )?;
    validate_text(loan_status, MAX_LOAN_STATUS_LENGTH, "loan_status")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn raw(column: &str, value: serde_json::Value, operator: Option<&str>) -> RawFilter {
        RawFilter {
            column: Some(column.to_string()),
            value,
            operator: operator.map(str::to_string),
        }
    }

    #[test]
    fn column_names_round_trip() {
        for column in LoanColumn::ALL {
            assert_eq!(LoanColumn::from_name(column.name()), Some(column));
        }
        assert_eq!(LoanColumn::from_name("Income"), None);
    }

    #[test]
    fn filter_defaults_to_equals() {
        let f = LoanFilter::parse(&raw("loan_status", json!("Approved"), None)).unwrap();
        assert_eq!(f.operator, FilterOperator::Equals);
        assert_eq!(f.value, FilterValue::Text("Approved".into()));
    }

    #[test]
    fn filter_accepts_numeric_strings() {
        let f = LoanFilter::parse(&raw("credit_score", json!(" 700 "), Some("greater_than")))
            .unwrap();
        assert_eq!(f.column, LoanColumn::CreditScore);
        assert_eq!(f.value, FilterValue::Number(700.0));
        assert_eq!(f.operator.sql(), ">");
    }

    #[test]
    fn filter_rejects_unknown_column() {
        let err = LoanFilter::parse(&raw("ssn", json!(1), None)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Unsupported column: ssn");
    }

    #[test]
    fn filter_rejects_loan_id_column() {
        assert!(LoanFilter::parse(&raw("loan_id", json!(1), None)).is_err());
    }

    #[test]
    fn filter_rejects_unknown_operator() {
        let err = LoanFilter::parse(&raw("income", json!(1), Some("like"))).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Unsupported operator: like");
    }

    #[test]
    fn filter_rejects_mistyped_values() {
        assert!(LoanFilter::parse(&raw("income", json!("lots"), None)).is_err());
        assert!(LoanFilter::parse(&raw("income", json!(null), None)).is_err());
        assert!(LoanFilter::parse(&raw("loan_status", json!(1), None)).is_err());
    }

    #[test]
    fn parse_filters_stops_at_first_error() {
        let filters = vec![
            raw("income", json!(10), None),
            raw("bogus", json!(10), None),
        ];
        assert!(parse_filters(&filters).is_err());
        assert_eq!(parse_filters(&filters[..1]).unwrap().len(), 1);
    }

    #[test]
    fn aggregate_parses_known_names() {
        let agg = Aggregate::parse("avg", "income").unwrap();
        assert_eq!(agg.kind, AggregateType::Avg);
        assert_eq!(agg.kind.sql(), "AVG");
        assert_eq!(agg.column, LoanColumn::Income);
        assert!(Aggregate::parse("count", "loan_status").is_ok());
        assert!(Aggregate::parse("max", "loan_id").is_ok());
    }

    #[test]
    fn aggregate_rejects_bad_combinations() {
        assert!(Aggregate::parse("median", "income").is_err());
        assert!(Aggregate::parse("sum", "nope").is_err());
        assert!(Aggregate::parse("sum", "loan_status").is_err());
    }

    #[test]
    fn numeric_column_rejects_text_and_unknown() {
        assert_eq!(numeric_column("asset_value").unwrap(), LoanColumn::AssetValue);
        assert!(numeric_column("loan_status").is_err());
        assert!(numeric_column("missing").is_err());
    }

    #[test]
    fn loan_fields_are_range_checked() {
        assert!(validate_loan_fields(5000.0, 100.0, 700, 0.0, "Approved").is_ok());
        assert!(validate_loan_fields(-1.0, 100.0, 700, 0.0, "Approved").is_err());
        assert!(validate_loan_fields(1.0, 100.0, 1001, 0.0, "Approved").is_err());
        assert!(validate_loan_fields(1.0, 100.0, 700, 0.0, "").is_err());
    }
}
