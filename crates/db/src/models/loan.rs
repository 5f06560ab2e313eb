//! Loan approval entity and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tabula_core::types::{DbId, Timestamp};

/// A row from the `loan_approval` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoanApproval {
    pub loan_id: DbId,
    pub income: f64,
    pub loan_amount: f64,
    pub credit_score: i32,
    pub loan_status: String,
    pub asset_value: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a loan; the id is assigned by the sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoan {
    pub income: f64,
    pub loan_amount: f64,
    pub credit_score: i32,
    pub loan_status: String,
    pub asset_value: f64,
}

/// DTO for a partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLoan {
    pub income: Option<f64>,
    pub loan_amount: Option<f64>,
    pub credit_score: Option<i32>,
    pub loan_status: Option<String>,
    pub asset_value: Option<f64>,
}
