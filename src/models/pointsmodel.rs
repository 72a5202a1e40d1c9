use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "points_transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PointsTransactionType {
    Earned,
    Reimbursed,
    Adjusted,
}

/// One immutable ledger row. `balance_after` is the running sum of `points`
/// for the user up to and including this row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct PointsTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Option<Uuid>,
    pub points: i64,
    pub transaction_type: PointsTransactionType,
    pub balance_after: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointsTransactionListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub transaction: PointsTransaction,
    #[sqlx(default)]
    pub job_title: Option<String>,
    #[sqlx(default)]
    pub user_name: Option<String>,
    #[sqlx(default)]
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reimbursement {
    pub amount_reimbursed: i64,
    pub new_balance: i64,
    pub paytm_account: String,
    pub transaction: PointsTransaction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Adjustment {
    pub previous_balance: i64,
    pub adjustment: i64,
    pub new_balance: i64,
    pub transaction: PointsTransaction,
}

/// Result of replaying one user's ledger from its first entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerAudit {
    pub user_id: Uuid,
    pub entry_count: usize,
    pub balance: i64,
    pub consistent: bool,
}
