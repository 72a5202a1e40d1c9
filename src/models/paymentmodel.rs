use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub task_id: Uuid,
    pub amount: i64,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    #[sqlx(default)]
    pub worker_name: Option<String>,
    #[sqlx(default)]
    pub worker_email: Option<String>,
    pub task_title: String,
    pub job_title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentStats {
    pub total_payments: i64,
    pub total_amount: i64,
    pub pending_amount: i64,
    pub paid_amount: i64,
    pub pending_count: i64,
    pub paid_count: i64,
}
