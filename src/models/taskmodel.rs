use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{paymentmodel::Payment, pointsmodel::PointsTransaction};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Available,
    Assigned,
    Submitted,
    Approved,
    Rejected,
}

impl TaskStatus {
    pub fn to_str(&self) -> &str {
        match self {
            TaskStatus::Available => "available",
            TaskStatus::Assigned => "assigned",
            TaskStatus::Submitted => "submitted",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Approved | TaskStatus::Rejected)
    }

    /// Statuses that occupy a slot of the per-worker quota.
    pub fn counts_toward_quota(&self) -> bool {
        matches!(
            self,
            TaskStatus::Assigned | TaskStatus::Submitted | TaskStatus::Approved
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub job_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub assigned_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub submission_data: Option<String>,
    pub reviewer_notes: Option<String>,
    pub worker_rating: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskFile {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_path: String,
    pub file_type: String,
    pub file_size: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

/// Evidence file reference produced by the upload layer. Content is never
/// interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTaskFile {
    pub file_path: String,
    pub file_type: String,
    pub file_size: Option<i64>,
}

/// A task row waiting to be inserted as `available`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,
    #[sqlx(default)]
    pub job_title: Option<String>,
    #[sqlx(default)]
    pub job_description: Option<String>,
    #[sqlx(default)]
    pub pay_per_task: Option<i64>,
    #[sqlx(default)]
    pub worker_name: Option<String>,
    #[sqlx(default)]
    pub worker_email: Option<String>,
    #[sqlx(default)]
    pub file_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub listing: TaskListing,
    pub files: Vec<TaskFile>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn target_status(&self) -> TaskStatus {
        match self {
            ReviewDecision::Approved => TaskStatus::Approved,
            ReviewDecision::Rejected => TaskStatus::Rejected,
        }
    }
}

/// Validated review input, ready to be applied to a submitted task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReview {
    pub decision: ReviewDecision,
    pub reviewer_notes: Option<String>,
    pub worker_rating: Option<i16>,
}

/// Everything a review wrote in its transaction. Payment and ledger entry
/// are present only for approvals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub task: Task,
    pub payment: Option<Payment>,
    pub points_entry: Option<PointsTransaction>,
}
