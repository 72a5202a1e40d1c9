use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::{error::HttpError, models::taskmodel::TaskStatus};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task {id} is {actual}, expected {expected}")]
    InvalidState {
        id: Uuid,
        expected: TaskStatus,
        actual: TaskStatus,
    },

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Task {0} is not available")]
    Conflict(Uuid),

    #[error("Task limit reached for this job: {held} of {allowed} allowed")]
    QuotaExceeded { held: i64, allowed: i64 },

    #[error("Minimum balance of {minimum} points required for reimbursement, current balance is {balance}")]
    BelowMinimum { balance: i64, minimum: i64 },

    #[error("Please add your Paytm account details to your profile before requesting reimbursement")]
    MissingPayoutInfo,

    #[error("No valid tasks found in upload ({} rows rejected)", errors.len())]
    NoValidRows { errors: Vec<String> },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn task_not_found() -> Self {
        ServiceError::NotFound("Task".to_string())
    }

    pub fn job_not_found() -> Self {
        ServiceError::NotFound("Job".to_string())
    }

    pub fn user_not_found() -> Self {
        ServiceError::NotFound("User".to_string())
    }

    /// Machine-readable reason attached to policy refusals.
    pub fn reason(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::InvalidState { .. } | ServiceError::InvalidOperation(_) => "invalid_state",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::QuotaExceeded { .. } => "quota_exceeded",
            ServiceError::BelowMinimum { .. } => "below_minimum",
            ServiceError::MissingPayoutInfo => "missing_payout_info",
            ServiceError::NoValidRows { .. } => "no_valid_rows",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::Database(_) => "storage",
        }
    }

    pub fn details(&self) -> serde_json::Value {
        match self {
            ServiceError::QuotaExceeded { held, allowed } => json!({
                "reason": self.reason(),
                "current_count": held,
                "limit": allowed,
            }),
            ServiceError::BelowMinimum { balance, minimum } => json!({
                "reason": self.reason(),
                "current_balance": balance,
                "minimum": minimum,
            }),
            ServiceError::NoValidRows { errors } => json!({
                "reason": self.reason(),
                "errors": errors,
            }),
            _ => json!({ "reason": self.reason() }),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::NoValidRows { .. } => StatusCode::BAD_REQUEST,

            ServiceError::InvalidState { .. }
            | ServiceError::InvalidOperation(_)
            | ServiceError::Conflict(_) => StatusCode::CONFLICT,

            ServiceError::QuotaExceeded { .. }
            | ServiceError::BelowMinimum { .. }
            | ServiceError::MissingPayoutInfo => StatusCode::UNPROCESSABLE_ENTITY,

            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Database(e) => HttpError::from(e),
            error => {
                let details = error.details();
                HttpError::new(error.to_string(), error.status_code()).with_details(details)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_refusals_map_to_unprocessable() {
        let quota = ServiceError::QuotaExceeded { held: 2, allowed: 2 };
        assert_eq!(quota.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(quota.reason(), "quota_exceeded");

        let below = ServiceError::BelowMinimum { balance: 4, minimum: 10 };
        assert!(below.to_string().contains("current balance is 4"));

        let http: HttpError = below.into();
        let details = http.details.unwrap();
        assert_eq!(details["reason"], "below_minimum");
        assert_eq!(details["current_balance"], 4);
    }

    #[test]
    fn test_storage_errors_are_generic_to_callers() {
        let http: HttpError = ServiceError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!http.message.contains("RowNotFound"));
    }

    #[test]
    fn test_invalid_state_message_names_both_states() {
        let err = ServiceError::InvalidState {
            id: Uuid::nil(),
            expected: TaskStatus::Submitted,
            actual: TaskStatus::Approved,
        };
        let message = err.to_string();
        assert!(message.contains("approved"));
        assert!(message.contains("submitted"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
