use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    models::taskmodel::{ReviewDecision, Task, TaskDraft, TaskFile},
    service::task_service::ReviewRequest,
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskDto {
    pub job_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(custom = "validate_latitude")]
    pub latitude: Option<f64>,

    #[validate(custom = "validate_longitude")]
    pub longitude: Option<f64>,

    pub location_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

fn validate_latitude(value: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&value) {
        return Ok(());
    }
    let mut error = ValidationError::new("latitude");
    error.message = Some("Latitude must be between -90 and 90".into());
    Err(error)
}

fn validate_longitude(value: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&value) {
        return Ok(());
    }
    let mut error = ValidationError::new("longitude");
    error.message = Some("Longitude must be between -180 and 180".into());
    Err(error)
}

impl CreateTaskDto {
    pub fn into_draft(self) -> (Uuid, TaskDraft) {
        (
            self.job_id,
            TaskDraft {
                title: self.title,
                description: self.description.unwrap_or_default(),
                latitude: self.latitude,
                longitude: self.longitude,
                location_name: self.location_name,
                start_time: self.start_time,
                end_time: self.end_time,
            },
        )
    }
}

/// Ratings arrive as plain integers so an out-of-range value reaches the
/// rating check instead of failing deserialization.
#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTaskDto {
    pub status: ReviewDecision,
    #[validate(length(max = 2000, message = "Reviewer notes are too long"))]
    pub reviewer_notes: Option<String>,
    pub worker_rating: Option<i64>,
}

impl From<ReviewTaskDto> for ReviewRequest {
    fn from(dto: ReviewTaskDto) -> Self {
        ReviewRequest {
            decision: dto.status,
            reviewer_notes: dto.reviewer_notes,
            worker_rating: dto.worker_rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub task: Task,
    pub files: Vec<TaskFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_dto_keeps_raw_rating() {
        let dto: ReviewTaskDto = serde_json::from_value(serde_json::json!({
            "status": "approved",
            "worker_rating": 9
        }))
        .unwrap();
        let request = ReviewRequest::from(dto);
        assert_eq!(request.decision, ReviewDecision::Approved);
        assert_eq!(request.worker_rating, Some(9));
    }

    #[test]
    fn test_task_coordinates_are_bounded() {
        let dto: CreateTaskDto = serde_json::from_value(serde_json::json!({
            "job_id": Uuid::new_v4(),
            "title": "Kiosk",
            "latitude": 95.0,
            "longitude": 77.0
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_review_dto_rejects_unknown_decision() {
        let result: Result<ReviewTaskDto, _> = serde_json::from_value(serde_json::json!({
            "status": "maybe"
        }));
        assert!(result.is_err());
    }
}
