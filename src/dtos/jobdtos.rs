use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::jobdb::{ClientInput, JobUpdate, NewJob},
    models::jobmodel::{JobListing, JobStatus},
    service::task_service::ImportReport,
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobDto {
    pub client_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(range(min = 1, message = "Pay per task must be positive"))]
    pub pay_per_task: i64,

    #[validate(range(min = 1, message = "Number of tasks must be positive"))]
    pub n_tasks: i32,

    #[validate(range(min = 1, message = "Tasks per worker must be at least 1"))]
    pub n_tasks_per_worker_allowed: Option<i32>,

    pub location: Option<String>,
    pub location_restrictions: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Option<JobStatus>,
}

impl From<CreateJobDto> for NewJob {
    fn from(dto: CreateJobDto) -> Self {
        NewJob {
            client_id: dto.client_id,
            title: dto.title,
            description: dto.description,
            pay_per_task: dto.pay_per_task,
            n_tasks: dto.n_tasks,
            n_tasks_per_worker_allowed: dto.n_tasks_per_worker_allowed.unwrap_or(1),
            location: dto.location,
            location_restrictions: dto.location_restrictions,
            start_date: dto.start_date,
            end_date: dto.end_date,
            status: dto.status.unwrap_or(JobStatus::Draft),
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateJobDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Pay per task must be positive"))]
    pub pay_per_task: Option<i64>,
    #[validate(range(min = 1, message = "Number of tasks must be positive"))]
    pub n_tasks: Option<i32>,
    #[validate(range(min = 1, message = "Tasks per worker must be at least 1"))]
    pub n_tasks_per_worker_allowed: Option<i32>,
    pub location: Option<String>,
    pub location_restrictions: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<JobStatus>,
    pub image_url: Option<String>,
}

impl From<UpdateJobDto> for JobUpdate {
    fn from(dto: UpdateJobDto) -> Self {
        JobUpdate {
            title: dto.title,
            description: dto.description,
            pay_per_task: dto.pay_per_task,
            n_tasks: dto.n_tasks,
            n_tasks_per_worker_allowed: dto.n_tasks_per_worker_allowed,
            location: dto.location,
            location_restrictions: dto.location_restrictions,
            start_date: dto.start_date,
            end_date: dto.end_date,
            status: dto.status,
            image_url: dto.image_url,
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ClientDto {
    #[validate(length(min = 1, max = 255, message = "Client name is required"))]
    pub name: Option<String>,
    pub website: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl From<ClientDto> for ClientInput {
    fn from(dto: ClientDto) -> Self {
        ClientInput {
            name: dto.name,
            website: dto.website,
            contact: dto.contact,
            location: dto.location,
            notes: dto.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobListing>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub created_count: usize,
    pub error_count: usize,
    #[serde(flatten)]
    pub report: ImportReport,
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        ImportResponse {
            created_count: report.created.len(),
            error_count: report.errors.len(),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_defaults() {
        let dto: CreateJobDto = serde_json::from_value(serde_json::json!({
            "title": "Pharmacy audit",
            "description": "Check price tags",
            "pay_per_task": 25,
            "n_tasks": 40,
            "start_date": "2025-01-01",
            "end_date": "2025-01-31"
        }))
        .unwrap();
        assert!(dto.validate().is_ok());

        let job = NewJob::from(dto);
        assert_eq!(job.n_tasks_per_worker_allowed, 1);
        assert_eq!(job.status, JobStatus::Draft);
    }

    #[test]
    fn test_job_pay_must_be_positive() {
        let dto: CreateJobDto = serde_json::from_value(serde_json::json!({
            "title": "Pharmacy audit",
            "description": "Check price tags",
            "pay_per_task": 0,
            "n_tasks": 40,
            "start_date": "2025-01-01",
            "end_date": "2025-01-31"
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }
}
