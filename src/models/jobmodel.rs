use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientWithJobCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub client: Client,
    pub total_jobs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientJob {
    pub id: Uuid,
    pub title: String,
    pub status: JobStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub jobs: Vec<ClientJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub pay_per_task: i64,
    pub n_tasks: i32,
    pub n_tasks_per_worker_allowed: i32,
    pub location: Option<String>,
    pub location_restrictions: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: JobStatus,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Only active jobs whose window contains `today` hand out tasks.
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.status == JobStatus::Active && self.start_date <= today && today <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    #[sqlx(default)]
    pub client_name: Option<String>,
    #[sqlx(default)]
    pub client_website: Option<String>,
    #[sqlx(default)]
    pub available_tasks: Option<i64>,
    #[sqlx(default)]
    pub assigned_tasks: Option<i64>,
    #[sqlx(default)]
    pub submitted_tasks: Option<i64>,
    #[sqlx(default)]
    pub approved_tasks: Option<i64>,
    #[sqlx(default)]
    pub total_tasks: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobStats {
    pub total_tasks: i64,
    pub available: i64,
    pub assigned: i64,
    pub submitted: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus) -> Job {
        Job {
            id: Uuid::new_v4(),
            client_id: None,
            title: "Storefront survey".to_string(),
            description: "Photograph storefronts".to_string(),
            pay_per_task: 25,
            n_tasks: 10,
            n_tasks_per_worker_allowed: 2,
            location: None,
            location_restrictions: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            status,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_job_open_window_is_inclusive() {
        let job = job(JobStatus::Active);
        assert!(job.is_open_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert!(job.is_open_on(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(!job.is_open_on(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }

    #[test]
    fn test_draft_job_is_never_open() {
        let job = job(JobStatus::Draft);
        assert!(!job.is_open_on(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
    }
}
