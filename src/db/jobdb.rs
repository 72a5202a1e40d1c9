// db/jobdb.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    models::jobmodel::*,
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct NewJob {
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
}

#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pay_per_task: Option<i64>,
    pub n_tasks: Option<i32>,
    pub n_tasks_per_worker_allowed: Option<i32>,
    pub location: Option<String>,
    pub location_restrictions: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<JobStatus>,
    pub image_url: Option<String>,
}

impl JobUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.pay_per_task.is_none()
            && self.n_tasks.is_none()
            && self.n_tasks_per_worker_allowed.is_none()
            && self.location.is_none()
            && self.location_restrictions.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.status.is_none()
            && self.image_url.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientInput {
    pub name: Option<String>,
    pub website: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl ClientInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.website.is_none()
            && self.contact.is_none()
            && self.location.is_none()
            && self.notes.is_none()
    }
}

#[async_trait]
pub trait JobExt {
    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error>;

    async fn list_active_jobs(&self) -> Result<Vec<JobListing>, sqlx::Error>;

    async fn get_job_listing(&self, job_id: Uuid) -> Result<Option<JobListing>, sqlx::Error>;

    async fn create_job(&self, job: NewJob) -> Result<Job, ServiceError>;

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> Result<Job, ServiceError>;

    async fn delete_job(&self, job_id: Uuid) -> Result<(), ServiceError>;

    async fn job_stats(&self, job_id: Uuid) -> Result<JobStats, sqlx::Error>;
}

#[async_trait]
pub trait ClientExt {
    async fn list_clients(&self) -> Result<Vec<ClientWithJobCount>, sqlx::Error>;

    async fn get_client(&self, client_id: Uuid) -> Result<Option<ClientDetail>, sqlx::Error>;

    async fn create_client(&self, name: String, input: ClientInput) -> Result<Client, sqlx::Error>;

    async fn update_client(&self, client_id: Uuid, input: ClientInput) -> Result<Client, ServiceError>;

    async fn delete_client(&self, client_id: Uuid) -> Result<(), ServiceError>;
}

fn ensure_window(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), ServiceError> {
    if end_date < start_date {
        return Err(ServiceError::Validation(
            "End date must not be before start date".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl JobExt for DBClient {
    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_active_jobs(&self) -> Result<Vec<JobListing>, sqlx::Error> {
        sqlx::query_as::<_, JobListing>(
            r#"
            SELECT
                j.*,
                c.name AS client_name,
                (SELECT COUNT(*) FROM tasks WHERE job_id = j.id AND status = 'available') AS available_tasks,
                (SELECT COUNT(*) FROM tasks WHERE job_id = j.id) AS total_tasks
            FROM jobs j
            LEFT JOIN clients c ON j.client_id = c.id
            WHERE j.status = 'active'
            ORDER BY j.created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_job_listing(&self, job_id: Uuid) -> Result<Option<JobListing>, sqlx::Error> {
        sqlx::query_as::<_, JobListing>(
            r#"
            SELECT
                j.*,
                c.name AS client_name,
                c.website AS client_website,
                (SELECT COUNT(*) FROM tasks WHERE job_id = j.id AND status = 'available') AS available_tasks,
                (SELECT COUNT(*) FROM tasks WHERE job_id = j.id AND status = 'assigned') AS assigned_tasks,
                (SELECT COUNT(*) FROM tasks WHERE job_id = j.id AND status = 'submitted') AS submitted_tasks,
                (SELECT COUNT(*) FROM tasks WHERE job_id = j.id AND status = 'approved') AS approved_tasks,
                (SELECT COUNT(*) FROM tasks WHERE job_id = j.id) AS total_tasks
            FROM jobs j
            LEFT JOIN clients c ON j.client_id = c.id
            WHERE j.id = $1
            "#
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_job(&self, job: NewJob) -> Result<Job, ServiceError> {
        ensure_window(job.start_date, job.end_date)?;

        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (
                client_id, title, description, pay_per_task, n_tasks,
                n_tasks_per_worker_allowed, location, location_restrictions,
                start_date, end_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#
        )
        .bind(job.client_id)
        .bind(job.title)
        .bind(job.description)
        .bind(job.pay_per_task)
        .bind(job.n_tasks)
        .bind(job.n_tasks_per_worker_allowed)
        .bind(job.location)
        .bind(job.location_restrictions)
        .bind(job.start_date)
        .bind(job.end_date)
        .bind(job.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> Result<Job, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(ServiceError::job_not_found)?;

        ensure_window(
            update.start_date.unwrap_or(current.start_date),
            update.end_date.unwrap_or(current.end_date),
        )?;

        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                pay_per_task = COALESCE($4, pay_per_task),
                n_tasks = COALESCE($5, n_tasks),
                n_tasks_per_worker_allowed = COALESCE($6, n_tasks_per_worker_allowed),
                location = COALESCE($7, location),
                location_restrictions = COALESCE($8, location_restrictions),
                start_date = COALESCE($9, start_date),
                end_date = COALESCE($10, end_date),
                status = COALESCE($11, status),
                image_url = COALESCE($12, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(job_id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.pay_per_task)
        .bind(update.n_tasks)
        .bind(update.n_tasks_per_worker_allowed)
        .bind(update.location)
        .bind(update.location_restrictions)
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(update.status)
        .bind(update.image_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(job)
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Err(ServiceError::job_not_found());
        }

        // Payments outlive their tasks; a paid-out job stays on record.
        let payments = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM payments p
            JOIN tasks t ON p.task_id = t.id
            WHERE t.job_id = $1
            "#
        )
        .bind(job_id)
        .fetch_one(&mut *tx)
        .await?;

        if payments > 0 {
            return Err(ServiceError::Validation(format!(
                "Cannot delete job with {} recorded payments",
                payments
            )));
        }

        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn job_stats(&self, job_id: Uuid) -> Result<JobStats, sqlx::Error> {
        sqlx::query_as::<_, JobStats>(
            r#"
            SELECT
                COUNT(*) AS total_tasks,
                COUNT(*) FILTER (WHERE status = 'available') AS available,
                COUNT(*) FILTER (WHERE status = 'assigned') AS assigned,
                COUNT(*) FILTER (WHERE status = 'submitted') AS submitted,
                COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
            FROM tasks
            WHERE job_id = $1
            "#
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl ClientExt for DBClient {
    async fn list_clients(&self) -> Result<Vec<ClientWithJobCount>, sqlx::Error> {
        sqlx::query_as::<_, ClientWithJobCount>(
            r#"
            SELECT c.*, COUNT(DISTINCT j.id) AS total_jobs
            FROM clients c
            LEFT JOIN jobs j ON c.id = j.client_id
            GROUP BY c.id
            ORDER BY c.created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_client(&self, client_id: Uuid) -> Result<Option<ClientDetail>, sqlx::Error> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(client) = client else {
            return Ok(None);
        };

        let jobs = sqlx::query_as::<_, ClientJob>(
            r#"
            SELECT id, title, status, start_date, end_date, created_at
            FROM jobs
            WHERE client_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ClientDetail { client, jobs }))
    }

    async fn create_client(&self, name: String, input: ClientInput) -> Result<Client, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, website, contact, location, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(name)
        .bind(input.website)
        .bind(input.contact)
        .bind(input.location)
        .bind(input.notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_client(&self, client_id: Uuid, input: ClientInput) -> Result<Client, ServiceError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = COALESCE($2, name),
                website = COALESCE($3, website),
                contact = COALESCE($4, contact),
                location = COALESCE($5, location),
                notes = COALESCE($6, notes)
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(client_id)
        .bind(input.name)
        .bind(input.website)
        .bind(input.contact)
        .bind(input.location)
        .bind(input.notes)
        .fetch_optional(&self.pool)
        .await?;

        client.ok_or_else(|| ServiceError::NotFound("Client".to_string()))
    }

    async fn delete_client(&self, client_id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let jobs = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE client_id = $1")
            .bind(client_id)
            .fetch_one(&mut *tx)
            .await?;

        if jobs > 0 {
            return Err(ServiceError::Validation(format!(
                "Cannot delete client with {} existing jobs",
                jobs
            )));
        }

        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Client".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_window_must_be_ordered() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert!(ensure_window(start, start).is_ok());
        assert!(matches!(ensure_window(start, end), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_empty_updates() {
        assert!(JobUpdate::default().is_empty());
        assert!(ClientInput::default().is_empty());
        let update = JobUpdate {
            status: Some(JobStatus::Active),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
