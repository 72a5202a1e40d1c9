// db/taskdb.rs
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{db::DBClient, pointsdb};
use crate::{
    models::{
        jobmodel::Job,
        paymentmodel::Payment,
        pointsmodel::PointsTransactionType,
        taskmodel::*,
        usermodel::RatingSummary,
    },
    service::{
        assignment_policy::AssignmentQuota,
        error::ServiceError,
        ledger::{self, LedgerEntryDraft},
        task_machine::{self, TaskAction},
    },
};

/// Task lifecycle writes. Each method is one transaction: guards are
/// evaluated against rows locked inside it and nothing is written when a
/// guard fails.
#[async_trait]
pub trait TaskExt {
    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error>;

    async fn get_task_files(&self, task_id: Uuid) -> Result<Vec<TaskFile>, sqlx::Error>;

    async fn create_tasks(
        &self,
        job_id: Uuid,
        drafts: Vec<TaskDraft>,
    ) -> Result<Vec<Task>, ServiceError>;

    async fn accept_task(
        &self,
        task_id: Uuid,
        worker_id: Uuid,
        today: NaiveDate,
    ) -> Result<Task, ServiceError>;

    async fn submit_task(
        &self,
        task_id: Uuid,
        worker_id: Uuid,
        submission_data: Option<String>,
        files: Vec<NewTaskFile>,
    ) -> Result<(Task, Vec<TaskFile>), ServiceError>;

    async fn review_task(
        &self,
        task_id: Uuid,
        review: TaskReview,
    ) -> Result<ReviewOutcome, ServiceError>;

    async fn worker_rating_summary(&self, worker_id: Uuid) -> Result<RatingSummary, sqlx::Error>;
}

#[async_trait]
pub trait TaskListingExt {
    async fn get_task_listing(&self, task_id: Uuid) -> Result<Option<TaskListing>, sqlx::Error>;

    async fn list_job_tasks(&self, job_id: Uuid) -> Result<Vec<TaskListing>, sqlx::Error>;

    async fn list_available_tasks(&self, today: NaiveDate) -> Result<Vec<TaskListing>, sqlx::Error>;

    async fn list_worker_tasks(&self, worker_id: Uuid) -> Result<Vec<TaskListing>, sqlx::Error>;

    async fn list_pending_review(&self) -> Result<Vec<TaskListing>, sqlx::Error>;
}

#[async_trait]
impl TaskExt for DBClient {
    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_task_files(&self, task_id: Uuid) -> Result<Vec<TaskFile>, sqlx::Error> {
        sqlx::query_as::<_, TaskFile>(
            r#"
            SELECT id, task_id, file_path, file_type, file_size, uploaded_at
            FROM task_files
            WHERE task_id = $1
            ORDER BY uploaded_at ASC
            "#
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_tasks(
        &self,
        job_id: Uuid,
        drafts: Vec<TaskDraft>,
    ) -> Result<Vec<Task>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let job_exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM jobs WHERE id = $1 FOR SHARE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;

        if job_exists.is_none() {
            return Err(ServiceError::job_not_found());
        }

        let mut tasks = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let task = sqlx::query_as::<_, Task>(
                r#"
                INSERT INTO tasks
                    (job_id, title, description, latitude, longitude, location_name,
                     start_time, end_time, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'available')
                RETURNING *
                "#
            )
            .bind(job_id)
            .bind(draft.title)
            .bind(draft.description)
            .bind(draft.latitude)
            .bind(draft.longitude)
            .bind(draft.location_name)
            .bind(draft.start_time)
            .bind(draft.end_time)
            .fetch_one(&mut *tx)
            .await?;

            tasks.push(task);
        }

        tx.commit().await?;
        Ok(tasks)
    }

    async fn accept_task(
        &self,
        task_id: Uuid,
        worker_id: Uuid,
        today: NaiveDate,
    ) -> Result<Task, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(ServiceError::task_not_found)?;

        task_machine::next_status(task.id, task.status, TaskAction::Accept)?;

        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(task.job_id)
            .fetch_one(&mut *tx)
            .await?;

        if !job.is_open_on(today) {
            return Err(ServiceError::Conflict(task.id));
        }

        // Serializes concurrent acceptances by the same worker so the count
        // below always sees the other transaction's committed assignment.
        let worker = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(worker_id)
            .fetch_optional(&mut *tx)
            .await?;

        if worker.is_none() {
            return Err(ServiceError::user_not_found());
        }

        let held = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE job_id = $1 AND worker_id = $2 AND status <> 'rejected'
            "#
        )
        .bind(job.id)
        .bind(worker_id)
        .fetch_one(&mut *tx)
        .await?;

        AssignmentQuota::new(held, job.n_tasks_per_worker_allowed as i64).ensure_slot_free()?;

        let assigned = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET worker_id = $2,
                status = 'assigned',
                assigned_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'available'
            RETURNING *
            "#
        )
        .bind(task_id)
        .bind(worker_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::Conflict(task_id))?;

        tx.commit().await?;
        Ok(assigned)
    }

    async fn submit_task(
        &self,
        task_id: Uuid,
        worker_id: Uuid,
        submission_data: Option<String>,
        files: Vec<NewTaskFile>,
    ) -> Result<(Task, Vec<TaskFile>), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(ServiceError::task_not_found)?;

        task_machine::ensure_assigned_to(&task, worker_id)?;
        task_machine::next_status(task.id, task.status, TaskAction::Submit)?;

        let submitted = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'submitted',
                submission_data = $2,
                submitted_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(task_id)
        .bind(submission_data)
        .fetch_one(&mut *tx)
        .await?;

        let mut saved_files = Vec::with_capacity(files.len());
        for file in files {
            let saved = sqlx::query_as::<_, TaskFile>(
                r#"
                INSERT INTO task_files (task_id, file_path, file_type, file_size)
                VALUES ($1, $2, $3, $4)
                RETURNING id, task_id, file_path, file_type, file_size, uploaded_at
                "#
            )
            .bind(task_id)
            .bind(file.file_path)
            .bind(file.file_type)
            .bind(file.file_size)
            .fetch_one(&mut *tx)
            .await?;

            saved_files.push(saved);
        }

        tx.commit().await?;
        Ok((submitted, saved_files))
    }

    async fn review_task(
        &self,
        task_id: Uuid,
        review: TaskReview,
    ) -> Result<ReviewOutcome, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(ServiceError::task_not_found)?;

        let status = task_machine::next_status(
            task.id,
            task.status,
            TaskAction::from_review(review.decision),
        )?;

        let reviewed = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2,
                reviewer_notes = $3,
                worker_rating = $4,
                reviewed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(task_id)
        .bind(status)
        .bind(review.reviewer_notes)
        .bind(review.worker_rating)
        .fetch_one(&mut *tx)
        .await?;

        if status != TaskStatus::Approved {
            tx.commit().await?;
            return Ok(ReviewOutcome {
                task: reviewed,
                payment: None,
                points_entry: None,
            });
        }

        let worker_id = task.worker_id.ok_or_else(|| {
            ServiceError::InvalidOperation("Submitted task has no assigned worker".to_string())
        })?;

        let pay_per_task = sqlx::query_scalar::<_, i64>("SELECT pay_per_task FROM jobs WHERE id = $1")
            .bind(task.job_id)
            .fetch_one(&mut *tx)
            .await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (worker_id, task_id, amount, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id, worker_id, task_id, amount, status, paid_at, created_at
            "#
        )
        .bind(worker_id)
        .bind(task_id)
        .bind(pay_per_task)
        .fetch_one(&mut *tx)
        .await?;

        let account = pointsdb::lock_account(&mut *tx, worker_id)
            .await?
            .ok_or_else(ServiceError::user_not_found)?;

        let draft = LedgerEntryDraft::next(
            worker_id,
            Some(task.job_id),
            account.balance,
            pay_per_task,
            PointsTransactionType::Earned,
            ledger::earned_description(task_id),
        )?;

        let entry = pointsdb::insert_entry(&mut *tx, &draft).await?;

        tx.commit().await?;

        Ok(ReviewOutcome {
            task: reviewed,
            payment: Some(payment),
            points_entry: Some(entry),
        })
    }

    async fn worker_rating_summary(&self, worker_id: Uuid) -> Result<RatingSummary, sqlx::Error> {
        sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT
                AVG(worker_rating)::DOUBLE PRECISION AS average_rating,
                COUNT(worker_rating) AS total_ratings
            FROM tasks
            WHERE worker_id = $1 AND worker_rating IS NOT NULL
            "#
        )
        .bind(worker_id)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl TaskListingExt for DBClient {
    async fn get_task_listing(&self, task_id: Uuid) -> Result<Option<TaskListing>, sqlx::Error> {
        sqlx::query_as::<_, TaskListing>(
            r#"
            SELECT
                t.*,
                j.title AS job_title,
                j.description AS job_description,
                j.pay_per_task,
                u.name AS worker_name,
                u.email AS worker_email
            FROM tasks t
            JOIN jobs j ON t.job_id = j.id
            LEFT JOIN users u ON t.worker_id = u.id
            WHERE t.id = $1
            "#
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_job_tasks(&self, job_id: Uuid) -> Result<Vec<TaskListing>, sqlx::Error> {
        sqlx::query_as::<_, TaskListing>(
            r#"
            SELECT
                t.*,
                u.name AS worker_name,
                u.email AS worker_email,
                (SELECT COUNT(*) FROM task_files f WHERE f.task_id = t.id) AS file_count
            FROM tasks t
            LEFT JOIN users u ON t.worker_id = u.id
            WHERE t.job_id = $1
            ORDER BY t.created_at DESC
            "#
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_available_tasks(&self, today: NaiveDate) -> Result<Vec<TaskListing>, sqlx::Error> {
        sqlx::query_as::<_, TaskListing>(
            r#"
            SELECT
                t.*,
                j.title AS job_title,
                j.pay_per_task,
                j.description AS job_description
            FROM tasks t
            JOIN jobs j ON t.job_id = j.id
            WHERE t.status = 'available'
              AND j.status = 'active'
              AND $1 BETWEEN j.start_date AND j.end_date
            ORDER BY t.created_at DESC
            "#
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_worker_tasks(&self, worker_id: Uuid) -> Result<Vec<TaskListing>, sqlx::Error> {
        sqlx::query_as::<_, TaskListing>(
            r#"
            SELECT
                t.*,
                j.title AS job_title,
                j.pay_per_task,
                (SELECT COUNT(*) FROM task_files f WHERE f.task_id = t.id) AS file_count
            FROM tasks t
            JOIN jobs j ON t.job_id = j.id
            WHERE t.worker_id = $1
            ORDER BY t.updated_at DESC
            "#
        )
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_pending_review(&self) -> Result<Vec<TaskListing>, sqlx::Error> {
        sqlx::query_as::<_, TaskListing>(
            r#"
            SELECT
                t.*,
                j.title AS job_title,
                u.name AS worker_name,
                u.email AS worker_email,
                (SELECT COUNT(*) FROM task_files f WHERE f.task_id = t.id) AS file_count
            FROM tasks t
            JOIN jobs j ON t.job_id = j.id
            JOIN users u ON t.worker_id = u.id
            WHERE t.status = 'submitted'
            ORDER BY t.submitted_at ASC
            "#
        )
        .fetch_all(&self.pool)
        .await
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
