// service/task_service.rs
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{taskdb, MarketStore},
    models::{
        taskmodel::*,
        usermodel::{Caller, RatingSummary, UserRole},
    },
    service::{
        error::ServiceError,
        task_machine::{self, TaskAction},
    },
    utils::csv_import::ParsedRows,
};

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub created: Vec<Task>,
    pub errors: Vec<String>,
}

/// Review request as it arrives from the caller, before the rating has
/// been range checked.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    pub reviewer_notes: Option<String>,
    pub worker_rating: Option<i64>,
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn MarketStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    pub async fn accept(&self, caller: &Caller, task_id: Uuid) -> Result<Task, ServiceError> {
        task_machine::authorize(caller, TaskAction::Accept)?;

        let task = self
            .store
            .accept_task(task_id, caller.user_id, taskdb::today())
            .await?;

        tracing::info!("Task {} accepted by worker {}", task.id, caller.user_id);
        Ok(task)
    }

    pub async fn submit(
        &self,
        caller: &Caller,
        task_id: Uuid,
        submission_data: Option<String>,
        files: Vec<NewTaskFile>,
    ) -> Result<(Task, Vec<TaskFile>), ServiceError> {
        task_machine::authorize(caller, TaskAction::Submit)?;

        let (task, files) = self
            .store
            .submit_task(task_id, caller.user_id, submission_data, files)
            .await?;

        tracing::info!(
            "Task {} submitted by worker {} with {} files",
            task.id,
            caller.user_id,
            files.len()
        );
        Ok((task, files))
    }

    pub async fn review(
        &self,
        caller: &Caller,
        task_id: Uuid,
        request: ReviewRequest,
    ) -> Result<ReviewOutcome, ServiceError> {
        let action = TaskAction::from_review(request.decision);
        task_machine::authorize(caller, action)?;
        let worker_rating = task_machine::validate_rating(request.worker_rating)?;

        let outcome = self
            .store
            .review_task(
                task_id,
                TaskReview {
                    decision: request.decision,
                    reviewer_notes: request.reviewer_notes,
                    worker_rating,
                },
            )
            .await?;

        match (&outcome.payment, &outcome.points_entry) {
            (Some(payment), Some(entry)) => tracing::info!(
                "Task {} approved: payment {} of {} to worker {}, balance now {}",
                task_id,
                payment.id,
                payment.amount,
                payment.worker_id,
                entry.balance_after
            ),
            _ => tracing::info!("Task {} {}", task_id, outcome.task.status),
        }

        Ok(outcome)
    }

    pub async fn create_task(
        &self,
        caller: &Caller,
        job_id: Uuid,
        draft: TaskDraft,
    ) -> Result<Task, ServiceError> {
        ensure_admin(caller)?;

        let task = self
            .store
            .create_tasks(job_id, vec![draft])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InvalidOperation("Task was not created".to_string()))?;

        tracing::info!("Task {} created in job {}", task.id, job_id);
        Ok(task)
    }

    pub async fn import_tasks(
        &self,
        caller: &Caller,
        job_id: Uuid,
        rows: ParsedRows,
    ) -> Result<ImportReport, ServiceError> {
        ensure_admin(caller)?;

        if rows.drafts.is_empty() {
            tracing::warn!("Task import for job {} had no valid rows", job_id);
            return Err(ServiceError::NoValidRows { errors: rows.errors });
        }

        let created = self.store.create_tasks(job_id, rows.drafts).await?;

        tracing::info!(
            "Imported {} tasks into job {} ({} rows rejected)",
            created.len(),
            job_id,
            rows.errors.len()
        );

        Ok(ImportReport {
            created,
            errors: rows.errors,
        })
    }

    pub async fn rating_summary(&self, worker_id: Uuid) -> Result<RatingSummary, ServiceError> {
        Ok(self.store.worker_rating_summary(worker_id).await?)
    }
}

pub(crate) fn ensure_admin(caller: &Caller) -> Result<(), ServiceError> {
    if caller.role != UserRole::Admin {
        return Err(ServiceError::Forbidden(
            "Only admin users can perform this action".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_worker(caller: &Caller) -> Result<(), ServiceError> {
    if caller.role != UserRole::Worker {
        return Err(ServiceError::Forbidden(
            "Only worker users can perform this action".to_string(),
        ));
    }
    Ok(())
}
