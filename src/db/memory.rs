// db/memory.rs
//! In-process store for service tests.
//!
//! One async mutex guards the whole state, so every trait method runs as a
//! single writer the way a Postgres transaction holding its row locks does.
//! Guards and arithmetic come from the same service modules the Postgres
//! implementation calls.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{pointsdb::PointsExt, taskdb::TaskExt};
use crate::{
    models::{
        jobmodel::{Job, JobStatus},
        paymentmodel::{Payment, PaymentStatus},
        pointsmodel::*,
        taskmodel::*,
        usermodel::{RatingSummary, User, UserRole},
    },
    service::{
        assignment_policy::AssignmentQuota,
        error::ServiceError,
        ledger::{self, LedgerEntryDraft},
        task_machine::{self, TaskAction},
    },
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    jobs: HashMap<Uuid, Job>,
    tasks: HashMap<Uuid, Task>,
    files: Vec<TaskFile>,
    payments: Vec<Payment>,
    entries: Vec<PointsTransaction>,
}

impl MemoryState {
    fn balance(&self, user_id: Uuid) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.points)
            .sum()
    }

    fn push_entry(&mut self, draft: LedgerEntryDraft) -> PointsTransaction {
        let entry = PointsTransaction {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            job_id: draft.job_id,
            points: draft.points,
            transaction_type: draft.transaction_type,
            balance_after: draft.balance_after,
            description: draft.description,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }

    fn task(&self, task_id: Uuid) -> Result<Task, ServiceError> {
        self.tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(ServiceError::task_not_found)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, role: UserRole, paytm: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let user = User {
            id,
            email: format!("{}@example.com", id),
            password: String::new(),
            role,
            name: format!("{} {}", role.to_str(), &id.to_string()[..8]),
            phone: None,
            sex: None,
            address: None,
            age: None,
            paytm: paytm.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.users.insert(id, user);
        id
    }

    /// An active job whose window spans today.
    pub async fn add_job(&self, pay_per_task: i64, n_tasks_per_worker_allowed: i32) -> Job {
        let today = Utc::now().date_naive();
        self.add_job_with(
            pay_per_task,
            n_tasks_per_worker_allowed,
            JobStatus::Active,
            today - Duration::days(1),
            today + Duration::days(30),
        )
        .await
    }

    pub async fn add_job_with(
        &self,
        pay_per_task: i64,
        n_tasks_per_worker_allowed: i32,
        status: JobStatus,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Job {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            client_id: None,
            title: "Shelf audit".to_string(),
            description: "Photograph the shelf".to_string(),
            pay_per_task,
            n_tasks: 100,
            n_tasks_per_worker_allowed,
            location: None,
            location_restrictions: None,
            start_date,
            end_date,
            status,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.jobs.insert(job.id, job.clone());
        job
    }

    pub async fn add_task(&self, job_id: Uuid) -> Uuid {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            job_id,
            worker_id: None,
            title: "Store visit".to_string(),
            description: String::new(),
            latitude: None,
            longitude: None,
            location_name: None,
            start_time: None,
            end_time: None,
            status: TaskStatus::Available,
            assigned_at: None,
            submitted_at: None,
            reviewed_at: None,
            submission_data: None,
            reviewer_notes: None,
            worker_rating: None,
            created_at: now,
            updated_at: now,
        };
        let id = task.id;
        self.state.lock().await.tasks.insert(id, task);
        id
    }

    pub async fn payments(&self) -> Vec<Payment> {
        self.state.lock().await.payments.clone()
    }
}

#[async_trait]
impl TaskExt for MemoryStore {
    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
        Ok(self.state.lock().await.tasks.get(&task_id).cloned())
    }

    async fn get_task_files(&self, task_id: Uuid) -> Result<Vec<TaskFile>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.files.iter().filter(|f| f.task_id == task_id).cloned().collect())
    }

    async fn create_tasks(
        &self,
        job_id: Uuid,
        drafts: Vec<TaskDraft>,
    ) -> Result<Vec<Task>, ServiceError> {
        let mut state = self.state.lock().await;
        if !state.jobs.contains_key(&job_id) {
            return Err(ServiceError::job_not_found());
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let task = Task {
                id: Uuid::new_v4(),
                job_id,
                worker_id: None,
                title: draft.title,
                description: draft.description,
                latitude: draft.latitude,
                longitude: draft.longitude,
                location_name: draft.location_name,
                start_time: draft.start_time,
                end_time: draft.end_time,
                status: TaskStatus::Available,
                assigned_at: None,
                submitted_at: None,
                reviewed_at: None,
                submission_data: None,
                reviewer_notes: None,
                worker_rating: None,
                created_at: now,
                updated_at: now,
            };
            state.tasks.insert(task.id, task.clone());
            created.push(task);
        }
        Ok(created)
    }

    async fn accept_task(
        &self,
        task_id: Uuid,
        worker_id: Uuid,
        today: NaiveDate,
    ) -> Result<Task, ServiceError> {
        let mut state = self.state.lock().await;
        let task = state.task(task_id)?;

        task_machine::next_status(task.id, task.status, TaskAction::Accept)?;

        let job = state
            .jobs
            .get(&task.job_id)
            .cloned()
            .ok_or_else(ServiceError::job_not_found)?;
        if !job.is_open_on(today) {
            return Err(ServiceError::Conflict(task.id));
        }

        if !state.users.contains_key(&worker_id) {
            return Err(ServiceError::user_not_found());
        }

        let held = state
            .tasks
            .values()
            .filter(|t| t.job_id == job.id && t.worker_id == Some(worker_id))
            .map(|t| t.status);
        AssignmentQuota::from_statuses(held, job.n_tasks_per_worker_allowed as i64)
            .ensure_slot_free()?;

        let now = Utc::now();
        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or_else(ServiceError::task_not_found)?;
        task.worker_id = Some(worker_id);
        task.status = TaskStatus::Assigned;
        task.assigned_at = Some(now);
        task.updated_at = now;
        Ok(task.clone())
    }

    async fn submit_task(
        &self,
        task_id: Uuid,
        worker_id: Uuid,
        submission_data: Option<String>,
        files: Vec<NewTaskFile>,
    ) -> Result<(Task, Vec<TaskFile>), ServiceError> {
        let mut state = self.state.lock().await;
        let task = state.task(task_id)?;

        task_machine::ensure_assigned_to(&task, worker_id)?;
        task_machine::next_status(task.id, task.status, TaskAction::Submit)?;

        let now = Utc::now();
        let saved: Vec<TaskFile> = files
            .into_iter()
            .map(|file| TaskFile {
                id: Uuid::new_v4(),
                task_id,
                file_path: file.file_path,
                file_type: file.file_type,
                file_size: file.file_size,
                uploaded_at: now,
            })
            .collect();
        state.files.extend(saved.iter().cloned());

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or_else(ServiceError::task_not_found)?;
        task.status = TaskStatus::Submitted;
        task.submission_data = submission_data;
        task.submitted_at = Some(now);
        task.updated_at = now;
        Ok((task.clone(), saved))
    }

    async fn review_task(
        &self,
        task_id: Uuid,
        review: TaskReview,
    ) -> Result<ReviewOutcome, ServiceError> {
        let mut state = self.state.lock().await;
        let task = state.task(task_id)?;

        let status = task_machine::next_status(
            task.id,
            task.status,
            TaskAction::from_review(review.decision),
        )?;

        // Validate the ledger write before touching anything.
        let pending = if status == TaskStatus::Approved {
            let worker_id = task.worker_id.ok_or_else(|| {
                ServiceError::InvalidOperation("Submitted task has no assigned worker".to_string())
            })?;
            let pay_per_task = state
                .jobs
                .get(&task.job_id)
                .map(|j| j.pay_per_task)
                .ok_or_else(ServiceError::job_not_found)?;
            let draft = LedgerEntryDraft::next(
                worker_id,
                Some(task.job_id),
                state.balance(worker_id),
                pay_per_task,
                PointsTransactionType::Earned,
                ledger::earned_description(task_id),
            )?;
            Some((worker_id, pay_per_task, draft))
        } else {
            None
        };

        let now = Utc::now();
        let reviewed = {
            let task = state
                .tasks
                .get_mut(&task_id)
                .ok_or_else(ServiceError::task_not_found)?;
            task.status = status;
            task.reviewer_notes = review.reviewer_notes;
            task.worker_rating = review.worker_rating;
            task.reviewed_at = Some(now);
            task.updated_at = now;
            task.clone()
        };

        let Some((worker_id, amount, draft)) = pending else {
            return Ok(ReviewOutcome {
                task: reviewed,
                payment: None,
                points_entry: None,
            });
        };

        let payment = Payment {
            id: Uuid::new_v4(),
            worker_id,
            task_id,
            amount,
            status: PaymentStatus::Pending,
            paid_at: None,
            created_at: now,
        };
        state.payments.push(payment.clone());
        let entry = state.push_entry(draft);

        Ok(ReviewOutcome {
            task: reviewed,
            payment: Some(payment),
            points_entry: Some(entry),
        })
    }

    async fn worker_rating_summary(&self, worker_id: Uuid) -> Result<RatingSummary, sqlx::Error> {
        let state = self.state.lock().await;
        let ratings: Vec<i16> = state
            .tasks
            .values()
            .filter(|t| t.worker_id == Some(worker_id))
            .filter_map(|t| t.worker_rating)
            .collect();
        Ok(RatingSummary::from_ratings(&ratings))
    }
}

#[async_trait]
impl PointsExt for MemoryStore {
    async fn current_balance(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        Ok(self.state.lock().await.balance(user_id))
    }

    async fn append_points(
        &self,
        user_id: Uuid,
        job_id: Option<Uuid>,
        points: i64,
        transaction_type: PointsTransactionType,
        description: String,
    ) -> Result<PointsTransaction, ServiceError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user_id) {
            return Err(ServiceError::user_not_found());
        }

        let draft = LedgerEntryDraft::next(
            user_id,
            job_id,
            state.balance(user_id),
            points,
            transaction_type,
            description,
        )?;
        Ok(state.push_entry(draft))
    }

    async fn reimburse_balance(
        &self,
        user_id: Uuid,
        minimum: i64,
    ) -> Result<Reimbursement, ServiceError> {
        let mut state = self.state.lock().await;
        let paytm = state
            .users
            .get(&user_id)
            .map(|u| u.paytm.clone())
            .ok_or_else(ServiceError::user_not_found)?;

        let balance = state.balance(user_id);
        let plan = ledger::plan_reimbursement(balance, minimum, paytm.as_deref())?;
        let draft = LedgerEntryDraft::next(
            user_id,
            None,
            balance,
            -plan.amount,
            PointsTransactionType::Reimbursed,
            plan.description.clone(),
        )?;
        let entry = state.push_entry(draft);

        Ok(Reimbursement {
            amount_reimbursed: plan.amount,
            new_balance: entry.balance_after,
            paytm_account: plan.paytm_account,
            transaction: entry,
        })
    }

    async fn ledger_entries(&self, user_id: Uuid) -> Result<Vec<PointsTransaction>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.entries.iter().filter(|e| e.user_id == user_id).cloned().collect())
    }
}
