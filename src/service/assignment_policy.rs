use crate::{models::taskmodel::TaskStatus, service::error::ServiceError};

/// How many tasks of one job a worker holds against what the job allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentQuota {
    pub held: i64,
    pub allowed: i64,
}

impl AssignmentQuota {
    pub fn new(held: i64, allowed: i64) -> Self {
        Self { held, allowed }
    }

    /// Count held slots from the statuses of the worker's tasks on the job.
    pub fn from_statuses<I>(statuses: I, allowed: i64) -> Self
    where
        I: IntoIterator<Item = TaskStatus>,
    {
        let held = statuses.into_iter().filter(|s| s.counts_toward_quota()).count() as i64;
        Self { held, allowed }
    }

    pub fn ensure_slot_free(&self) -> Result<(), ServiceError> {
        if self.held >= self.allowed {
            tracing::warn!("Task quota reached: {} of {} held", self.held, self.allowed);
            return Err(ServiceError::QuotaExceeded {
                held: self.held,
                allowed: self.allowed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_tasks_free_their_slot() {
        let quota = AssignmentQuota::from_statuses(
            [TaskStatus::Rejected, TaskStatus::Rejected, TaskStatus::Approved],
            2,
        );
        assert_eq!(quota.held, 1);
        assert!(quota.ensure_slot_free().is_ok());
    }

    #[test]
    fn test_assigned_submitted_and_approved_all_count() {
        let quota = AssignmentQuota::from_statuses(
            [TaskStatus::Assigned, TaskStatus::Submitted, TaskStatus::Approved],
            3,
        );
        assert_eq!(quota.held, 3);
        assert!(matches!(
            quota.ensure_slot_free(),
            Err(ServiceError::QuotaExceeded { held: 3, allowed: 3 })
        ));
    }
}
