// service/task_machine.rs
use uuid::Uuid;

use crate::{
    models::{
        taskmodel::{ReviewDecision, Task, TaskStatus},
        usermodel::{Caller, UserRole},
    },
    service::error::ServiceError,
};

pub const MIN_WORKER_RATING: i64 = 1;
pub const MAX_WORKER_RATING: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Accept,
    Submit,
    Approve,
    Reject,
}

impl TaskAction {
    pub fn from_review(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => TaskAction::Approve,
            ReviewDecision::Rejected => TaskAction::Reject,
        }
    }

    /// The only status this action may start from.
    pub fn required_status(&self) -> TaskStatus {
        match self {
            TaskAction::Accept => TaskStatus::Available,
            TaskAction::Submit => TaskStatus::Assigned,
            TaskAction::Approve | TaskAction::Reject => TaskStatus::Submitted,
        }
    }

    pub fn target_status(&self) -> TaskStatus {
        match self {
            TaskAction::Accept => TaskStatus::Assigned,
            TaskAction::Submit => TaskStatus::Submitted,
            TaskAction::Approve => TaskStatus::Approved,
            TaskAction::Reject => TaskStatus::Rejected,
        }
    }

    pub fn required_role(&self) -> UserRole {
        match self {
            TaskAction::Accept | TaskAction::Submit => UserRole::Worker,
            TaskAction::Approve | TaskAction::Reject => UserRole::Admin,
        }
    }
}

/// Transition table for the task lifecycle.
///
/// `available -> assigned -> submitted -> approved | rejected`. Accepting a
/// task that is no longer available is a conflict (someone else got it);
/// every other mismatch is an invalid state.
pub fn next_status(task_id: Uuid, current: TaskStatus, action: TaskAction) -> Result<TaskStatus, ServiceError> {
    let expected = action.required_status();
    if current == expected {
        return Ok(action.target_status());
    }

    match action {
        TaskAction::Accept => Err(ServiceError::Conflict(task_id)),
        _ => Err(ServiceError::InvalidState {
            id: task_id,
            expected,
            actual: current,
        }),
    }
}

pub fn authorize(caller: &Caller, action: TaskAction) -> Result<(), ServiceError> {
    if caller.role != action.required_role() {
        return Err(ServiceError::Forbidden(format!(
            "Only {} users can perform this action",
            action.required_role().to_str()
        )));
    }
    Ok(())
}

/// A task that is not bound to the caller is reported exactly like a
/// missing one.
pub fn ensure_assigned_to(task: &Task, worker_id: Uuid) -> Result<(), ServiceError> {
    if task.worker_id != Some(worker_id) {
        return Err(ServiceError::task_not_found());
    }
    Ok(())
}

pub fn validate_rating(rating: Option<i64>) -> Result<Option<i16>, ServiceError> {
    match rating {
        None => Ok(None),
        Some(value) if (MIN_WORKER_RATING..=MAX_WORKER_RATING).contains(&value) => Ok(Some(value as i16)),
        Some(_) => Err(ServiceError::Validation(format!(
            "Worker rating must be between {} and {}",
            MIN_WORKER_RATING, MAX_WORKER_RATING
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TaskStatus; 5] = [
        TaskStatus::Available,
        TaskStatus::Assigned,
        TaskStatus::Submitted,
        TaskStatus::Approved,
        TaskStatus::Rejected,
    ];

    #[test]
    fn test_happy_path_transitions() {
        let id = Uuid::new_v4();
        assert_eq!(next_status(id, TaskStatus::Available, TaskAction::Accept).unwrap(), TaskStatus::Assigned);
        assert_eq!(next_status(id, TaskStatus::Assigned, TaskAction::Submit).unwrap(), TaskStatus::Submitted);
        assert_eq!(next_status(id, TaskStatus::Submitted, TaskAction::Approve).unwrap(), TaskStatus::Approved);
        assert_eq!(next_status(id, TaskStatus::Submitted, TaskAction::Reject).unwrap(), TaskStatus::Rejected);
    }

    #[test]
    fn test_accept_from_any_other_state_is_conflict() {
        let id = Uuid::new_v4();
        for status in ALL.iter().filter(|s| **s != TaskStatus::Available) {
            assert!(matches!(
                next_status(id, *status, TaskAction::Accept),
                Err(ServiceError::Conflict(_))
            ));
        }
    }

    #[test]
    fn test_terminal_states_reject_every_action() {
        let id = Uuid::new_v4();
        for status in [TaskStatus::Approved, TaskStatus::Rejected] {
            assert!(status.is_terminal());
            for action in [TaskAction::Submit, TaskAction::Approve, TaskAction::Reject] {
                assert!(matches!(
                    next_status(id, status, action),
                    Err(ServiceError::InvalidState { .. })
                ));
            }
        }
    }

    #[test]
    fn test_review_requires_submitted() {
        let id = Uuid::new_v4();
        let err = next_status(id, TaskStatus::Assigned, TaskAction::Approve).unwrap_err();
        match err {
            ServiceError::InvalidState { expected, actual, .. } => {
                assert_eq!(expected, TaskStatus::Submitted);
                assert_eq!(actual, TaskStatus::Assigned);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert_eq!(validate_rating(None).unwrap(), None);
        assert_eq!(validate_rating(Some(1)).unwrap(), Some(1));
        assert_eq!(validate_rating(Some(5)).unwrap(), Some(5));
        for bad in [0, 6, -1, 70_000] {
            assert!(matches!(validate_rating(Some(bad)), Err(ServiceError::Validation(_))));
        }
    }

    #[test]
    fn test_roles() {
        let worker = Caller::new(Uuid::new_v4(), UserRole::Worker);
        let admin = Caller::new(Uuid::new_v4(), UserRole::Admin);
        assert!(authorize(&worker, TaskAction::Accept).is_ok());
        assert!(authorize(&admin, TaskAction::Accept).is_err());
        assert!(authorize(&admin, TaskAction::Approve).is_ok());
        assert!(matches!(authorize(&worker, TaskAction::Reject), Err(ServiceError::Forbidden(_))));
    }
}
