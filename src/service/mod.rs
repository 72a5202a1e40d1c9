pub mod assignment_policy;
pub mod error;
pub mod ledger;
pub mod points_service;
pub mod task_machine;
pub mod task_service;
