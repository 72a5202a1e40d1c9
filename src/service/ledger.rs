// service/ledger.rs
//! Arithmetic for the points ledger.
//!
//! Stores call into this module while they hold the user's ledger lock, so
//! every `balance_after` is derived from a balance read in the same
//! transaction that writes the new row.

use uuid::Uuid;

use crate::{
    models::pointsmodel::{PointsTransaction, PointsTransactionType},
    service::error::ServiceError,
};

pub const DEFAULT_MIN_REIMBURSEMENT_POINTS: i64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntryDraft {
    pub user_id: Uuid,
    pub job_id: Option<Uuid>,
    pub points: i64,
    pub transaction_type: PointsTransactionType,
    pub balance_after: i64,
    pub description: String,
}

impl LedgerEntryDraft {
    pub fn next(
        user_id: Uuid,
        job_id: Option<Uuid>,
        current_balance: i64,
        points: i64,
        transaction_type: PointsTransactionType,
        description: String,
    ) -> Result<Self, ServiceError> {
        let balance_after = current_balance
            .checked_add(points)
            .ok_or_else(|| ServiceError::Validation("Points amount is out of range".to_string()))?;

        Ok(Self {
            user_id,
            job_id,
            points,
            transaction_type,
            balance_after,
            description,
        })
    }
}

pub fn earned_description(task_id: Uuid) -> String {
    format!("Earned from task {}", task_id)
}

pub fn adjustment_description(points: i64, description: Option<String>) -> String {
    match description {
        Some(text) if !text.trim().is_empty() => text,
        _ => format!("Admin adjustment: {} points", points),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReimbursementPlan {
    pub amount: i64,
    pub paytm_account: String,
    pub description: String,
}

/// Decide whether a worker may cash out and for how much.
///
/// Reimbursement always takes the whole balance; the minimum is checked
/// before the payout handle.
pub fn plan_reimbursement(
    balance: i64,
    minimum: i64,
    paytm: Option<&str>,
) -> Result<ReimbursementPlan, ServiceError> {
    if balance < minimum {
        return Err(ServiceError::BelowMinimum { balance, minimum });
    }

    let paytm_account = match paytm.map(str::trim) {
        Some(handle) if !handle.is_empty() => handle.to_string(),
        _ => return Err(ServiceError::MissingPayoutInfo),
    };

    Ok(ReimbursementPlan {
        amount: balance,
        paytm_account,
        description: format!("Reimbursement requested for {} points", balance),
    })
}

pub fn balance_of(entries: &[PointsTransaction]) -> i64 {
    entries.iter().map(|e| e.points).sum()
}

/// Reconciliation check: entries in append order must carry a correct
/// running balance starting from zero.
pub fn verify_running_balance(entries: &[PointsTransaction]) -> bool {
    let mut running = 0i64;
    for entry in entries {
        running += entry.points;
        if entry.balance_after != running {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn entry(points: i64, balance_after: i64) -> PointsTransaction {
        PointsTransaction {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            job_id: None,
            points,
            transaction_type: PointsTransactionType::Adjusted,
            balance_after,
            description: "test".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_next_entry_adds_to_balance() {
        let draft = LedgerEntryDraft::next(
            Uuid::nil(),
            None,
            40,
            -15,
            PointsTransactionType::Adjusted,
            "fix".to_string(),
        )
        .unwrap();
        assert_eq!(draft.balance_after, 25);
    }

    #[test]
    fn test_next_entry_rejects_overflow() {
        let result = LedgerEntryDraft::next(
            Uuid::nil(),
            None,
            i64::MAX,
            1,
            PointsTransactionType::Adjusted,
            "overflow".to_string(),
        );
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_reimbursement_below_minimum() {
        let err = plan_reimbursement(9, 10, Some("9876543210")).unwrap_err();
        assert!(matches!(err, ServiceError::BelowMinimum { balance: 9, minimum: 10 }));
    }

    #[test]
    fn test_reimbursement_needs_payout_handle() {
        assert!(matches!(plan_reimbursement(50, 10, None), Err(ServiceError::MissingPayoutInfo)));
        assert!(matches!(plan_reimbursement(50, 10, Some("  ")), Err(ServiceError::MissingPayoutInfo)));
    }

    #[test]
    fn test_reimbursement_takes_whole_balance() {
        let plan = plan_reimbursement(10, 10, Some("worker@paytm")).unwrap();
        assert_eq!(plan.amount, 10);
        assert_eq!(plan.paytm_account, "worker@paytm");
    }

    #[test]
    fn test_running_balance_check() {
        let good = vec![entry(10, 10), entry(-4, 6), entry(20, 26)];
        assert!(verify_running_balance(&good));
        assert_eq!(balance_of(&good), 26);

        let drifted = vec![entry(10, 10), entry(5, 16)];
        assert!(!verify_running_balance(&drifted));
    }

    #[test]
    fn test_adjustment_description_default() {
        assert_eq!(adjustment_description(-5, None), "Admin adjustment: -5 points");
        assert_eq!(adjustment_description(5, Some("bonus".to_string())), "bonus");
    }
}
