// service/points_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        pointsmodel::*,
        usermodel::Caller,
    },
    service::{
        error::ServiceError,
        ledger,
        task_service::{ensure_admin, ensure_worker},
    },
};

#[derive(Clone)]
pub struct PointsService {
    store: Arc<dyn MarketStore>,
    min_reimbursement_points: i64,
}

impl PointsService {
    pub fn new(store: Arc<dyn MarketStore>, min_reimbursement_points: i64) -> Self {
        Self {
            store,
            min_reimbursement_points,
        }
    }

    pub fn min_reimbursement_points(&self) -> i64 {
        self.min_reimbursement_points
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        Ok(self.store.current_balance(user_id).await?)
    }

    /// Cash out the caller's whole balance to their Paytm handle.
    pub async fn reimburse(&self, caller: &Caller) -> Result<Reimbursement, ServiceError> {
        ensure_worker(caller)?;

        let reimbursement = self
            .store
            .reimburse_balance(caller.user_id, self.min_reimbursement_points)
            .await
            .map_err(|e| {
                if matches!(e, ServiceError::BelowMinimum { .. } | ServiceError::MissingPayoutInfo) {
                    tracing::warn!("Reimbursement refused for {}: {}", caller.user_id, e);
                }
                e
            })?;

        tracing::info!(
            "Reimbursed {} points to {} for user {}",
            reimbursement.amount_reimbursed,
            reimbursement.paytm_account,
            caller.user_id
        );
        Ok(reimbursement)
    }

    /// Manual correction by an admin. Any amount is accepted, including zero,
    /// and the resulting balance may go negative.
    pub async fn adjust(
        &self,
        caller: &Caller,
        user_id: Uuid,
        points: i64,
        description: Option<String>,
    ) -> Result<Adjustment, ServiceError> {
        ensure_admin(caller)?;

        let transaction = self
            .store
            .append_points(
                user_id,
                None,
                points,
                PointsTransactionType::Adjusted,
                ledger::adjustment_description(points, description),
            )
            .await?;

        tracing::info!(
            "Admin {} adjusted user {} by {} points, balance now {}",
            caller.user_id,
            user_id,
            points,
            transaction.balance_after
        );

        Ok(Adjustment {
            previous_balance: transaction.balance_after - points,
            adjustment: points,
            new_balance: transaction.balance_after,
            transaction,
        })
    }

    /// Replays a user's ledger and checks every stored running balance.
    pub async fn reconcile(&self, caller: &Caller, user_id: Uuid) -> Result<LedgerAudit, ServiceError> {
        ensure_admin(caller)?;

        let entries = self.store.ledger_entries(user_id).await?;
        let audit = LedgerAudit {
            user_id,
            entry_count: entries.len(),
            balance: ledger::balance_of(&entries),
            consistent: ledger::verify_running_balance(&entries),
        };

        if !audit.consistent {
            tracing::error!("Ledger for user {} has a broken running balance", user_id);
        }

        Ok(audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory::MemoryStore, pointsdb::PointsExt},
        models::{taskmodel::ReviewDecision, usermodel::UserRole},
        service::{
            ledger::DEFAULT_MIN_REIMBURSEMENT_POINTS,
            task_service::{ReviewRequest, TaskService},
        },
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        points: PointsService,
        admin: Caller,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let admin = Caller::new(store.add_user(UserRole::Admin, None).await, UserRole::Admin);
        let points = PointsService::new(store.clone(), DEFAULT_MIN_REIMBURSEMENT_POINTS);
        Fixture { store, points, admin }
    }

    async fn worker(f: &Fixture, paytm: Option<&str>) -> Caller {
        Caller::new(f.store.add_user(UserRole::Worker, paytm).await, UserRole::Worker)
    }

    #[tokio::test]
    async fn test_earn_then_reimburse_scenario() {
        let f = fixture().await;
        let worker = worker(&f, Some("9876543210@paytm")).await;
        let tasks = TaskService::new(f.store.clone());

        let job = f.store.add_job(25, 1).await;
        let task_id = f.store.add_task(job.id).await;
        tasks.accept(&worker, task_id).await.unwrap();
        tasks.submit(&worker, task_id, None, vec![]).await.unwrap();
        tasks
            .review(
                &f.admin,
                task_id,
                ReviewRequest {
                    decision: ReviewDecision::Approved,
                    reviewer_notes: None,
                    worker_rating: Some(5),
                },
            )
            .await
            .unwrap();
        assert_eq!(f.points.balance(worker.user_id).await.unwrap(), 25);

        let reimbursement = f.points.reimburse(&worker).await.unwrap();
        assert_eq!(reimbursement.amount_reimbursed, 25);
        assert_eq!(reimbursement.new_balance, 0);
        assert_eq!(reimbursement.paytm_account, "9876543210@paytm");
        assert_eq!(reimbursement.transaction.points, -25);
        assert_eq!(
            reimbursement.transaction.transaction_type,
            PointsTransactionType::Reimbursed
        );

        let entries = f.store.ledger_entries(worker.user_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(ledger::verify_running_balance(&entries));
        assert_eq!(f.points.balance(worker.user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reimbursement_below_minimum_writes_nothing() {
        let f = fixture().await;
        let worker = worker(&f, Some("handle")).await;
        f.points.adjust(&f.admin, worker.user_id, 9, None).await.unwrap();

        let err = f.points.reimburse(&worker).await.unwrap_err();
        assert!(matches!(err, ServiceError::BelowMinimum { balance: 9, minimum: 10 }));
        assert_eq!(f.store.ledger_entries(worker.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reimbursement_at_exact_minimum() {
        let f = fixture().await;
        let worker = worker(&f, Some("handle")).await;
        f.points.adjust(&f.admin, worker.user_id, 10, None).await.unwrap();

        let reimbursement = f.points.reimburse(&worker).await.unwrap();
        assert_eq!(reimbursement.amount_reimbursed, 10);
        assert_eq!(reimbursement.new_balance, 0);
    }

    #[tokio::test]
    async fn test_reimbursement_requires_payout_handle() {
        let f = fixture().await;
        let worker = worker(&f, None).await;
        f.points.adjust(&f.admin, worker.user_id, 50, None).await.unwrap();

        assert!(matches!(
            f.points.reimburse(&worker).await,
            Err(ServiceError::MissingPayoutInfo)
        ));
        assert_eq!(f.points.balance(worker.user_id).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_adjustments_keep_running_balance() {
        let f = fixture().await;
        let worker = worker(&f, None).await;

        let first = f.points.adjust(&f.admin, worker.user_id, 30, None).await.unwrap();
        assert_eq!(first.previous_balance, 0);
        assert_eq!(first.new_balance, 30);
        assert_eq!(first.transaction.description, "Admin adjustment: 30 points");

        let second = f
            .points
            .adjust(&f.admin, worker.user_id, -45, Some("Duplicate payout".to_string()))
            .await
            .unwrap();
        assert_eq!(second.previous_balance, 30);
        assert_eq!(second.new_balance, -15);
        assert_eq!(second.transaction.description, "Duplicate payout");

        let entries = f.store.ledger_entries(worker.user_id).await.unwrap();
        assert!(ledger::verify_running_balance(&entries));
        assert_eq!(ledger::balance_of(&entries), -15);
    }

    #[tokio::test]
    async fn test_adjustment_rules() {
        let f = fixture().await;
        let worker = worker(&f, None).await;

        let zero = f.points.adjust(&f.admin, worker.user_id, 0, None).await.unwrap();
        assert_eq!(zero.previous_balance, 0);
        assert_eq!(zero.new_balance, 0);
        assert_eq!(zero.transaction.transaction_type, PointsTransactionType::Adjusted);
        assert_eq!(f.store.ledger_entries(worker.user_id).await.unwrap().len(), 1);

        assert!(matches!(
            f.points.adjust(&worker, worker.user_id, 5, None).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.points.adjust(&f.admin, Uuid::new_v4(), 5, None).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.points.reimburse(&f.admin).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_ledger_consistent() {
        let f = fixture().await;
        let worker = worker(&f, None).await;

        let mut handles = Vec::new();
        for i in 1..=20i64 {
            let points = f.points.clone();
            let admin = f.admin;
            let amount = if i % 3 == 0 { -i } else { i };
            handles.push(tokio::spawn(async move {
                points.adjust(&admin, worker.user_id, amount, None).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let entries = f.store.ledger_entries(worker.user_id).await.unwrap();
        assert_eq!(entries.len(), 20);
        assert!(ledger::verify_running_balance(&entries));
        let expected: i64 = (1..=20i64).map(|i| if i % 3 == 0 { -i } else { i }).sum();
        assert_eq!(f.points.balance(worker.user_id).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_reconcile_reports_replayed_balance() {
        let f = fixture().await;
        let worker = worker(&f, Some("handle")).await;
        f.points.adjust(&f.admin, worker.user_id, 40, None).await.unwrap();
        f.points.reimburse(&worker).await.unwrap();
        f.points.adjust(&f.admin, worker.user_id, 7, None).await.unwrap();

        let audit = f.points.reconcile(&f.admin, worker.user_id).await.unwrap();
        assert_eq!(audit.entry_count, 3);
        assert_eq!(audit.balance, 7);
        assert!(audit.consistent);

        assert!(matches!(
            f.points.reconcile(&worker, worker.user_id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}
