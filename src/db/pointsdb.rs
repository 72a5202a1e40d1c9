// db/pointsdb.rs
use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    models::pointsmodel::*,
    service::{
        error::ServiceError,
        ledger::{self, LedgerEntryDraft},
    },
};

/// Append-only points ledger. Every write locks the owner's `users` row
/// first so appends for one user are applied one at a time.
#[async_trait]
pub trait PointsExt {
    async fn current_balance(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn append_points(
        &self,
        user_id: Uuid,
        job_id: Option<Uuid>,
        points: i64,
        transaction_type: PointsTransactionType,
        description: String,
    ) -> Result<PointsTransaction, ServiceError>;

    async fn reimburse_balance(
        &self,
        user_id: Uuid,
        minimum: i64,
    ) -> Result<Reimbursement, ServiceError>;

    /// Full ledger for a user in append order.
    async fn ledger_entries(&self, user_id: Uuid) -> Result<Vec<PointsTransaction>, sqlx::Error>;
}

/// Read-only history views for the points screens.
#[async_trait]
pub trait PointsReportExt {
    async fn points_history(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PointsTransactionListing>, sqlx::Error>;

    async fn admin_points_history(
        &self,
        user_id: Option<Uuid>,
        transaction_type: Option<PointsTransactionType>,
        limit: i64,
    ) -> Result<Vec<PointsTransactionListing>, sqlx::Error>;
}

pub(crate) struct LockedAccount {
    pub balance: i64,
    pub paytm: Option<String>,
}

/// Lock the user's row and read the balance under that lock.
pub(crate) async fn lock_account(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<LockedAccount>, sqlx::Error> {
    let paytm = sqlx::query_scalar::<_, Option<String>>(
        "SELECT paytm FROM users WHERE id = $1 FOR UPDATE"
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(paytm) = paytm else {
        return Ok(None);
    };

    let balance = sum_points(conn, user_id).await?;

    Ok(Some(LockedAccount { balance, paytm }))
}

async fn sum_points(conn: &mut PgConnection, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(points), 0)::BIGINT FROM points_transactions WHERE user_id = $1"
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn insert_entry(
    conn: &mut PgConnection,
    draft: &LedgerEntryDraft,
) -> Result<PointsTransaction, sqlx::Error> {
    sqlx::query_as::<_, PointsTransaction>(
        r#"
        INSERT INTO points_transactions
            (user_id, job_id, points, transaction_type, balance_after, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING
            id,
            user_id,
            job_id,
            points,
            transaction_type,
            balance_after,
            description,
            created_at
        "#
    )
    .bind(draft.user_id)
    .bind(draft.job_id)
    .bind(draft.points)
    .bind(draft.transaction_type)
    .bind(draft.balance_after)
    .bind(&draft.description)
    .fetch_one(&mut *conn)
    .await
}

#[async_trait]
impl PointsExt for DBClient {
    async fn current_balance(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        sum_points(&mut *conn, user_id).await
    }

    async fn append_points(
        &self,
        user_id: Uuid,
        job_id: Option<Uuid>,
        points: i64,
        transaction_type: PointsTransactionType,
        description: String,
    ) -> Result<PointsTransaction, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let account = lock_account(&mut *tx, user_id)
            .await?
            .ok_or_else(ServiceError::user_not_found)?;

        let draft = LedgerEntryDraft::next(
            user_id,
            job_id,
            account.balance,
            points,
            transaction_type,
            description,
        )?;

        let entry = insert_entry(&mut *tx, &draft).await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn reimburse_balance(
        &self,
        user_id: Uuid,
        minimum: i64,
    ) -> Result<Reimbursement, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let account = lock_account(&mut *tx, user_id)
            .await?
            .ok_or_else(ServiceError::user_not_found)?;

        let plan = ledger::plan_reimbursement(account.balance, minimum, account.paytm.as_deref())?;

        let draft = LedgerEntryDraft::next(
            user_id,
            None,
            account.balance,
            -plan.amount,
            PointsTransactionType::Reimbursed,
            plan.description.clone(),
        )?;

        let entry = insert_entry(&mut *tx, &draft).await?;

        tx.commit().await?;

        Ok(Reimbursement {
            amount_reimbursed: plan.amount,
            new_balance: entry.balance_after,
            paytm_account: plan.paytm_account,
            transaction: entry,
        })
    }

    async fn ledger_entries(&self, user_id: Uuid) -> Result<Vec<PointsTransaction>, sqlx::Error> {
        sqlx::query_as::<_, PointsTransaction>(
            r#"
            SELECT
                id,
                user_id,
                job_id,
                points,
                transaction_type,
                balance_after,
                description,
                created_at
            FROM points_transactions
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl PointsReportExt for DBClient {
    async fn points_history(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PointsTransactionListing>, sqlx::Error> {
        sqlx::query_as::<_, PointsTransactionListing>(
            r#"
            SELECT
                p.id,
                p.user_id,
                p.job_id,
                p.points,
                p.transaction_type,
                p.balance_after,
                p.description,
                p.created_at,
                j.title AS job_title
            FROM points_transactions p
            LEFT JOIN jobs j ON p.job_id = j.id
            WHERE p.user_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2
            "#
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn admin_points_history(
        &self,
        user_id: Option<Uuid>,
        transaction_type: Option<PointsTransactionType>,
        limit: i64,
    ) -> Result<Vec<PointsTransactionListing>, sqlx::Error> {
        sqlx::query_as::<_, PointsTransactionListing>(
            r#"
            SELECT
                p.id,
                p.user_id,
                p.job_id,
                p.points,
                p.transaction_type,
                p.balance_after,
                p.description,
                p.created_at,
                u.name AS user_name,
                u.email AS user_email,
                j.title AS job_title
            FROM points_transactions p
            JOIN users u ON p.user_id = u.id
            LEFT JOIN jobs j ON p.job_id = j.id
            WHERE ($1::UUID IS NULL OR p.user_id = $1)
              AND ($2::points_transaction_type IS NULL OR p.transaction_type = $2)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3
            "#
        )
        .bind(user_id)
        .bind(transaction_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
