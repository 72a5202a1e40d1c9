// db/paymentdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    models::paymentmodel::*,
    service::error::ServiceError,
};

#[async_trait]
pub trait PaymentExt {
    async fn get_worker_payments(&self, worker_id: Uuid) -> Result<Vec<PaymentListing>, sqlx::Error>;

    async fn list_payments(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentListing>, sqlx::Error>;

    async fn mark_payment_paid(&self, payment_id: Uuid) -> Result<Payment, ServiceError>;

    async fn payment_stats(&self) -> Result<PaymentStats, sqlx::Error>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn get_worker_payments(&self, worker_id: Uuid) -> Result<Vec<PaymentListing>, sqlx::Error> {
        sqlx::query_as::<_, PaymentListing>(
            r#"
            SELECT
                p.id, p.worker_id, p.task_id, p.amount, p.status, p.paid_at, p.created_at,
                t.title AS task_title,
                j.title AS job_title
            FROM payments p
            JOIN tasks t ON p.task_id = t.id
            JOIN jobs j ON t.job_id = j.id
            WHERE p.worker_id = $1
            ORDER BY p.created_at DESC
            "#
        )
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_payments(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentListing>, sqlx::Error> {
        sqlx::query_as::<_, PaymentListing>(
            r#"
            SELECT
                p.id, p.worker_id, p.task_id, p.amount, p.status, p.paid_at, p.created_at,
                u.name AS worker_name,
                u.email AS worker_email,
                t.title AS task_title,
                j.title AS job_title
            FROM payments p
            JOIN users u ON p.worker_id = u.id
            JOIN tasks t ON p.task_id = t.id
            JOIN jobs j ON t.job_id = j.id
            WHERE ($1::payment_status IS NULL OR p.status = $1)
            ORDER BY p.created_at DESC
            "#
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_payment_paid(&self, payment_id: Uuid) -> Result<Payment, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, worker_id, task_id, amount, status, paid_at, created_at
            FROM payments
            WHERE id = $1
            FOR UPDATE
            "#
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Payment".to_string()))?;

        if payment.status != PaymentStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "Payment {} is already {:?}",
                payment.id, payment.status
            ).to_lowercase()));
        }

        let paid = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = 'paid', paid_at = NOW()
            WHERE id = $1
            RETURNING id, worker_id, task_id, amount, status, paid_at, created_at
            "#
        )
        .bind(payment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Payment {} of {} marked paid", paid.id, paid.amount);
        Ok(paid)
    }

    async fn payment_stats(&self) -> Result<PaymentStats, sqlx::Error> {
        sqlx::query_as::<_, PaymentStats>(
            r#"
            SELECT
                COUNT(*) AS total_payments,
                COALESCE(SUM(amount), 0)::BIGINT AS total_amount,
                COALESCE(SUM(amount) FILTER (WHERE status = 'pending'), 0)::BIGINT AS pending_amount,
                COALESCE(SUM(amount) FILTER (WHERE status = 'paid'), 0)::BIGINT AS paid_amount,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_count,
                COUNT(*) FILTER (WHERE status = 'paid') AS paid_count
            FROM payments
            "#
        )
        .fetch_one(&self.pool)
        .await
    }
}
