use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    db::paymentdb::PaymentExt,
    dtos::{paymentdtos::PaymentQueryDto, ApiResponse},
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn payments_handler() -> Router {
    let admin_routes = Router::new()
        .route("/", get(list_payments))
        .route("/:payment_id/pay", post(mark_paid))
        .route("/stats/summary", get(get_payment_stats))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }));

    Router::new()
        .route(
            "/my-payments",
            get(get_my_payments).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Worker])
            })),
        )
        .merge(admin_routes)
}

pub async fn get_my_payments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state.db_client
        .get_worker_payments(auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Payments retrieved", payments)))
}

pub async fn list_payments(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<PaymentQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state.db_client
        .list_payments(query.status)
        .await?;

    Ok(Json(ApiResponse::success("Payments retrieved", payments)))
}

pub async fn mark_paid(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state.db_client.mark_payment_paid(payment_id).await?;

    Ok(Json(ApiResponse::success("Payment marked as paid", payment)))
}

pub async fn get_payment_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.db_client
        .payment_stats()
        .await?;

    Ok(Json(ApiResponse::success("Payment statistics retrieved", stats)))
}
