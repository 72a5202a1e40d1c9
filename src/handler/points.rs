use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::pointsdb::PointsReportExt,
    dtos::{
        pointsdtos::{AdjustPointsDto, PointsBalanceDto, PointsHistoryQueryDto},
        ApiResponse,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

const HISTORY_LIMIT: i64 = 50;
const ADMIN_HISTORY_LIMIT: i64 = 200;

pub fn points_handler() -> Router {
    let admin_routes = Router::new()
        .route("/transactions", get(get_all_transactions))
        .route("/adjust", post(adjust_points))
        .route("/reconcile/:user_id", get(reconcile_ledger))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }));

    Router::new()
        .route("/balance", get(get_balance))
        .route("/reimburse", post(request_reimbursement))
        .nest("/admin", admin_routes)
}

pub async fn get_balance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let current_balance = app_state.points_service.balance(auth.user.id).await?;

    let transactions = app_state.db_client
        .points_history(auth.user.id, HISTORY_LIMIT)
        .await?;

    Ok(Json(ApiResponse::success(
        "Points balance retrieved",
        PointsBalanceDto {
            current_balance,
            min_reimbursement_points: app_state.points_service.min_reimbursement_points(),
            transactions,
        },
    )))
}

pub async fn request_reimbursement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let reimbursement = app_state.points_service
        .reimburse(&auth.caller())
        .await?;

    Ok(Json(ApiResponse::success(
        "Reimbursement processed successfully",
        reimbursement,
    )))
}

pub async fn get_all_transactions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<PointsHistoryQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let transactions = app_state.db_client
        .admin_points_history(
            query.user_id,
            query.transaction_type,
            query.limit.unwrap_or(ADMIN_HISTORY_LIMIT),
        )
        .await?;

    Ok(Json(ApiResponse::success("Points transactions retrieved", transactions)))
}

pub async fn adjust_points(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<AdjustPointsDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let adjustment = app_state.points_service
        .adjust(&auth.caller(), body.user_id, body.points, body.description)
        .await?;

    Ok(Json(ApiResponse::success("Points adjusted successfully", adjustment)))
}

pub async fn reconcile_ledger(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let audit = app_state.points_service
        .reconcile(&auth.caller(), user_id)
        .await?;

    Ok(Json(ApiResponse::success("Ledger reconciled", audit)))
}
