use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::devicedb::DeviceExt,
    dtos::{devicedtos::RegisterDeviceDto, ApiResponse},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn devices_handler() -> Router {
    Router::new()
        .route("/", get(get_devices))
        .route("/register", post(register_device))
        .route("/:device_id", delete(remove_device))
        .route("/:device_id/ping", post(ping_device))
}

pub async fn get_devices(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let devices = app_state.db_client
        .get_devices(auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Devices retrieved", devices)))
}

pub async fn register_device(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<RegisterDeviceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (device, inserted) = app_state.db_client
        .register_device(auth.user.id, &body.device_id, body.device_type, body.device_name)
        .await?;

    let (status, message) = if inserted {
        (StatusCode::CREATED, "Device registered successfully")
    } else {
        (StatusCode::OK, "Device updated successfully")
    };

    Ok((status, Json(ApiResponse::success(message, device))))
}

pub async fn remove_device(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(device_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let removed = app_state.db_client
        .delete_device(auth.user.id, device_id)
        .await?;

    if !removed {
        return Err(HttpError::not_found("Device not found"));
    }

    Ok(Json(ApiResponse::message("Device removed successfully")))
}

pub async fn ping_device(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(device_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let device = app_state.db_client
        .touch_device(auth.user.id, device_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Device not found"))?;

    Ok(Json(ApiResponse::success("Device activity updated", device)))
}
