use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::jobdb::{ClientExt, ClientInput},
    dtos::{jobdtos::ClientDto, ApiResponse},
    error::HttpError,
    AppState,
};

/// Admin-only; the role layer is applied where this router is nested.
pub fn clients_handler() -> Router {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route(
            "/:client_id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

pub async fn list_clients(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let clients = app_state.db_client
        .list_clients()
        .await?;

    Ok(Json(ApiResponse::success("Clients retrieved", clients)))
}

pub async fn get_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let client = app_state.db_client
        .get_client(client_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Client not found"))?;

    Ok(Json(ApiResponse::success("Client retrieved", client)))
}

pub async fn create_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ClientDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let mut input = ClientInput::from(body);
    let name = input
        .name
        .take()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| HttpError::bad_request("Client name is required"))?;

    let client = app_state.db_client
        .create_client(name, input)
        .await?;

    tracing::info!("Client {} created", client.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Client created successfully", client)),
    ))
}

pub async fn update_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    Json(body): Json<ClientDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let input = ClientInput::from(body);
    if input.is_empty() {
        return Err(HttpError::bad_request("No valid fields to update"));
    }

    let client = app_state.db_client.update_client(client_id, input).await?;

    Ok(Json(ApiResponse::success("Client updated successfully", client)))
}

pub async fn delete_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.db_client.delete_client(client_id).await?;

    tracing::info!("Client {} deleted", client_id);

    Ok(Json(ApiResponse::message("Client deleted successfully")))
}
