use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::userdb::{ProfileUpdate, UserExt},
    dtos::{
        userdtos::{DeleteAccountDto, FilterUserDto, ProfileDto, ProfileUpdateDto, UserPasswordUpdateDto},
        ApiResponse,
    },
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    utils::password,
    AppState,
};

pub fn profile_handler() -> Router {
    Router::new()
        .route(
            "/",
            get(get_profile)
                .put(update_profile)
                .delete(delete_account),
        )
        .route("/password", put(update_password))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let caller = auth.caller();

    let rating = if caller.is_worker() {
        Some(app_state.task_service.rating_summary(caller.user_id).await?)
    } else {
        None
    };

    Ok(Json(ApiResponse::success(
        "Profile retrieved",
        ProfileDto {
            user: FilterUserDto::filter_user(&auth.user),
            rating,
        },
    )))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<ProfileUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let update = ProfileUpdate::from(body);
    if update.is_empty() {
        return Err(HttpError::bad_request("No valid fields to update"));
    }

    let user = app_state.db_client
        .update_profile(auth.user.id, update)
        .await?;

    Ok(Json(ApiResponse::success(
        "Profile updated",
        FilterUserDto::filter_user(&user),
    )))
}

pub async fn update_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<UserPasswordUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if body.new_password != body.new_password_confirm {
        return Err(HttpError::bad_request("New passwords do not match"));
    }

    let password_match = password::compare(&body.old_password, &auth.user.password)
        .map_err(HttpError::internal)?;

    if !password_match {
        return Err(HttpError::bad_request("Old password is incorrect".to_string()));
    }

    let hash_password = password::hash(&body.new_password)
        .map_err(HttpError::internal)?;

    app_state.db_client
        .update_user_password(auth.user.id, hash_password)
        .await?;

    Ok(Json(ApiResponse::message("Password updated Successfully")))
}

pub async fn delete_account(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<DeleteAccountDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let password_match = password::compare(&body.password, &auth.user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_match {
        return Err(HttpError::bad_request("Invalid password"));
    }

    app_state.db_client
        .delete_user(auth.user.id)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                HttpError::bad_request("Accounts with task or payment history cannot be deleted")
            }
            e => HttpError::from(e),
        })?;

    tracing::info!("User {} deleted their account", auth.user.id);

    Ok(Json(ApiResponse::message("Account deleted successfully")))
}
