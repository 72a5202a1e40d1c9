use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::{
        userdtos::{FilterUserDto, LoginUserDto, RegisterUserDto, UserData, UserLoginResponseDto},
        ApiResponse,
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, JWTAuthMiddeware},
    models::usermodel::{User, UserRole},
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_me).layer(middleware::from_fn(auth)))
}

fn login_response(app_state: &AppState, user: &User, status: StatusCode) -> Result<axum::response::Response, HttpError> {
    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(HttpError::internal)?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(app_state.env.jwt_maxage))
        .http_only(true)
        .build();

    let cookie_header = HeaderValue::from_str(&cookie.to_string())
        .map_err(HttpError::internal)?;

    let mut response = (
        status,
        Json(UserLoginResponseDto {
            status: "success".to_string(),
            token,
            user: FilterUserDto::filter_user(user),
        }),
    )
        .into_response();

    response.headers_mut().append(header::SET_COOKIE, cookie_header);

    Ok(response)
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if body.password != body.password_confirm {
        return Err(HttpError::bad_request("Passwords do not match"));
    }

    let existing_user = app_state.db_client
        .get_user(None, Some(&body.email))
        .await?;

    if existing_user.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
    }

    let hashed_password = password::hash(&body.password)
        .map_err(HttpError::internal)?;

    let role = body.role.unwrap_or(UserRole::Worker);

    let user = app_state.db_client
        .save_user(body.name, body.email, hashed_password, role)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                HttpError::bad_request(ErrorMessage::EmailExist.to_string())
            }
            e => HttpError::from(e),
        })?;

    let user = match body.phone {
        Some(phone) => app_state.db_client
            .update_profile(
                user.id,
                crate::db::userdb::ProfileUpdate {
                    phone: Some(phone),
                    ..Default::default()
                },
            )
            .await?,
        None => user,
    };

    tracing::info!("Registered {} user {}", user.role.to_str(), user.id);

    login_response(&app_state, &user, StatusCode::CREATED)
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state.db_client
        .get_user(None, Some(&body.email))
        .await?
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }

    login_response(&app_state, &user, StatusCode::OK)
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(ApiResponse::success(
        "Current user",
        UserData {
            user: FilterUserDto::filter_user(&user.user),
        },
    )))
}
