use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::taskdb::{self, TaskExt, TaskListingExt},
    dtos::{
        taskdtos::{CreateTaskDto, ReviewTaskDto, SubmissionResponse},
        ApiResponse,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        taskmodel::{TaskDetail, TaskStatus},
        usermodel::UserRole,
    },
    service::error::ServiceError,
    utils::uploads,
    AppState,
};

pub fn tasks_handler() -> Router {
    Router::new()
        .route("/", post(create_task))
        .route(
            "/available",
            get(get_available_tasks).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Worker])
            })),
        )
        .route(
            "/my-tasks",
            get(get_my_tasks).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Worker])
            })),
        )
        .route(
            "/pending/review",
            get(get_pending_review).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
        .route("/:task_id", get(get_task))
        .route("/:task_id/assign", post(accept_task))
        .route(
            "/:task_id/submit",
            post(submit_task).layer(DefaultBodyLimit::max(uploads::MAX_SUBMISSION_BODY)),
        )
        .route("/:task_id/review", post(review_task))
}

pub async fn get_available_tasks(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let tasks = app_state.db_client
        .list_available_tasks(taskdb::today())
        .await?;

    Ok(Json(ApiResponse::success("Available tasks retrieved", tasks)))
}

pub async fn get_my_tasks(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let tasks = app_state.db_client
        .list_worker_tasks(auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Your tasks retrieved", tasks)))
}

pub async fn get_pending_review(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let tasks = app_state.db_client
        .list_pending_review()
        .await?;

    Ok(Json(ApiResponse::success("Tasks pending review retrieved", tasks)))
}

pub async fn get_task(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let caller = auth.caller();

    // Workers only see open tasks and their own.
    let listing = app_state.db_client
        .get_task_listing(task_id)
        .await?
        .filter(|listing| {
            caller.is_admin()
                || listing.task.status == TaskStatus::Available
                || listing.task.worker_id == Some(caller.user_id)
        })
        .ok_or_else(|| HttpError::from(ServiceError::task_not_found()))?;

    let files = app_state.db_client
        .get_task_files(task_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Task retrieved",
        TaskDetail { listing, files },
    )))
}

pub async fn create_task(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTaskDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (job_id, draft) = body.into_draft();

    let task = app_state.task_service
        .create_task(&auth.caller(), job_id, draft)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Task created successfully", task)),
    ))
}

pub async fn accept_task(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let task = app_state.task_service
        .accept(&auth.caller(), task_id)
        .await
        .map_err(|e| {
            if matches!(e, ServiceError::QuotaExceeded { .. } | ServiceError::Conflict(_)) {
                tracing::warn!("Worker {} could not take task {}: {}", auth.user.id, task_id, e);
            }
            HttpError::from(e)
        })?;

    Ok(Json(ApiResponse::success("Task assigned successfully", task)))
}

pub async fn submit_task(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let form = uploads::read_submission(multipart, &app_state.env.uploads_dir).await?;
    let written = uploads::paths_of(&form.files);

    let result = app_state.task_service
        .submit(&auth.caller(), task_id, form.submission_data, form.files)
        .await;

    let (task, files) = match result {
        Ok(submitted) => submitted,
        Err(e) => {
            uploads::discard(&written).await;
            return Err(e.into());
        }
    };

    Ok(Json(ApiResponse::success(
        "Task submitted successfully",
        SubmissionResponse { task, files },
    )))
}

pub async fn review_task(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<ReviewTaskDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = app_state.task_service
        .review(&auth.caller(), task_id, body.into())
        .await?;

    let message = format!("Task {} successfully", outcome.task.status);

    Ok(Json(ApiResponse::success(&message, outcome)))
}
