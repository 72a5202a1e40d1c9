use std::sync::Arc;

use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        jobdb::{JobExt, JobUpdate, NewJob},
        taskdb::TaskListingExt,
    },
    dtos::{
        jobdtos::{CreateJobDto, ImportResponse, JobListResponse, UpdateJobDto},
        ApiResponse,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::{jobmodel::JobStatus, usermodel::UserRole},
    service::{error::ServiceError, task_service::ensure_admin},
    utils::{csv_import, uploads},
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", get(list_jobs).post(create_job))
        .route(
            "/:job_id",
            get(get_job).put(update_job).delete(delete_job),
        )
        .route(
            "/:job_id/stats",
            get(get_job_stats).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
        .route(
            "/:job_id/tasks",
            get(get_job_tasks).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
        .route("/:job_id/upload-tasks", post(upload_tasks))
}

pub async fn list_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.db_client
        .list_active_jobs()
        .await?;

    Ok(Json(ApiResponse::success(
        "Jobs retrieved",
        JobListResponse {
            total: jobs.len(),
            jobs,
        },
    )))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.db_client
        .get_job_listing(job_id)
        .await?
        .filter(|listing| auth.caller().is_admin() || listing.job.status == JobStatus::Active)
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    Ok(Json(ApiResponse::success("Job retrieved", job)))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_admin(&auth.caller())?;

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.db_client.create_job(NewJob::from(body)).await?;

    tracing::info!("Job {} created by {}", job.id, auth.user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Job created successfully", job)),
    ))
}

pub async fn update_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_admin(&auth.caller())?;

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let update = JobUpdate::from(body);
    if update.is_empty() {
        return Err(HttpError::bad_request("No valid fields to update"));
    }

    let job = app_state.db_client.update_job(job_id, update).await?;

    Ok(Json(ApiResponse::success("Job updated successfully", job)))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_admin(&auth.caller())?;

    app_state.db_client.delete_job(job_id).await?;

    tracing::info!("Job {} deleted by {}", job_id, auth.user.id);

    Ok(Json(ApiResponse::message("Job deleted successfully")))
}

pub async fn get_job_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let exists = app_state.db_client
        .get_job(job_id)
        .await?;

    if exists.is_none() {
        return Err(ServiceError::job_not_found().into());
    }

    let stats = app_state.db_client
        .job_stats(job_id)
        .await?;

    Ok(Json(ApiResponse::success("Job statistics retrieved", stats)))
}

pub async fn get_job_tasks(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let tasks = app_state.db_client
        .list_job_tasks(job_id)
        .await?;

    Ok(Json(ApiResponse::success("Tasks retrieved", tasks)))
}

pub async fn upload_tasks(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let caller = auth.caller();
    ensure_admin(&caller)?;

    let bytes = uploads::read_csv(multipart).await?;
    let rows = csv_import::parse_task_rows(&bytes)?;

    let report = app_state.task_service
        .import_tasks(&caller, job_id, rows)
        .await?;

    let message = format!("Successfully created {} tasks", report.created.len());

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(&message, ImportResponse::from(report))),
    ))
}
