//! Administrative handlers: full request visibility, overriding reviews,
//! and directory management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use uems_models::{
    RequestId, Reviewer, ReviewerId, StudentId, StudentRecord, TeacherId, TeacherRecord,
    UpdateRequest,
};

use crate::error::{ApiError, ApiResult};
use crate::handlers::teachers::{parse_status, QueueQuery};
use crate::state::AppState;

/// Administrative review body. Unlike the teacher endpoints the decision
/// is carried in the body, and the reviewer acts with admin authority.
#[derive(Deserialize)]
pub struct AdminReviewBody {
    pub reviewer_id: u64,
    pub approve: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateStudentBody {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub homeroom_teacher_id: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateTeacherBody {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}

/// All requests, optionally filtered by status.
pub async fn list_all_requests(
    State(state): State<AppState>,
    Query(query): Query<QueueQuery>,
) -> ApiResult<Json<Vec<UpdateRequest>>> {
    let status = parse_status(query.status)?;
    let requests = state.workflow.all_requests(status).await?;
    Ok(Json(requests))
}

/// One request by id.
pub async fn get_request_detail(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<UpdateRequest>> {
    let request = state
        .workflow
        .get_request(&RequestId::from_string(request_id))
        .await?;
    Ok(Json(request))
}

/// Remove a request regardless of its state.
pub async fn remove_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<bool>> {
    let done = state
        .workflow
        .admin_remove(&RequestId::from_string(request_id))
        .await?;
    Ok(Json(done))
}

/// Decide a request with admin authority.
pub async fn admin_review(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(body): Json<AdminReviewBody>,
) -> ApiResult<Json<bool>> {
    let done = state
        .workflow
        .review(
            &RequestId::from_string(request_id),
            Reviewer::admin(ReviewerId(body.reviewer_id)),
            body.approve,
            body.comment,
        )
        .await?;
    Ok(Json(done))
}

/// Register a student account.
pub async fn create_student(
    State(state): State<AppState>,
    Json(body): Json<CreateStudentBody>,
) -> ApiResult<(StatusCode, Json<StudentRecord>)> {
    let record = StudentRecord::new(
        StudentId(body.id),
        body.name,
        body.homeroom_teacher_id.map(TeacherId),
    );
    record
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    if let Some(teacher_id) = record.homeroom_teacher_id {
        if state.directory.get_teacher(teacher_id).await?.is_none() {
            return Err(ApiError::bad_request(format!(
                "Homeroom teacher {teacher_id} is not registered"
            )));
        }
    }

    state.directory.create_student(&record).await.map_err(|e| {
        if e.is_already_exists() {
            ApiError::bad_request(format!("Student {} is already registered", record.id))
        } else {
            ApiError::from(e)
        }
    })?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// All registered students, ordered by id.
pub async fn list_students(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StudentRecord>>> {
    let students = state.directory.list_students().await?;
    Ok(Json(students))
}

/// Register a teacher account.
pub async fn create_teacher(
    State(state): State<AppState>,
    Json(body): Json<CreateTeacherBody>,
) -> ApiResult<(StatusCode, Json<TeacherRecord>)> {
    let record = TeacherRecord::new(TeacherId(body.id), body.name, body.department);
    record
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    state.directory.create_teacher(&record).await.map_err(|e| {
        if e.is_already_exists() {
            ApiError::bad_request(format!("Teacher {} is already registered", record.id))
        } else {
            ApiError::from(e)
        }
    })?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// All registered teachers, ordered by id.
pub async fn list_teachers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TeacherRecord>>> {
    let teachers = state.directory.list_teachers().await?;
    Ok(Json(teachers))
}
