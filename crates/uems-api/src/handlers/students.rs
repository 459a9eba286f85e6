//! Student-facing profile request handlers.
//!
//! The submit/amend/withdraw body is the set of optional profile fields;
//! absent fields are left untouched on approval.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use uems_models::{ProfilePatch, RequestId, StudentId, UpdateRequest};

use crate::error::ApiResult;
use crate::services::ProfileDetail;
use crate::state::AppState;

/// Submit a new profile update request.
pub async fn submit_request(
    State(state): State<AppState>,
    Path(student_id): Path<u64>,
    Json(body): Json<ProfilePatch>,
) -> ApiResult<(StatusCode, Json<UpdateRequest>)> {
    let request = state.workflow.submit(StudentId(student_id), body).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Replace the proposed fields of a still-pending request.
pub async fn amend_request(
    State(state): State<AppState>,
    Path((student_id, request_id)): Path<(u64, String)>,
    Json(body): Json<ProfilePatch>,
) -> ApiResult<Json<bool>> {
    let done = state
        .workflow
        .amend(
            &RequestId::from_string(request_id),
            StudentId(student_id),
            body,
        )
        .await?;
    Ok(Json(done))
}

/// Withdraw a still-pending request.
pub async fn withdraw_request(
    State(state): State<AppState>,
    Path((student_id, request_id)): Path<(u64, String)>,
) -> ApiResult<Json<bool>> {
    let done = state
        .workflow
        .withdraw(&RequestId::from_string(request_id), StudentId(student_id))
        .await?;
    Ok(Json(done))
}

/// A student's request history, most recent first.
pub async fn list_student_requests(
    State(state): State<AppState>,
    Path(student_id): Path<u64>,
) -> ApiResult<Json<Vec<UpdateRequest>>> {
    let requests = state.workflow.student_requests(StudentId(student_id)).await?;
    Ok(Json(requests))
}

/// A student's profile together with their request activity.
pub async fn get_profile_detail(
    State(state): State<AppState>,
    Path(student_id): Path<u64>,
) -> ApiResult<Json<ProfileDetail>> {
    let detail = state.workflow.profile_detail(StudentId(student_id)).await?;
    Ok(Json(detail))
}
