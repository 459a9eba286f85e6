//! Teacher review handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use uems_models::{RequestId, Reviewer, StatusFilter, TeacherId, UpdateRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Review queue query parameters.
#[derive(Deserialize)]
pub struct QueueQuery {
    pub status: Option<String>,
}

/// Review decision body. The comment is optional on approval and
/// mandatory on rejection.
#[derive(Deserialize, Default)]
pub struct ReviewBody {
    #[serde(default)]
    pub comment: Option<String>,
}

pub(crate) fn parse_status(raw: Option<String>) -> ApiResult<Option<StatusFilter>> {
    match raw {
        None => Ok(None),
        Some(s) => StatusFilter::parse(&s)
            .map(Some)
            .map_err(|e| ApiError::bad_request(e.to_string())),
    }
}

/// Requests awaiting this teacher, optionally filtered by status.
pub async fn review_queue(
    State(state): State<AppState>,
    Path(teacher_id): Path<u64>,
    Query(query): Query<QueueQuery>,
) -> ApiResult<Json<Vec<UpdateRequest>>> {
    let status = parse_status(query.status)?;
    let queue = state
        .workflow
        .review_queue(TeacherId(teacher_id), status)
        .await?;
    Ok(Json(queue))
}

/// Approve a pending request, applying its fields to the profile.
pub async fn approve_request(
    State(state): State<AppState>,
    Path((teacher_id, request_id)): Path<(u64, String)>,
    body: Option<Json<ReviewBody>>,
) -> ApiResult<Json<bool>> {
    let comment = body.and_then(|Json(b)| b.comment);
    let done = state
        .workflow
        .review(
            &RequestId::from_string(request_id),
            Reviewer::teacher(TeacherId(teacher_id)),
            true,
            comment,
        )
        .await?;
    Ok(Json(done))
}

/// Reject a pending request with a mandatory comment.
pub async fn reject_request(
    State(state): State<AppState>,
    Path((teacher_id, request_id)): Path<(u64, String)>,
    body: Option<Json<ReviewBody>>,
) -> ApiResult<Json<bool>> {
    let comment = body.and_then(|Json(b)| b.comment);
    let done = state
        .workflow
        .review(
            &RequestId::from_string(request_id),
            Reviewer::teacher(TeacherId(teacher_id)),
            false,
            comment,
        )
        .await?;
    Ok(Json(done))
}
