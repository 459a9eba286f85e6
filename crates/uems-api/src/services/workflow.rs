//! Profile update approval workflow.
//!
//! Submission, amendment, withdrawal, and review of profile update requests.
//! All mutations go through the injectable store contracts; the single
//! pending slot per student and the atomicity of the review commit are
//! enforced by the store, this service orders the guards and maps store
//! failures to API errors.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use uems_models::{
    Profile, ProfilePatch, RequestId, Reviewer, ReviewRecord, StatusFilter, StudentId, TeacherId,
    UpdateRequest,
};
use uems_store::{DirectoryStore, ProfileStore, RequestStore};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::gate::{AuthorizationGate, ReviewPolicy};
use crate::validation;

/// Comment recorded when an approval arrives without one.
const APPROVAL_COMMENT: &str = "Approved";

/// A student's profile together with their request activity.
#[derive(Debug, Serialize)]
pub struct ProfileDetail {
    /// Canonical profile; absent until a first request is approved.
    pub profile: Option<Profile>,
    /// The currently pending request, if any.
    pub pending_request: Option<UpdateRequest>,
    /// All requests, most recent first.
    pub history: Vec<UpdateRequest>,
}

/// The approval workflow over injectable stores.
pub struct ApprovalWorkflow {
    profiles: Arc<dyn ProfileStore>,
    requests: Arc<dyn RequestStore>,
    directory: Arc<dyn DirectoryStore>,
    gate: Arc<dyn AuthorizationGate>,
    policy: ReviewPolicy,
}

impl ApprovalWorkflow {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        requests: Arc<dyn RequestStore>,
        directory: Arc<dyn DirectoryStore>,
        gate: Arc<dyn AuthorizationGate>,
        policy: ReviewPolicy,
    ) -> Self {
        Self {
            profiles,
            requests,
            directory,
            gate,
            policy,
        }
    }

    /// Submit a new update request for a student.
    ///
    /// The student must be registered and may hold at most one pending
    /// request; the profile itself is not touched until approval.
    pub async fn submit(
        &self,
        student_id: StudentId,
        patch: ProfilePatch,
    ) -> ApiResult<UpdateRequest> {
        let student = self
            .directory
            .get_student(student_id)
            .await?
            .ok_or(ApiError::InvalidStudent(student_id))?;

        validation::validate_patch(&patch)?;

        // Friendly fast path; the reservation inside create_pending is the
        // authority when submissions race.
        if self
            .requests
            .find_pending_by_student(student_id)
            .await?
            .is_some()
        {
            return Err(ApiError::DuplicatePendingRequest(student_id));
        }

        let request = UpdateRequest::new(student_id, patch, student.homeroom_teacher_id);
        self.requests.create_pending(&request).await.map_err(|e| {
            if e.is_already_exists() {
                ApiError::DuplicatePendingRequest(student_id)
            } else {
                ApiError::from(e)
            }
        })?;

        metrics::record_request_submitted();
        Ok(request)
    }

    /// Replace the proposed fields of a still-pending request.
    pub async fn amend(
        &self,
        request_id: &RequestId,
        student_id: StudentId,
        patch: ProfilePatch,
    ) -> ApiResult<bool> {
        let stored = self
            .requests
            .get(request_id)
            .await?
            .ok_or_else(|| ApiError::RequestNotFound(request_id.clone()))?;

        if stored.data.student_id != student_id {
            return Err(ApiError::StudentMismatch {
                request_id: request_id.clone(),
                student_id,
            });
        }
        if !stored.data.is_pending() {
            return Err(ApiError::NotPending(request_id.clone()));
        }
        validation::validate_patch(&patch)?;

        let mut amended = stored.data;
        amended.fields = patch;
        self.requests.update(&amended, stored.version).await?;

        debug!(request_id = %request_id, student_id = %student_id, "Amended update request");
        Ok(true)
    }

    /// Withdraw a still-pending request, freeing the student's pending slot.
    pub async fn withdraw(&self, request_id: &RequestId, student_id: StudentId) -> ApiResult<bool> {
        let stored = self
            .requests
            .get(request_id)
            .await?
            .ok_or_else(|| ApiError::RequestNotFound(request_id.clone()))?;

        if stored.data.student_id != student_id {
            return Err(ApiError::StudentMismatch {
                request_id: request_id.clone(),
                student_id,
            });
        }
        if !stored.data.is_pending() {
            return Err(ApiError::NotPending(request_id.clone()));
        }

        self.requests
            .remove(request_id, Some(stored.version))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ApiError::RequestNotFound(request_id.clone())
                } else {
                    ApiError::from(e)
                }
            })?;

        metrics::record_request_withdrawn();
        info!(request_id = %request_id, student_id = %student_id, "Withdrew update request");
        Ok(true)
    }

    /// Decide a pending request.
    ///
    /// Approval applies the patch to the profile (created lazily) and
    /// finalizes the request in one atomic commit; rejection requires a
    /// non-blank comment and never touches the profile.
    pub async fn review(
        &self,
        request_id: &RequestId,
        reviewer: Reviewer,
        approve: bool,
        comment: Option<String>,
    ) -> ApiResult<bool> {
        let stored = self
            .requests
            .get(request_id)
            .await?
            .ok_or_else(|| ApiError::RequestNotFound(request_id.clone()))?;

        if !stored.data.is_pending() {
            return Err(ApiError::NotPending(request_id.clone()));
        }
        if !self.gate.can_review(reviewer, &stored.data).await? {
            return Err(ApiError::unauthorized(format!(
                "{} {} may not review request {}",
                reviewer.role, reviewer.id, request_id
            )));
        }

        let comment = comment
            .map(|c| validation::sanitize_comment(&c))
            .unwrap_or_default();

        if approve {
            let comment = if comment.is_empty() {
                APPROVAL_COMMENT.to_string()
            } else {
                comment
            };
            let approved = stored
                .data
                .clone()
                .approved(ReviewRecord::new(reviewer.id, comment));

            let mut profile = self
                .profiles
                .get_profile(approved.student_id)
                .await?
                .unwrap_or_else(|| Profile::new(approved.student_id));
            approved.fields.apply_to(&mut profile);

            self.requests
                .finalize_review(&approved, Some(&profile), stored.version)
                .await?;

            metrics::record_request_reviewed("approved");
            info!(
                request_id = %request_id,
                student_id = %approved.student_id,
                reviewer_id = %reviewer.id,
                "Approved update request"
            );
        } else {
            if comment.is_empty() {
                return Err(ApiError::MissingComment);
            }
            let rejected = stored
                .data
                .clone()
                .rejected(ReviewRecord::new(reviewer.id, comment));

            self.requests
                .finalize_review(&rejected, None, stored.version)
                .await?;

            metrics::record_request_reviewed("rejected");
            info!(
                request_id = %request_id,
                student_id = %rejected.student_id,
                reviewer_id = %reviewer.id,
                "Rejected update request"
            );
        }

        Ok(true)
    }

    /// A student's profile plus their pending request and full history.
    pub async fn profile_detail(&self, student_id: StudentId) -> ApiResult<ProfileDetail> {
        if self.directory.get_student(student_id).await?.is_none() {
            return Err(ApiError::InvalidStudent(student_id));
        }

        let profile = self.profiles.get_profile(student_id).await?;
        let pending_request = self
            .requests
            .find_pending_by_student(student_id)
            .await?
            .map(|v| v.data);
        let history = self.requests.list_by_student(student_id).await?;

        Ok(ProfileDetail {
            profile,
            pending_request,
            history,
        })
    }

    /// A student's request history, most recent first.
    pub async fn student_requests(&self, student_id: StudentId) -> ApiResult<Vec<UpdateRequest>> {
        if self.directory.get_student(student_id).await?.is_none() {
            return Err(ApiError::InvalidStudent(student_id));
        }
        self.requests
            .list_by_student(student_id)
            .await
            .map_err(ApiError::from)
    }

    /// Requests visible in a teacher's review queue.
    ///
    /// Assigned requests appear in their assignee's queue. Unassigned ones
    /// appear for the student's homeroom teacher under the assigned-only
    /// policy and for every teacher under the any-teacher policy.
    pub async fn review_queue(
        &self,
        teacher_id: TeacherId,
        status: Option<StatusFilter>,
    ) -> ApiResult<Vec<UpdateRequest>> {
        if self.directory.get_teacher(teacher_id).await?.is_none() {
            return Err(ApiError::not_found(format!(
                "Teacher {teacher_id} is not registered"
            )));
        }

        let all = self.requests.list_by_status(status).await?;
        let mut queue = Vec::new();
        for request in all {
            let visible = match request.assigned_teacher_id {
                Some(assigned) => assigned == teacher_id,
                None => match self.policy {
                    ReviewPolicy::AnyTeacher => true,
                    ReviewPolicy::AssignedOnly => {
                        let student = self.directory.get_student(request.student_id).await?;
                        student.and_then(|s| s.homeroom_teacher_id) == Some(teacher_id)
                    }
                },
            };
            if visible {
                queue.push(request);
            }
        }
        Ok(queue)
    }

    /// All requests, optionally filtered by status, most recent first.
    pub async fn all_requests(
        &self,
        status: Option<StatusFilter>,
    ) -> ApiResult<Vec<UpdateRequest>> {
        self.requests
            .list_by_status(status)
            .await
            .map_err(ApiError::from)
    }

    /// Look up a single request.
    pub async fn get_request(&self, request_id: &RequestId) -> ApiResult<UpdateRequest> {
        self.requests
            .get(request_id)
            .await?
            .map(|v| v.data)
            .ok_or_else(|| ApiError::RequestNotFound(request_id.clone()))
    }

    /// Administrative removal, regardless of state.
    pub async fn admin_remove(&self, request_id: &RequestId) -> ApiResult<bool> {
        let stored = self
            .requests
            .get(request_id)
            .await?
            .ok_or_else(|| ApiError::RequestNotFound(request_id.clone()))?;

        self.requests
            .remove(request_id, Some(stored.version))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ApiError::RequestNotFound(request_id.clone())
                } else {
                    ApiError::from(e)
                }
            })?;

        info!(request_id = %request_id, "Administratively removed update request");
        Ok(true)
    }
}
