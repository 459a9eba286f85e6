//! Injectable persistence contracts consumed by the approval workflow.

use async_trait::async_trait;

use uems_models::{
    Profile, RequestId, StatusFilter, StudentId, StudentRecord, TeacherId, TeacherRecord,
    UpdateRequest,
};

use crate::error::StoreResult;
use crate::memory::Versioned;

/// Persistence for canonical student profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, student_id: StudentId) -> StoreResult<Option<Profile>>;

    /// Upsert by student id.
    async fn save_profile(&self, profile: &Profile) -> StoreResult<()>;
}

/// Persistence for profile update requests.
///
/// Reads hand back a [`Versioned`] request; mutating operations take the
/// version observed at read as a compare-and-swap expectation, so concurrent
/// amend/review attempts resolve to exactly one winner.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn get(&self, id: &RequestId) -> StoreResult<Option<Versioned<UpdateRequest>>>;

    async fn find_pending_by_student(
        &self,
        student_id: StudentId,
    ) -> StoreResult<Option<Versioned<UpdateRequest>>>;

    /// All requests of one student, most recently created first.
    async fn list_by_student(&self, student_id: StudentId) -> StoreResult<Vec<UpdateRequest>>;

    /// All requests, optionally filtered by status, most recently created
    /// first.
    async fn list_by_status(
        &self,
        status: Option<StatusFilter>,
    ) -> StoreResult<Vec<UpdateRequest>>;

    /// Persist a new pending request while reserving its student's pending
    /// slot. At most one pending request can exist per student: when the
    /// slot is taken this fails with `AlreadyExists` and nothing is written.
    async fn create_pending(&self, request: &UpdateRequest) -> StoreResult<()>;

    /// Replace a pending request's content (amendment).
    async fn update(&self, request: &UpdateRequest, expected_version: u64) -> StoreResult<()>;

    /// Commit a review in one atomic unit: transition the request to its
    /// terminal state, release the student's pending slot and, on approval,
    /// upsert the patched profile. Either all of it becomes visible or none
    /// of it does.
    async fn finalize_review(
        &self,
        request: &UpdateRequest,
        profile: Option<&Profile>,
        expected_version: u64,
    ) -> StoreResult<()>;

    /// Delete a request (withdrawal or administrative removal), releasing
    /// the pending slot when the stored request was still pending. Pass the
    /// observed version for optimistic deletion, `None` for unconditional.
    async fn remove(&self, id: &RequestId, expected_version: Option<u64>) -> StoreResult<()>;
}

/// Account directory: students, teachers and their assignment.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn create_student(&self, student: &StudentRecord) -> StoreResult<()>;
    async fn get_student(&self, id: StudentId) -> StoreResult<Option<StudentRecord>>;
    async fn list_students(&self) -> StoreResult<Vec<StudentRecord>>;

    async fn create_teacher(&self, teacher: &TeacherRecord) -> StoreResult<()>;
    async fn get_teacher(&self, id: TeacherId) -> StoreResult<Option<TeacherRecord>>;
    async fn list_teachers(&self) -> StoreResult<Vec<TeacherRecord>>;
}
