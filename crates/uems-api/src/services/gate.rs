//! Authorization gate for review actions.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use uems_models::{Reviewer, Role, TeacherId, UpdateRequest};
use uems_store::DirectoryStore;

use crate::error::ApiResult;

/// Deployment policy for who may review update requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPolicy {
    /// Only the request's assigned teacher (falling back to the student's
    /// current homeroom teacher for unassigned requests) may review.
    AssignedOnly,
    /// Any registered teacher may review.
    AnyTeacher,
}

impl ReviewPolicy {
    /// Parse from string; unknown values fall back to the strict default.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "any_teacher" => ReviewPolicy::AnyTeacher,
            _ => ReviewPolicy::AssignedOnly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewPolicy::AssignedOnly => "assigned_only",
            ReviewPolicy::AnyTeacher => "any_teacher",
        }
    }
}

/// Decides whether a reviewer may decide a given request.
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    async fn can_review(&self, reviewer: Reviewer, request: &UpdateRequest) -> ApiResult<bool>;
}

/// Gate backed by the account directory.
///
/// Admins always pass. Students never do. Teachers must exist in the
/// directory and, under the assigned-only policy, must match the request's
/// assignment (or the student's homeroom teacher when the request carries
/// none).
pub struct DirectoryGate {
    directory: Arc<dyn DirectoryStore>,
    policy: ReviewPolicy,
}

impl DirectoryGate {
    pub fn new(directory: Arc<dyn DirectoryStore>, policy: ReviewPolicy) -> Self {
        Self { directory, policy }
    }
}

#[async_trait]
impl AuthorizationGate for DirectoryGate {
    async fn can_review(&self, reviewer: Reviewer, request: &UpdateRequest) -> ApiResult<bool> {
        match reviewer.role {
            Role::Admin => Ok(true),
            Role::Student => Ok(false),
            Role::Teacher => {
                let teacher_id = TeacherId(reviewer.id.value());
                if self.directory.get_teacher(teacher_id).await?.is_none() {
                    debug!(teacher_id = %teacher_id, "Reviewer is not a registered teacher");
                    return Ok(false);
                }

                match self.policy {
                    ReviewPolicy::AnyTeacher => Ok(true),
                    ReviewPolicy::AssignedOnly => match request.assigned_teacher_id {
                        Some(assigned) => Ok(assigned == teacher_id),
                        None => {
                            let student =
                                self.directory.get_student(request.student_id).await?;
                            Ok(student.and_then(|s| s.homeroom_teacher_id) == Some(teacher_id))
                        }
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uems_models::{ProfilePatch, ReviewerId, StudentId, StudentRecord, TeacherRecord};
    use uems_store::{MemoryDirectoryStore, MemoryStore};

    async fn directory() -> Arc<dyn DirectoryStore> {
        let store = MemoryDirectoryStore::new(MemoryStore::new());
        store
            .create_teacher(&TeacherRecord::new(TeacherId(7), "Dr. Park", None))
            .await
            .unwrap();
        store
            .create_teacher(&TeacherRecord::new(TeacherId(9), "Dr. Liu", None))
            .await
            .unwrap();
        store
            .create_student(&StudentRecord::new(StudentId(42), "Alex", Some(TeacherId(7))))
            .await
            .unwrap();
        Arc::new(store)
    }

    fn request_assigned_to(teacher: Option<TeacherId>) -> UpdateRequest {
        let fields = ProfilePatch {
            major: Some("Physics".to_string()),
            ..Default::default()
        };
        UpdateRequest::new(StudentId(42), fields, teacher)
    }

    #[tokio::test]
    async fn test_assigned_only_policy() {
        let gate = DirectoryGate::new(directory().await, ReviewPolicy::AssignedOnly);
        let request = request_assigned_to(Some(TeacherId(7)));

        assert!(gate
            .can_review(Reviewer::teacher(TeacherId(7)), &request)
            .await
            .unwrap());
        assert!(!gate
            .can_review(Reviewer::teacher(TeacherId(9)), &request)
            .await
            .unwrap());
        // Unregistered teacher id never passes
        assert!(!gate
            .can_review(Reviewer::teacher(TeacherId(99)), &request)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_unassigned_request_falls_back_to_homeroom() {
        let gate = DirectoryGate::new(directory().await, ReviewPolicy::AssignedOnly);
        let request = request_assigned_to(None);

        assert!(gate
            .can_review(Reviewer::teacher(TeacherId(7)), &request)
            .await
            .unwrap());
        assert!(!gate
            .can_review(Reviewer::teacher(TeacherId(9)), &request)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_any_teacher_policy() {
        let gate = DirectoryGate::new(directory().await, ReviewPolicy::AnyTeacher);
        let request = request_assigned_to(Some(TeacherId(7)));

        assert!(gate
            .can_review(Reviewer::teacher(TeacherId(9)), &request)
            .await
            .unwrap());
        assert!(!gate
            .can_review(Reviewer::teacher(TeacherId(99)), &request)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_admins_pass_students_never() {
        let gate = DirectoryGate::new(directory().await, ReviewPolicy::AssignedOnly);
        let request = request_assigned_to(Some(TeacherId(7)));

        assert!(gate
            .can_review(Reviewer::admin(ReviewerId(1)), &request)
            .await
            .unwrap());

        let student = Reviewer {
            id: ReviewerId(42),
            role: Role::Student,
        };
        assert!(!gate.can_review(student, &request).await.unwrap());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(ReviewPolicy::parse("any_teacher"), ReviewPolicy::AnyTeacher);
        assert_eq!(ReviewPolicy::parse("ANY_TEACHER"), ReviewPolicy::AnyTeacher);
        assert_eq!(ReviewPolicy::parse("assigned_only"), ReviewPolicy::AssignedOnly);
        assert_eq!(ReviewPolicy::parse("strict"), ReviewPolicy::AssignedOnly);
    }
}
