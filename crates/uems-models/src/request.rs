//! Profile update requests and their review lifecycle.
//!
//! A request starts `Pending` and moves exactly once, to `Approved` or
//! `Rejected`. Review metadata lives inside the terminal variants, so a
//! pending request carrying a reviewer cannot be constructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{RequestId, ReviewerId, StudentId, TeacherId};
use crate::profile::ProfilePatch;

/// Review metadata recorded when a request leaves the pending state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Account that performed the review.
    pub reviewer_id: ReviewerId,
    /// Reviewer's comment (defaulted on approval, mandatory on rejection).
    pub comment: String,
    /// When the review happened.
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn new(reviewer_id: ReviewerId, comment: impl Into<String>) -> Self {
        Self {
            reviewer_id,
            comment: comment.into(),
            reviewed_at: Utc::now(),
        }
    }
}

/// Lifecycle state of an update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestState {
    /// Submitted, awaiting review.
    Pending,
    /// Approved; the patch has been applied to the profile.
    Approved(ReviewRecord),
    /// Rejected; the profile was not touched.
    Rejected(ReviewRecord),
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Pending => "pending",
            RequestState::Approved(_) => "approved",
            RequestState::Rejected(_) => "rejected",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    /// Check if this is a terminal state (no further transition allowed).
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Review metadata, present exactly for terminal states.
    pub fn review(&self) -> Option<&ReviewRecord> {
        match self {
            RequestState::Pending => None,
            RequestState::Approved(review) | RequestState::Rejected(review) => Some(review),
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One proposed change to a student profile, subject to review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Unique request ID, generated at submission.
    pub id: RequestId,

    /// Owning student.
    pub student_id: StudentId,

    /// Proposed values; fields absent here leave the profile untouched.
    #[serde(flatten)]
    pub fields: ProfilePatch,

    /// Lifecycle state plus review metadata for terminal states.
    #[serde(flatten)]
    pub state: RequestState,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,

    /// Homeroom teacher captured at submission time; fixes which teacher may
    /// review under the assigned-only policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_teacher_id: Option<TeacherId>,
}

impl UpdateRequest {
    /// Create a new pending request.
    pub fn new(
        student_id: StudentId,
        fields: ProfilePatch,
        assigned_teacher_id: Option<TeacherId>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            student_id,
            fields,
            state: RequestState::Pending,
            created_at: Utc::now(),
            assigned_teacher_id,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Transition to approved. Callers must have verified the pending state.
    pub fn approved(mut self, review: ReviewRecord) -> Self {
        self.state = RequestState::Approved(review);
        self
    }

    /// Transition to rejected. Callers must have verified the pending state.
    pub fn rejected(mut self, review: ReviewRecord) -> Self {
        self.state = RequestState::Rejected(review);
        self
    }

    pub fn review(&self) -> Option<&ReviewRecord> {
        self.state.review()
    }
}

/// Status discriminant used for list filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, InvalidStatus> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(StatusFilter::Pending),
            "approved" => Ok(StatusFilter::Approved),
            "rejected" => Ok(StatusFilter::Rejected),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Pending => "pending",
            StatusFilter::Approved => "approved",
            StatusFilter::Rejected => "rejected",
        }
    }

    /// Check whether a request state falls under this filter.
    pub fn matches(&self, state: &RequestState) -> bool {
        matches!(
            (self, state),
            (StatusFilter::Pending, RequestState::Pending)
                | (StatusFilter::Approved, RequestState::Approved(_))
                | (StatusFilter::Rejected, RequestState::Rejected(_))
        )
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a status filter string is not recognized.
#[derive(Debug, thiserror::Error)]
#[error("unknown request status '{0}'")]
pub struct InvalidStatus(pub String);
