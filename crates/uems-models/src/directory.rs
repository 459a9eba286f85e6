//! Account directory records.
//!
//! The directory backs student validation at submission and reviewer
//! assignment; it is read-mostly and managed through the admin surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ids::{StudentId, TeacherId};

/// A registered student account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StudentRecord {
    pub id: StudentId,

    #[validate(length(min = 1, max = 128))]
    pub name: String,

    /// Homeroom teacher responsible for reviewing this student's requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homeroom_teacher_id: Option<TeacherId>,

    pub created_at: DateTime<Utc>,
}

impl StudentRecord {
    pub fn new(
        id: StudentId,
        name: impl Into<String>,
        homeroom_teacher_id: Option<TeacherId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            homeroom_teacher_id,
            created_at: Utc::now(),
        }
    }
}

/// A registered teacher account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TeacherRecord {
    pub id: TeacherId,

    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl TeacherRecord {
    pub fn new(id: TeacherId, name: impl Into<String>, department: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            department,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_record_creation() {
        let student = StudentRecord::new(StudentId(42), "Alex Chen", Some(TeacherId(7)));
        assert_eq!(student.id, StudentId(42));
        assert_eq!(student.homeroom_teacher_id, Some(TeacherId(7)));
    }
}
