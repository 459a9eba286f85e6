//! Account roles and reviewer identity.

use serde::{Deserialize, Serialize};

use crate::ids::{ReviewerId, TeacherId};

/// Closed set of account roles known to the backend.
///
/// Authorization matches on this exhaustively; there are no role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of an account attempting a review action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: ReviewerId,
    pub role: Role,
}

impl Reviewer {
    pub fn teacher(id: TeacherId) -> Self {
        Self {
            id: id.into(),
            role: Role::Teacher,
        }
    }

    pub fn admin(id: ReviewerId) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Teacher"), Some(Role::Teacher));
        assert_eq!(Role::parse(" admin "), Some(Role::Admin));
        assert_eq!(Role::parse("dean"), None);
    }

    #[test]
    fn test_reviewer_constructors() {
        let teacher = Reviewer::teacher(TeacherId(7));
        assert_eq!(teacher.role, Role::Teacher);
        assert_eq!(teacher.id.value(), 7);

        let admin = Reviewer::admin(ReviewerId(1));
        assert_eq!(admin.role, Role::Admin);
    }
}
