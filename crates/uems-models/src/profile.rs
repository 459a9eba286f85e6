//! Student profile and the partial patch applied on approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ids::StudentId;

/// A student's canonical, currently-effective profile.
///
/// Created lazily when the first update request is approved; written only by
/// the approval path, read by everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Owning student (one profile per student).
    pub student_id: StudentId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u16>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create an empty profile for a student.
    pub fn new(student_id: StudentId) -> Self {
        let now = Utc::now();
        Self {
            student_id,
            gender: None,
            age: None,
            major: None,
            biography: None,
            graduation_year: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Proposed profile values carried by an update request.
///
/// `None` means "leave the profile field unchanged": applying a patch never
/// clears a field that the patch does not mention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProfilePatch {
    #[validate(length(min = 1, max = 16))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[validate(range(min = 14, max = 120))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[validate(length(min = 1, max = 128))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,

    #[validate(length(max = 2000))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,

    #[validate(range(min = 1950, max = 2100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u16>,
}

impl ProfilePatch {
    /// True when no field is proposed.
    pub fn is_empty(&self) -> bool {
        self.gender.is_none()
            && self.age.is_none()
            && self.major.is_none()
            && self.biography.is_none()
            && self.graduation_year.is_none()
    }

    /// Copy every present field onto the profile and bump its update time.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(gender) = &self.gender {
            profile.gender = Some(gender.clone());
        }
        if let Some(age) = self.age {
            profile.age = Some(age);
        }
        if let Some(major) = &self.major {
            profile.major = Some(major.clone());
        }
        if let Some(biography) = &self.biography {
            profile.biography = Some(biography.clone());
        }
        if let Some(year) = self.graduation_year {
            profile.graduation_year = Some(year);
        }
        profile.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(major: Option<&str>, year: Option<u16>) -> ProfilePatch {
        ProfilePatch {
            major: major.map(String::from),
            graduation_year: year,
            ..Default::default()
        }
    }

    #[test]
    fn test_patch_applies_present_fields_only() {
        let mut profile = Profile::new(StudentId(42));
        profile.biography = Some("unchanged".to_string());

        patch(Some("Physics"), Some(2025)).apply_to(&mut profile);

        assert_eq!(profile.major.as_deref(), Some("Physics"));
        assert_eq!(profile.graduation_year, Some(2025));
        assert_eq!(profile.biography.as_deref(), Some("unchanged"));
        assert_eq!(profile.gender, None);
    }

    #[test]
    fn test_patch_never_clears_fields() {
        let mut profile = Profile::new(StudentId(42));
        profile.major = Some("History".to_string());

        patch(None, Some(2026)).apply_to(&mut profile);

        assert_eq!(profile.major.as_deref(), Some("History"));
        assert_eq!(profile.graduation_year, Some(2026));
    }

    #[test]
    fn test_empty_patch_detection() {
        assert!(ProfilePatch::default().is_empty());
        assert!(!patch(Some("CS"), None).is_empty());
    }

    #[test]
    fn test_patch_validation_ranges() {
        let mut p = patch(Some("CS"), Some(2025));
        p.age = Some(20);
        assert!(p.validate().is_ok());

        p.age = Some(9);
        assert!(p.validate().is_err());

        p.age = Some(20);
        p.graduation_year = Some(1800);
        assert!(p.validate().is_err());
    }
}
