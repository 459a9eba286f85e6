//! Input validation and sanitization for request payloads.

use uems_models::ProfilePatch;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

/// Maximum review comment length.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Check a proposed patch: it must name at least one field, and every named
/// field must pass the model-level range/length rules.
pub fn validate_patch(patch: &ProfilePatch) -> ApiResult<()> {
    if patch.is_empty() {
        return Err(ApiError::validation(
            "at least one profile field must be provided",
        ));
    }
    patch
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))
}

/// Sanitize a reviewer comment for storage: strip control characters (keeping
/// newlines and tabs), trim surrounding whitespace, cap the length.
pub fn sanitize_comment(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(MAX_COMMENT_LENGTH)
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch_rejected() {
        let err = validate_patch(&ProfilePatch::default()).unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn test_out_of_range_patch_rejected() {
        let patch = ProfilePatch {
            age: Some(7),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());

        let patch = ProfilePatch {
            major: Some("Physics".to_string()),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_ok());
    }

    #[test]
    fn test_sanitize_comment() {
        assert_eq!(sanitize_comment("  looks good  "), "looks good");
        assert_eq!(sanitize_comment("line1\nline2\x07"), "line1\nline2");
        assert_eq!(sanitize_comment("\t \n"), "");

        let long = "x".repeat(MAX_COMMENT_LENGTH + 50);
        assert_eq!(sanitize_comment(&long).len(), MAX_COMMENT_LENGTH);
    }
}
