//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Version conflict: {collection}/{id}")]
    VersionConflict { collection: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn already_exists(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn version_conflict(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::VersionConflict {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// True if the error was caused by a compare-and-swap losing a race.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}
