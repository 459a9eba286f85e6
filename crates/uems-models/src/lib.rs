//! Shared data models for the UEMS backend.
//!
//! This crate provides Serde-serializable types for:
//! - Student profiles and partial profile patches
//! - Profile update requests and their review lifecycle
//! - Account roles and reviewer identity
//! - Directory records (students, teachers)

pub mod directory;
pub mod ids;
pub mod profile;
pub mod request;
pub mod role;

// Re-export common types
pub use directory::{StudentRecord, TeacherRecord};
pub use ids::{RequestId, ReviewerId, StudentId, TeacherId};
pub use profile::{Profile, ProfilePatch};
pub use request::{InvalidStatus, RequestState, ReviewRecord, StatusFilter, UpdateRequest};
pub use role::{Reviewer, Role};
