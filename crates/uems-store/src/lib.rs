//! Document store for the UEMS backend.
//!
//! This crate provides:
//! - A process-local document engine with versioned documents,
//!   compare-and-swap updates, and atomic multi-document batches
//! - Injectable store contracts consumed by the approval workflow
//!   (`ProfileStore`, `RequestStore`, `DirectoryStore`)
//! - Repository implementations backed by the engine

pub mod directory_repo;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod profile_repo;
pub mod request_repo;
pub mod traits;

pub use directory_repo::MemoryDirectoryStore;
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, Versioned, WriteOp};
pub use profile_repo::MemoryProfileStore;
pub use request_repo::MemoryRequestStore;
pub use traits::{DirectoryStore, ProfileStore, RequestStore};
