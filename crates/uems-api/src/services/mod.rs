//! Domain services behind the HTTP handlers.

pub mod gate;
pub mod workflow;

pub use gate::{AuthorizationGate, DirectoryGate, ReviewPolicy};
pub use workflow::{ApprovalWorkflow, ProfileDetail};
