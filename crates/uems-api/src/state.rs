//! Shared application state.

use std::sync::Arc;

use uems_store::{
    DirectoryStore, MemoryDirectoryStore, MemoryProfileStore, MemoryRequestStore, MemoryStore,
    ProfileStore, RequestStore,
};

use crate::config::ApiConfig;
use crate::services::{ApprovalWorkflow, DirectoryGate};

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub workflow: Arc<ApprovalWorkflow>,
    pub directory: Arc<dyn DirectoryStore>,
}

impl AppState {
    /// Build state backed by a fresh in-memory store.
    pub fn new(config: ApiConfig) -> Self {
        let engine = MemoryStore::new();
        let profiles: Arc<dyn ProfileStore> = Arc::new(MemoryProfileStore::new(engine.clone()));
        let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new(engine.clone()));
        let directory: Arc<dyn DirectoryStore> =
            Arc::new(MemoryDirectoryStore::new(engine));
        Self::with_stores(config, profiles, requests, directory)
    }

    /// Build state over caller-provided stores.
    pub fn with_stores(
        config: ApiConfig,
        profiles: Arc<dyn ProfileStore>,
        requests: Arc<dyn RequestStore>,
        directory: Arc<dyn DirectoryStore>,
    ) -> Self {
        let gate = Arc::new(DirectoryGate::new(
            Arc::clone(&directory),
            config.review_policy,
        ));
        let workflow = Arc::new(ApprovalWorkflow::new(
            profiles,
            requests,
            Arc::clone(&directory),
            gate,
            config.review_policy,
        ));
        Self {
            config: Arc::new(config),
            workflow,
            directory,
        }
    }
}
