//! Update request repository.
//!
//! Uses a dual-document pattern:
//! - The request document at `profile_requests/{request_id}`
//! - A reservation marker at `pending_requests/{student_id}` held while the
//!   student has a pending request
//!
//! The marker is created and released in the same atomic batch as the
//! request writes. Creating it is what enforces the at-most-one-pending
//! invariant: of two concurrent submissions for one student, exactly one
//! batch commits and the other observes `AlreadyExists`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use uems_models::{Profile, RequestId, StatusFilter, StudentId, UpdateRequest};

use crate::error::{StoreError, StoreResult};
use crate::memory::{MemoryStore, Versioned, WriteOp};
use crate::profile_repo;
use crate::traits::RequestStore;

const REQUESTS: &str = "profile_requests";
const PENDING: &str = "pending_requests";

/// Reservation marker held while a student has a pending request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingMarker {
    request_id: RequestId,
    student_id: StudentId,
    created_at: DateTime<Utc>,
}

/// Repository for update requests (dual-document pattern).
pub struct MemoryRequestStore {
    store: MemoryStore,
}

impl MemoryRequestStore {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    fn pending_key(student_id: StudentId) -> String {
        student_id.to_string()
    }

    fn sort_most_recent_first(requests: &mut [UpdateRequest]) {
        requests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn get(&self, id: &RequestId) -> StoreResult<Option<Versioned<UpdateRequest>>> {
        self.store.get_document(REQUESTS, id.as_str()).await
    }

    async fn find_pending_by_student(
        &self,
        student_id: StudentId,
    ) -> StoreResult<Option<Versioned<UpdateRequest>>> {
        let marker = self
            .store
            .get_document::<PendingMarker>(PENDING, &Self::pending_key(student_id))
            .await?;
        match marker {
            Some(marker) => self.get(&marker.data.request_id).await,
            None => Ok(None),
        }
    }

    async fn list_by_student(&self, student_id: StudentId) -> StoreResult<Vec<UpdateRequest>> {
        let docs = self.store.list_documents::<UpdateRequest>(REQUESTS).await?;
        let mut requests: Vec<UpdateRequest> = docs
            .into_iter()
            .map(|d| d.data)
            .filter(|r| r.student_id == student_id)
            .collect();
        Self::sort_most_recent_first(&mut requests);
        Ok(requests)
    }

    async fn list_by_status(
        &self,
        status: Option<StatusFilter>,
    ) -> StoreResult<Vec<UpdateRequest>> {
        let docs = self.store.list_documents::<UpdateRequest>(REQUESTS).await?;
        let mut requests: Vec<UpdateRequest> = docs
            .into_iter()
            .map(|d| d.data)
            .filter(|r| status.map_or(true, |s| s.matches(&r.state)))
            .collect();
        Self::sort_most_recent_first(&mut requests);
        Ok(requests)
    }

    async fn create_pending(&self, request: &UpdateRequest) -> StoreResult<()> {
        if !request.is_pending() {
            return Err(StoreError::backend(
                "create_pending requires a pending request",
            ));
        }

        let marker = PendingMarker {
            request_id: request.id.clone(),
            student_id: request.student_id,
            created_at: request.created_at,
        };

        let writes = vec![
            WriteOp::create(PENDING, Self::pending_key(request.student_id), &marker)?,
            WriteOp::create(REQUESTS, request.id.as_str(), request)?,
        ];
        self.store.batch_write(writes).await?;

        info!(
            request_id = %request.id,
            student_id = %request.student_id,
            "Created pending update request (atomic)"
        );
        Ok(())
    }

    async fn update(&self, request: &UpdateRequest, expected_version: u64) -> StoreResult<()> {
        self.store
            .update_document_with_version(REQUESTS, request.id.as_str(), request, expected_version)
            .await?;
        debug!(request_id = %request.id, "Amended update request");
        Ok(())
    }

    async fn finalize_review(
        &self,
        request: &UpdateRequest,
        profile: Option<&Profile>,
        expected_version: u64,
    ) -> StoreResult<()> {
        if request.is_pending() {
            return Err(StoreError::backend(
                "finalize_review requires a reviewed request",
            ));
        }

        let mut writes = Vec::with_capacity(3);
        if let Some(profile) = profile {
            writes.push(WriteOp::set(
                profile_repo::COLLECTION,
                profile_repo::profile_key(profile.student_id),
                profile,
            )?);
        }
        writes.push(WriteOp::update(
            REQUESTS,
            request.id.as_str(),
            request,
            Some(expected_version),
        )?);
        writes.push(WriteOp::delete(
            PENDING,
            Self::pending_key(request.student_id),
            None,
        ));

        self.store.batch_write(writes).await?;

        info!(
            request_id = %request.id,
            student_id = %request.student_id,
            status = %request.state,
            "Finalized review (atomic)"
        );
        Ok(())
    }

    async fn remove(&self, id: &RequestId, expected_version: Option<u64>) -> StoreResult<()> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(REQUESTS, id.as_str()))?;

        let mut writes = vec![WriteOp::delete(REQUESTS, id.as_str(), expected_version)];
        if existing.data.is_pending() {
            writes.push(WriteOp::delete(
                PENDING,
                Self::pending_key(existing.data.student_id),
                None,
            ));
        }
        self.store.batch_write(writes).await?;

        debug!(request_id = %id, "Removed update request");
        Ok(())
    }
}
