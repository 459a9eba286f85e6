//! In-memory document engine.
//!
//! Process-local store with the transactional surface of a document
//! database:
//! - Versioned documents (version 1 on create, +1 per write)
//! - Compare-and-swap updates against an expected version
//! - All-or-nothing batch writes across collections
//!
//! Every batch validates all of its preconditions under the single writer
//! lock before applying anything, so a failed batch leaves no partial state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::metrics::{record_conflict, record_op};

// =============================================================================
// Documents
// =============================================================================

/// A document read together with its version.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    data: Value,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

type Collection = HashMap<String, StoredDocument>;

// =============================================================================
// Write operations
// =============================================================================

/// One write inside an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert a new document; the batch fails if it already exists.
    Create {
        collection: String,
        doc_id: String,
        data: Value,
    },
    /// Create or replace a document unconditionally.
    Set {
        collection: String,
        doc_id: String,
        data: Value,
    },
    /// Replace an existing document, optionally only at an expected version.
    Update {
        collection: String,
        doc_id: String,
        data: Value,
        expected_version: Option<u64>,
    },
    /// Delete a document. Without an expected version a missing document is
    /// tolerated; with one, the version must match.
    Delete {
        collection: String,
        doc_id: String,
        expected_version: Option<u64>,
    },
}

impl WriteOp {
    pub fn create<T: Serialize>(
        collection: impl Into<String>,
        doc_id: impl Into<String>,
        data: &T,
    ) -> StoreResult<Self> {
        Ok(Self::Create {
            collection: collection.into(),
            doc_id: doc_id.into(),
            data: serde_json::to_value(data)?,
        })
    }

    pub fn set<T: Serialize>(
        collection: impl Into<String>,
        doc_id: impl Into<String>,
        data: &T,
    ) -> StoreResult<Self> {
        Ok(Self::Set {
            collection: collection.into(),
            doc_id: doc_id.into(),
            data: serde_json::to_value(data)?,
        })
    }

    pub fn update<T: Serialize>(
        collection: impl Into<String>,
        doc_id: impl Into<String>,
        data: &T,
        expected_version: Option<u64>,
    ) -> StoreResult<Self> {
        Ok(Self::Update {
            collection: collection.into(),
            doc_id: doc_id.into(),
            data: serde_json::to_value(data)?,
            expected_version,
        })
    }

    pub fn delete(
        collection: impl Into<String>,
        doc_id: impl Into<String>,
        expected_version: Option<u64>,
    ) -> Self {
        Self::Delete {
            collection: collection.into(),
            doc_id: doc_id.into(),
            expected_version,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Process-local versioned document store.
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            collections: Arc::clone(&self.collections),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Get a document with its current version.
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> StoreResult<Option<Versioned<T>>> {
        record_op("get_document");
        let collections = self.collections.read().await;
        match collections.get(collection).and_then(|c| c.get(doc_id)) {
            Some(doc) => {
                let data: T = serde_json::from_value(doc.data.clone())?;
                Ok(Some(Versioned {
                    data,
                    version: doc.version,
                }))
            }
            None => Ok(None),
        }
    }

    /// Create a document. Fails with `AlreadyExists` if the id is taken.
    pub async fn create_document<T: Serialize>(
        &self,
        collection: &str,
        doc_id: &str,
        data: &T,
    ) -> StoreResult<u64> {
        record_op("create_document");
        let value = serde_json::to_value(data)?;
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();

        if entries.contains_key(doc_id) {
            record_conflict(collection);
            return Err(StoreError::already_exists(collection, doc_id));
        }

        let now = Utc::now();
        entries.insert(
            doc_id.to_string(),
            StoredDocument {
                data: value,
                version: 1,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(1)
    }

    /// Replace an existing document, bumping its version.
    pub async fn update_document<T: Serialize>(
        &self,
        collection: &str,
        doc_id: &str,
        data: &T,
    ) -> StoreResult<u64> {
        record_op("update_document");
        let value = serde_json::to_value(data)?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(doc_id))
            .ok_or_else(|| StoreError::not_found(collection, doc_id))?;

        doc.data = value;
        doc.version += 1;
        doc.updated_at = Utc::now();
        Ok(doc.version)
    }

    /// Replace an existing document only if its version matches.
    ///
    /// This is the compare-and-swap primitive backing optimistic updates:
    /// readers take the version from [`Versioned`], writers hand it back here
    /// and lose with `VersionConflict` when someone else wrote in between.
    pub async fn update_document_with_version<T: Serialize>(
        &self,
        collection: &str,
        doc_id: &str,
        data: &T,
        expected_version: u64,
    ) -> StoreResult<u64> {
        record_op("update_document_with_version");
        let value = serde_json::to_value(data)?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(doc_id))
            .ok_or_else(|| StoreError::not_found(collection, doc_id))?;

        if doc.version != expected_version {
            record_conflict(collection);
            return Err(StoreError::version_conflict(collection, doc_id));
        }

        doc.data = value;
        doc.version += 1;
        doc.updated_at = Utc::now();
        Ok(doc.version)
    }

    /// Delete a document (idempotent: a missing document is not an error).
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> StoreResult<()> {
        record_op("delete_document");
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .and_then(|c| c.remove(doc_id));
        if removed.is_none() {
            debug!("Document {}/{} already deleted (idempotent)", collection, doc_id);
        }
        Ok(())
    }

    /// List all documents in a collection.
    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> StoreResult<Vec<Versioned<T>>> {
        record_op("list_documents");
        let collections = self.collections.read().await;
        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut out = Vec::with_capacity(entries.len());
        for doc in entries.values() {
            let data: T = serde_json::from_value(doc.data.clone())?;
            out.push(Versioned {
                data,
                version: doc.version,
            });
        }
        Ok(out)
    }

    /// Count documents in a collection.
    pub async fn count_documents(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, |c| c.len())
    }

    // =========================================================================
    // Batch Operations
    // =========================================================================

    /// Execute a batch write (atomic multi-document operation).
    ///
    /// All preconditions are validated under the writer lock before anything
    /// is applied; on the first violation the batch returns that error and
    /// no document changes. This is the unit the repositories build the
    /// single-pending reservation and the review finalization on.
    pub async fn batch_write(&self, writes: Vec<WriteOp>) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }
        record_op("batch_write");

        let mut collections = self.collections.write().await;

        for write in &writes {
            match write {
                WriteOp::Create {
                    collection, doc_id, ..
                } => {
                    let exists = collections
                        .get(collection)
                        .is_some_and(|c| c.contains_key(doc_id));
                    if exists {
                        record_conflict(collection);
                        return Err(StoreError::already_exists(collection, doc_id));
                    }
                }
                WriteOp::Set { .. } => {}
                WriteOp::Update {
                    collection,
                    doc_id,
                    expected_version,
                    ..
                } => {
                    let Some(doc) = collections.get(collection).and_then(|c| c.get(doc_id)) else {
                        return Err(StoreError::not_found(collection, doc_id));
                    };
                    if let Some(expected) = expected_version {
                        if doc.version != *expected {
                            record_conflict(collection);
                            return Err(StoreError::version_conflict(collection, doc_id));
                        }
                    }
                }
                WriteOp::Delete {
                    collection,
                    doc_id,
                    expected_version,
                } => {
                    let doc = collections.get(collection).and_then(|c| c.get(doc_id));
                    match (doc, expected_version) {
                        (Some(doc), Some(expected)) if doc.version != *expected => {
                            record_conflict(collection);
                            return Err(StoreError::version_conflict(collection, doc_id));
                        }
                        (None, Some(_)) => {
                            return Err(StoreError::not_found(collection, doc_id));
                        }
                        _ => {}
                    }
                }
            }
        }

        let now = Utc::now();
        for write in writes {
            match write {
                WriteOp::Create {
                    collection,
                    doc_id,
                    data,
                } => {
                    collections.entry(collection).or_default().insert(
                        doc_id,
                        StoredDocument {
                            data,
                            version: 1,
                            created_at: now,
                            updated_at: now,
                        },
                    );
                }
                WriteOp::Set {
                    collection,
                    doc_id,
                    data,
                } => {
                    let entries = collections.entry(collection).or_default();
                    match entries.get_mut(&doc_id) {
                        Some(doc) => {
                            doc.data = data;
                            doc.version += 1;
                            doc.updated_at = now;
                        }
                        None => {
                            entries.insert(
                                doc_id,
                                StoredDocument {
                                    data,
                                    version: 1,
                                    created_at: now,
                                    updated_at: now,
                                },
                            );
                        }
                    }
                }
                WriteOp::Update {
                    collection,
                    doc_id,
                    data,
                    ..
                } => {
                    // Existence validated above.
                    if let Some(doc) = collections
                        .get_mut(&collection)
                        .and_then(|c| c.get_mut(&doc_id))
                    {
                        doc.data = data;
                        doc.version += 1;
                        doc.updated_at = now;
                    }
                }
                WriteOp::Delete {
                    collection, doc_id, ..
                } => {
                    if let Some(entries) = collections.get_mut(&collection) {
                        entries.remove(&doc_id);
                    }
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    fn doc(name: &str, count: u32) -> Doc {
        Doc {
            name: name.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn test_create_get_update_versions() {
        let store = MemoryStore::new();

        let v1 = store.create_document("docs", "a", &doc("one", 1)).await.unwrap();
        assert_eq!(v1, 1);

        let read: Versioned<Doc> = store.get_document("docs", "a").await.unwrap().unwrap();
        assert_eq!(read.version, 1);
        assert_eq!(read.data, doc("one", 1));

        let v2 = store.update_document("docs", "a", &doc("one", 2)).await.unwrap();
        assert_eq!(v2, 2);
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let store = MemoryStore::new();
        store.create_document("docs", "a", &doc("one", 1)).await.unwrap();

        let err = store.create_document("docs", "a", &doc("two", 2)).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_cas_update_rejects_stale_version() {
        let store = MemoryStore::new();
        store.create_document("docs", "a", &doc("one", 1)).await.unwrap();
        store.update_document("docs", "a", &doc("one", 2)).await.unwrap();

        let err = store
            .update_document_with_version("docs", "a", &doc("stale", 0), 1)
            .await
            .unwrap_err();
        assert!(err.is_version_conflict());

        // The stale write must not have landed.
        let read: Versioned<Doc> = store.get_document("docs", "a").await.unwrap().unwrap();
        assert_eq!(read.data.count, 2);
        assert_eq!(read.version, 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.create_document("docs", "a", &doc("one", 1)).await.unwrap();
        store.delete_document("docs", "a").await.unwrap();
        store.delete_document("docs", "a").await.unwrap();

        let read: Option<Versioned<Doc>> = store.get_document("docs", "a").await.unwrap();
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn test_batch_write_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.create_document("docs", "taken", &doc("existing", 1)).await.unwrap();

        let writes = vec![
            WriteOp::create("docs", "fresh", &doc("fresh", 1)).unwrap(),
            WriteOp::create("docs", "taken", &doc("dup", 1)).unwrap(),
        ];
        let err = store.batch_write(writes).await.unwrap_err();
        assert!(err.is_already_exists());

        // The first write of the failed batch must not be visible.
        let read: Option<Versioned<Doc>> = store.get_document("docs", "fresh").await.unwrap();
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn test_batch_update_with_version_precondition() {
        let store = MemoryStore::new();
        store.create_document("docs", "a", &doc("one", 1)).await.unwrap();
        store.create_document("docs", "b", &doc("two", 1)).await.unwrap();
        store.update_document("docs", "b", &doc("two", 2)).await.unwrap();

        let writes = vec![
            WriteOp::update("docs", "a", &doc("one", 9), Some(1)).unwrap(),
            WriteOp::update("docs", "b", &doc("two", 9), Some(1)).unwrap(),
        ];
        let err = store.batch_write(writes).await.unwrap_err();
        assert!(err.is_version_conflict());

        let read: Versioned<Doc> = store.get_document("docs", "a").await.unwrap().unwrap();
        assert_eq!(read.data.count, 1, "failed batch must not touch other documents");
    }

    #[tokio::test]
    async fn test_batch_set_upserts_across_collections() {
        let store = MemoryStore::new();
        store.create_document("left", "a", &doc("left", 1)).await.unwrap();

        let writes = vec![
            WriteOp::set("left", "a", &doc("left", 2)).unwrap(),
            WriteOp::set("right", "b", &doc("right", 1)).unwrap(),
            WriteOp::delete("gone", "missing", None),
        ];
        store.batch_write(writes).await.unwrap();

        let left: Versioned<Doc> = store.get_document("left", "a").await.unwrap().unwrap();
        assert_eq!(left.version, 2);
        let right: Versioned<Doc> = store.get_document("right", "b").await.unwrap().unwrap();
        assert_eq!(right.version, 1);
    }
}
