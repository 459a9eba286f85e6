//! Profile repository.

use async_trait::async_trait;
use tracing::debug;

use uems_models::{Profile, StudentId};

use crate::error::StoreResult;
use crate::memory::MemoryStore;
use crate::traits::ProfileStore;

pub(crate) const COLLECTION: &str = "profiles";

pub(crate) fn profile_key(student_id: StudentId) -> String {
    student_id.to_string()
}

/// Repository for canonical student profiles.
pub struct MemoryProfileStore {
    store: MemoryStore,
}

impl MemoryProfileStore {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, student_id: StudentId) -> StoreResult<Option<Profile>> {
        let doc = self
            .store
            .get_document::<Profile>(COLLECTION, &profile_key(student_id))
            .await?;
        Ok(doc.map(|d| d.data))
    }

    async fn save_profile(&self, profile: &Profile) -> StoreResult<()> {
        let key = profile_key(profile.student_id);
        match self.store.update_document(COLLECTION, &key, profile).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                self.store.create_document(COLLECTION, &key, profile).await?;
                debug!(student_id = %profile.student_id, "Created profile");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_profile_upserts() {
        let repo = MemoryProfileStore::new(MemoryStore::new());
        let student = StudentId(42);

        assert!(repo.get_profile(student).await.unwrap().is_none());

        let mut profile = Profile::new(student);
        profile.major = Some("Physics".to_string());
        repo.save_profile(&profile).await.unwrap();

        let stored = repo.get_profile(student).await.unwrap().unwrap();
        assert_eq!(stored.major.as_deref(), Some("Physics"));

        profile.graduation_year = Some(2025);
        repo.save_profile(&profile).await.unwrap();

        let stored = repo.get_profile(student).await.unwrap().unwrap();
        assert_eq!(stored.graduation_year, Some(2025));
    }
}
