//! Account directory repository.

use async_trait::async_trait;
use tracing::info;

use uems_models::{StudentId, StudentRecord, TeacherId, TeacherRecord};

use crate::error::StoreResult;
use crate::memory::MemoryStore;
use crate::traits::DirectoryStore;

const STUDENTS: &str = "students";
const TEACHERS: &str = "teachers";

/// Repository for student and teacher accounts.
pub struct MemoryDirectoryStore {
    store: MemoryStore,
}

impl MemoryDirectoryStore {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn create_student(&self, student: &StudentRecord) -> StoreResult<()> {
        self.store
            .create_document(STUDENTS, &student.id.to_string(), student)
            .await?;
        info!(student_id = %student.id, "Registered student");
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> StoreResult<Option<StudentRecord>> {
        let doc = self
            .store
            .get_document::<StudentRecord>(STUDENTS, &id.to_string())
            .await?;
        Ok(doc.map(|d| d.data))
    }

    async fn list_students(&self) -> StoreResult<Vec<StudentRecord>> {
        let docs = self.store.list_documents::<StudentRecord>(STUDENTS).await?;
        let mut students: Vec<StudentRecord> = docs.into_iter().map(|d| d.data).collect();
        students.sort_by_key(|s| s.id);
        Ok(students)
    }

    async fn create_teacher(&self, teacher: &TeacherRecord) -> StoreResult<()> {
        self.store
            .create_document(TEACHERS, &teacher.id.to_string(), teacher)
            .await?;
        info!(teacher_id = %teacher.id, "Registered teacher");
        Ok(())
    }

    async fn get_teacher(&self, id: TeacherId) -> StoreResult<Option<TeacherRecord>> {
        let doc = self
            .store
            .get_document::<TeacherRecord>(TEACHERS, &id.to_string())
            .await?;
        Ok(doc.map(|d| d.data))
    }

    async fn list_teachers(&self) -> StoreResult<Vec<TeacherRecord>> {
        let docs = self.store.list_documents::<TeacherRecord>(TEACHERS).await?;
        let mut teachers: Vec<TeacherRecord> = docs.into_iter().map(|d| d.data).collect();
        teachers.sort_by_key(|t| t.id);
        Ok(teachers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_registration_fails() {
        let repo = MemoryDirectoryStore::new(MemoryStore::new());
        let student = StudentRecord::new(StudentId(42), "Alex Chen", Some(TeacherId(7)));

        repo.create_student(&student).await.unwrap();
        let err = repo.create_student(&student).await.unwrap_err();
        assert!(err.is_already_exists());

        let found = repo.get_student(StudentId(42)).await.unwrap().unwrap();
        assert_eq!(found.name, "Alex Chen");
    }

    #[tokio::test]
    async fn test_list_sorted_by_id() {
        let repo = MemoryDirectoryStore::new(MemoryStore::new());
        repo.create_teacher(&TeacherRecord::new(TeacherId(9), "B", None))
            .await
            .unwrap();
        repo.create_teacher(&TeacherRecord::new(TeacherId(7), "A", None))
            .await
            .unwrap();

        let teachers = repo.list_teachers().await.unwrap();
        assert_eq!(teachers[0].id, TeacherId(7));
        assert_eq!(teachers[1].id, TeacherId(9));
    }
}
