//! In-memory instructor directory.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{InstructorDirectory, InstructorDirectoryError};

/// Fixed set of instructor ids, mutable for test setup.
#[derive(Default)]
pub struct InMemoryInstructorDirectory {
    instructors: Mutex<Vec<Uuid>>,
}

impl InMemoryInstructorDirectory {
    pub fn new(instructors: Vec<Uuid>) -> Self {
        Self {
            instructors: Mutex::new(instructors),
        }
    }

    /// Register one more instructor.
    pub async fn add(&self, instructor_id: Uuid) {
        self.instructors.lock().await.push(instructor_id);
    }
}

#[async_trait]
impl InstructorDirectory for InMemoryInstructorDirectory {
    async fn list_instructor_ids(&self) -> Result<Vec<Uuid>, InstructorDirectoryError> {
        Ok(self.instructors.lock().await.clone())
    }
}
