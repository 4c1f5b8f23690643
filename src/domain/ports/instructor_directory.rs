//! Port for listing the instructors the scheduler generates slots for.
//!
//! Identity records live with the external identity collaborator; the
//! core only needs the opaque ids of active instructors.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Error;

/// Errors raised by instructor directory adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstructorDirectoryError {
    /// Directory backend unavailable.
    #[error("instructor directory connection failed: {message}")]
    Connection { message: String },
    /// Lookup failed during execution.
    #[error("instructor directory query failed: {message}")]
    Query { message: String },
}

impl InstructorDirectoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

impl From<InstructorDirectoryError> for Error {
    fn from(error: InstructorDirectoryError) -> Self {
        match error {
            InstructorDirectoryError::Connection { message } => {
                Error::service_unavailable(format!("instructor directory unavailable: {message}"))
            }
            InstructorDirectoryError::Query { message } => {
                Error::internal(format!("instructor directory error: {message}"))
            }
        }
    }
}

/// Read port over the identity collaborator's instructor records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstructorDirectory: Send + Sync {
    /// Ids of every instructor to schedule for.
    async fn list_instructor_ids(&self) -> Result<Vec<Uuid>, InstructorDirectoryError>;
}
