//! Port for slot persistence with conditional state transitions.
//!
//! The conditional operations (`book`, `release`, `cancel`,
//! `record_exam_result`, `record_rating`) are the concurrency boundary of
//! the whole system: each one must check its precondition and apply the
//! write atomically. An adapter that reads status and writes in two
//! unguarded steps is incorrect, not merely slow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Error, ExamResult, Slot, SlotKind, SlotStatus};

/// Errors raised by slot repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotRepositoryError {
    /// Store connectivity failure; retryable by periodic jobs.
    #[error("slot repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution; not retryable.
    #[error("slot repository query failed: {message}")]
    Query { message: String },
}

impl SlotRepositoryError {
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

    /// Whether a periodic job may retry after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

impl From<SlotRepositoryError> for Error {
    fn from(error: SlotRepositoryError) -> Self {
        match error {
            SlotRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("slot store unavailable: {message}"))
            }
            SlotRepositoryError::Query { message } => {
                Error::internal(format!("slot store error: {message}"))
            }
        }
    }
}

/// Persistence port for slots.
///
/// Conditional operations return `Ok(None)` when the precondition no
/// longer holds (the slot is missing or its status moved on); callers
/// re-read if they need to distinguish the two.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Persist one freshly created slot.
    async fn insert(&self, slot: &Slot) -> Result<(), SlotRepositoryError>;

    /// Persist a batch of freshly created slots.
    async fn insert_batch(&self, slots: &[Slot]) -> Result<(), SlotRepositoryError>;

    /// Fetch a slot by id.
    async fn find_by_id(&self, slot_id: Uuid) -> Result<Option<Slot>, SlotRepositoryError>;

    /// All slots starting within `[from, to]`, any instructor.
    async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, SlotRepositoryError>;

    /// Available slots of one kind, ordered by start time.
    async fn list_available(&self, kind: SlotKind) -> Result<Vec<Slot>, SlotRepositoryError>;

    /// Every slot owned by an instructor, ordered by start time.
    async fn list_for_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<Slot>, SlotRepositoryError>;

    /// A student's slots restricted to the given statuses, ordered by
    /// start time.
    async fn list_for_student(
        &self,
        student_id: Uuid,
        statuses: &[SlotStatus],
    ) -> Result<Vec<Slot>, SlotRepositoryError>;

    /// Atomically transition `Available -> Booked` and assign the student.
    ///
    /// Returns the booked slot, or `None` when the slot is missing or no
    /// longer available (somebody else won the race).
    async fn book(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Slot>, SlotRepositoryError>;

    /// Atomically transition `Booked -> Available` and clear the student,
    /// but only while the given student still holds the booking.
    async fn release(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Slot>, SlotRepositoryError>;

    /// Atomically transition `Available | Booked -> Canceled`.
    ///
    /// The displaced student reference is retained on the canceled slot
    /// for history. Returns the updated slot.
    async fn cancel(&self, slot_id: Uuid) -> Result<Option<Slot>, SlotRepositoryError>;

    /// Record an exam result while the slot is still a completed exam.
    async fn record_exam_result(
        &self,
        slot_id: Uuid,
        result: ExamResult,
    ) -> Result<Option<Slot>, SlotRepositoryError>;

    /// Record a rating iff the slot has not been rated before.
    async fn record_rating(
        &self,
        slot_id: Uuid,
        rating: u8,
    ) -> Result<Option<Slot>, SlotRepositoryError>;

    /// Bulk-complete every booked slot whose start is in the past.
    /// Returns the number of slots updated.
    async fn complete_expired(&self, now: DateTime<Utc>) -> Result<u64, SlotRepositoryError>;

    /// Bulk-delete every available slot whose start is in the past.
    /// Returns the number of slots removed.
    async fn prune_expired_available(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, SlotRepositoryError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn connection_errors_are_retryable() {
        assert!(SlotRepositoryError::connection("pool down").is_retryable());
        assert!(!SlotRepositoryError::query("bad filter").is_retryable());
    }

    #[rstest]
    fn error_messages_carry_adapter_detail() {
        let err = SlotRepositoryError::query("broken filter");
        assert!(err.to_string().contains("broken filter"));
    }
}
