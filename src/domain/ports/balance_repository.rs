//! Port for the per-student credit ledger.
//!
//! Two non-negative counters per student: lesson credits and exam
//! credits. The debit is conditional and atomic; the ledger never goes
//! negative and never loses a race at the application layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Error, SlotKind};

/// The credit counter a slot kind draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreditKind {
    Lesson,
    Exam,
}

impl From<SlotKind> for CreditKind {
    fn from(kind: SlotKind) -> Self {
        match kind {
            SlotKind::Lesson => Self::Lesson,
            SlotKind::Exam => Self::Exam,
        }
    }
}

/// Snapshot of a student's remaining credits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreditBalance {
    pub lesson_credits: u32,
    pub exam_credits: u32,
}

impl CreditBalance {
    /// The counter matching a credit kind.
    pub fn of(&self, kind: CreditKind) -> u32 {
        match kind {
            CreditKind::Lesson => self.lesson_credits,
            CreditKind::Exam => self.exam_credits,
        }
    }
}

/// Result of a conditional debit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// One credit was consumed.
    Applied,
    /// The counter was already zero; nothing changed.
    InsufficientBalance,
    /// No ledger account exists for this student.
    UnknownStudent,
}

/// Errors raised by ledger adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceRepositoryError {
    /// Store connectivity failure.
    #[error("credit ledger connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("credit ledger query failed: {message}")]
    Query { message: String },
}

impl BalanceRepositoryError {
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

impl From<BalanceRepositoryError> for Error {
    fn from(error: BalanceRepositoryError) -> Self {
        match error {
            BalanceRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("credit ledger unavailable: {message}"))
            }
            BalanceRepositoryError::Query { message } => {
                Error::internal(format!("credit ledger error: {message}"))
            }
        }
    }
}

/// Persistence port for student credit counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Read a student's balance; `None` when the student has no account.
    async fn balance(
        &self,
        student_id: Uuid,
    ) -> Result<Option<CreditBalance>, BalanceRepositoryError>;

    /// Atomically decrement the matching counter by one, refusing to go
    /// below zero.
    async fn try_debit(
        &self,
        student_id: Uuid,
        kind: CreditKind,
    ) -> Result<DebitOutcome, BalanceRepositoryError>;

    /// Increment the matching counter, creating the account when absent
    /// (purchases open an account; refunds always target an existing one).
    async fn credit(
        &self,
        student_id: Uuid,
        kind: CreditKind,
        amount: u32,
    ) -> Result<(), BalanceRepositoryError>;
}
