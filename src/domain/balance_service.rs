//! Credit purchases and balance reads.
//!
//! The purchase collaborator calls `apply_purchase` after a completed
//! order; no HTTP route mutates balances directly.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::{BalanceRepository, CreditBalance, CreditKind};

pub struct BalanceService {
    balances: Arc<dyn BalanceRepository>,
}

impl BalanceService {
    pub fn new(balances: Arc<dyn BalanceRepository>) -> Self {
        Self { balances }
    }

    /// Credit a completed purchase, opening the ledger account when this
    /// is the student's first order.
    pub async fn apply_purchase(
        &self,
        student_id: Uuid,
        lesson_credits: u32,
        exam_credits: u32,
    ) -> Result<CreditBalance, Error> {
        if lesson_credits > 0 {
            self.balances
                .credit(student_id, CreditKind::Lesson, lesson_credits)
                .await
                .map_err(Error::from)?;
        }
        if exam_credits > 0 {
            self.balances
                .credit(student_id, CreditKind::Exam, exam_credits)
                .await
                .map_err(Error::from)?;
        }

        let balance = self
            .balances
            .balance(student_id)
            .await
            .map_err(Error::from)?
            .unwrap_or_default();
        info!(%student_id, lesson_credits, exam_credits, "purchase applied");
        Ok(balance)
    }

    /// A student's remaining credits; `None` when no purchase has ever
    /// been made.
    pub async fn balance(&self, student_id: Uuid) -> Result<Option<CreditBalance>, Error> {
        self.balances
            .balance(student_id)
            .await
            .map_err(Error::from)
    }
}
