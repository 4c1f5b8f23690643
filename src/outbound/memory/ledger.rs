//! In-memory credit ledger.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{
    BalanceRepository, BalanceRepositoryError, CreditBalance, CreditKind, DebitOutcome,
};

/// Per-student credit counters in a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryCreditLedger {
    accounts: Mutex<HashMap<Uuid, CreditBalance>>,
}

impl InMemoryCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn counter(balance: &mut CreditBalance, kind: CreditKind) -> &mut u32 {
    match kind {
        CreditKind::Lesson => &mut balance.lesson_credits,
        CreditKind::Exam => &mut balance.exam_credits,
    }
}

#[async_trait]
impl BalanceRepository for InMemoryCreditLedger {
    async fn balance(
        &self,
        student_id: Uuid,
    ) -> Result<Option<CreditBalance>, BalanceRepositoryError> {
        Ok(self.accounts.lock().await.get(&student_id).copied())
    }

    async fn try_debit(
        &self,
        student_id: Uuid,
        kind: CreditKind,
    ) -> Result<DebitOutcome, BalanceRepositoryError> {
        let mut accounts = self.accounts.lock().await;
        let Some(balance) = accounts.get_mut(&student_id) else {
            return Ok(DebitOutcome::UnknownStudent);
        };
        let count = counter(balance, kind);
        if *count == 0 {
            return Ok(DebitOutcome::InsufficientBalance);
        }
        *count -= 1;
        Ok(DebitOutcome::Applied)
    }

    async fn credit(
        &self,
        student_id: Uuid,
        kind: CreditKind,
        amount: u32,
    ) -> Result<(), BalanceRepositoryError> {
        let mut accounts = self.accounts.lock().await;
        let balance = accounts.entry(student_id).or_default();
        let count = counter(balance, kind);
        *count = count.saturating_add(amount);
        Ok(())
    }
}
