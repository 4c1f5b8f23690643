//! In-memory slot repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{SlotRepository, SlotRepositoryError};
use crate::domain::{ExamResult, Slot, SlotKind, SlotStatus};

/// Slot storage in a mutex-guarded map.
#[derive(Default)]
pub struct InMemorySlotStore {
    slots: Mutex<HashMap<Uuid, Slot>>,
}

impl InMemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_start(mut slots: Vec<Slot>) -> Vec<Slot> {
    slots.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    slots
}

#[async_trait]
impl SlotRepository for InMemorySlotStore {
    async fn insert(&self, slot: &Slot) -> Result<(), SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        if slots.contains_key(&slot.id) {
            return Err(SlotRepositoryError::query(format!(
                "duplicate slot id {}",
                slot.id
            )));
        }
        slots.insert(slot.id, slot.clone());
        Ok(())
    }

    async fn insert_batch(&self, batch: &[Slot]) -> Result<(), SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        for slot in batch {
            if slots.contains_key(&slot.id) {
                return Err(SlotRepositoryError::query(format!(
                    "duplicate slot id {}",
                    slot.id
                )));
            }
        }
        for slot in batch {
            slots.insert(slot.id, slot.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, slot_id: Uuid) -> Result<Option<Slot>, SlotRepositoryError> {
        Ok(self.slots.lock().await.get(&slot_id).cloned())
    }

    async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, SlotRepositoryError> {
        let slots = self.slots.lock().await;
        Ok(by_start(
            slots
                .values()
                .filter(|s| s.start >= from && s.start <= to)
                .cloned()
                .collect(),
        ))
    }

    async fn list_available(&self, kind: SlotKind) -> Result<Vec<Slot>, SlotRepositoryError> {
        let slots = self.slots.lock().await;
        Ok(by_start(
            slots
                .values()
                .filter(|s| s.status == SlotStatus::Available && s.kind == kind)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<Slot>, SlotRepositoryError> {
        let slots = self.slots.lock().await;
        Ok(by_start(
            slots
                .values()
                .filter(|s| s.instructor_id == instructor_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_student(
        &self,
        student_id: Uuid,
        statuses: &[SlotStatus],
    ) -> Result<Vec<Slot>, SlotRepositoryError> {
        let slots = self.slots.lock().await;
        Ok(by_start(
            slots
                .values()
                .filter(|s| s.student_id == Some(student_id) && statuses.contains(&s.status))
                .cloned()
                .collect(),
        ))
    }

    async fn book(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Slot>, SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(&slot_id) {
            Some(slot) if slot.status == SlotStatus::Available => {
                slot.status = SlotStatus::Booked;
                slot.student_id = Some(student_id);
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Slot>, SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(&slot_id) {
            Some(slot)
                if slot.status == SlotStatus::Booked && slot.student_id == Some(student_id) =>
            {
                slot.status = SlotStatus::Available;
                slot.student_id = None;
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn cancel(&self, slot_id: Uuid) -> Result<Option<Slot>, SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(&slot_id) {
            Some(slot)
                if matches!(slot.status, SlotStatus::Available | SlotStatus::Booked) =>
            {
                // The displaced student stays on the record for history.
                slot.status = SlotStatus::Canceled;
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn record_exam_result(
        &self,
        slot_id: Uuid,
        result: ExamResult,
    ) -> Result<Option<Slot>, SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(&slot_id) {
            Some(slot)
                if slot.kind == SlotKind::Exam && slot.status == SlotStatus::Completed =>
            {
                slot.exam_result = result;
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn record_rating(
        &self,
        slot_id: Uuid,
        rating: u8,
    ) -> Result<Option<Slot>, SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(&slot_id) {
            Some(slot) if !slot.rated => {
                slot.rating = Some(rating);
                slot.rated = true;
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn complete_expired(&self, now: DateTime<Utc>) -> Result<u64, SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        let mut updated = 0;
        for slot in slots.values_mut() {
            if slot.status == SlotStatus::Booked && slot.start < now {
                slot.status = SlotStatus::Completed;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn prune_expired_available(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, SlotRepositoryError> {
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| !(slot.status == SlotStatus::Available && slot.start < now));
        Ok((before - slots.len()) as u64)
    }
}
