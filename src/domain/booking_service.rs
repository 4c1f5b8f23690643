//! Booking state machine with credit accounting.
//!
//! One service owns every slot transition requested by users:
//! `Available -> Booked` (book), `Booked -> Available` (student cancel),
//! `Available | Booked -> Canceled` plus a replacement slot (instructor
//! reschedule), and the post-completion writes (exam result, rating).
//! Credit debits and refunds happen here and nowhere else besides the
//! purchase entrypoint in [`crate::domain::BalanceService`].
//!
//! The book path uses a debit-first ordering: the credit is consumed
//! before the conditional `Available -> Booked` write, and paid back when
//! that write loses a race. A crash between the two steps strands one
//! debited credit rather than double-booking an instructor's time.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::ports::{
    BalanceRepository, CreditKind, DebitOutcome, Notifier, PushNote, SlotRepository,
};
use crate::domain::{
    Caller, Error, ExamResult, RATING_MAX, RATING_MIN, Role, ScheduleConfig, Slot, SlotKind,
    SlotStatus,
};

fn kind_label(kind: SlotKind) -> &'static str {
    match kind {
        SlotKind::Lesson => "Lesson",
        SlotKind::Exam => "Exam",
    }
}

fn hours_between(now: DateTime<Utc>, start: DateTime<Utc>) -> f64 {
    (start - now).num_milliseconds() as f64 / 3_600_000.0
}

/// Outcome of a student cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelOutcome {
    /// The released slot, back in `Available`.
    pub slot: Slot,
    /// Whether the credit was paid back.
    pub refunded: bool,
    /// Hours between the cancellation and the slot start; negative when
    /// the start had already passed.
    pub hours_until: f64,
}

/// Outcome of an instructor reschedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeOutcome {
    /// The original slot, now terminally `Canceled`.
    pub old_slot: Slot,
    /// The freshly created replacement, `Available` at the new time.
    pub new_slot: Slot,
    /// Whether a displaced student was refunded.
    pub refunded: bool,
}

/// Domain service driving the slot state machine.
pub struct BookingService {
    slots: Arc<dyn SlotRepository>,
    balances: Arc<dyn BalanceRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: ScheduleConfig,
}

impl BookingService {
    /// Build the service over its driven ports.
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        balances: Arc<dyn BalanceRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            slots,
            balances,
            notifier,
            clock,
            config,
        }
    }

    /// Book an available slot for a student, consuming one credit of the
    /// matching kind.
    pub async fn book(&self, slot_id: Uuid, student_id: Uuid) -> Result<Slot, Error> {
        let slot = self.require_slot(slot_id).await?;

        // Student existence is answered by the ledger: no account means
        // the purchase collaborator has never seen this student.
        self.balances
            .balance(student_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("student {student_id} not found")))?;

        if slot.status != SlotStatus::Available {
            return Err(Error::invalid_state("slot is not available"));
        }

        let kind = CreditKind::from(slot.kind);
        match self
            .balances
            .try_debit(student_id, kind)
            .await
            .map_err(Error::from)?
        {
            DebitOutcome::Applied => {}
            DebitOutcome::InsufficientBalance => {
                return Err(Error::insufficient_balance(format!(
                    "no {} credits remaining",
                    slot.kind
                )));
            }
            DebitOutcome::UnknownStudent => {
                return Err(Error::not_found(format!("student {student_id} not found")));
            }
        }

        match self.slots.book(slot_id, student_id).await {
            Ok(Some(booked)) => Ok(booked),
            Ok(None) => {
                self.compensate_debit(student_id, kind).await;
                match self
                    .slots
                    .find_by_id(slot_id)
                    .await
                    .map_err(Error::from)?
                {
                    None => Err(Error::not_found(format!("slot {slot_id} not found"))),
                    Some(_) => Err(Error::invalid_state("slot is no longer available")),
                }
            }
            Err(repo_error) => {
                self.compensate_debit(student_id, kind).await;
                Err(Error::from(repo_error))
            }
        }
    }

    /// Cancel a booked slot on behalf of the booking student.
    ///
    /// The slot returns to `Available`; the credit is refunded only when
    /// the cancellation lands at least `cancel_refund_hours` before the
    /// slot start. The instructor is notified best-effort.
    pub async fn cancel(&self, slot_id: Uuid, student_id: Uuid) -> Result<CancelOutcome, Error> {
        let slot = self.require_slot(slot_id).await?;

        if slot.student_id != Some(student_id) {
            return Err(Error::forbidden("not authorized to cancel this slot"));
        }
        if slot.status != SlotStatus::Booked {
            return Err(Error::invalid_state("slot is not booked"));
        }

        let now = self.clock.utc();
        let hours_until = hours_between(now, slot.start);
        let refunded = hours_until >= self.config.cancel_refund_hours as f64;

        let released = self
            .slots
            .release(slot_id, student_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::invalid_state("slot is no longer booked"))?;

        if refunded {
            self.balances
                .credit(student_id, CreditKind::from(slot.kind), 1)
                .await
                .map_err(Error::from)?;
        }

        self.dispatch(PushNote {
            recipient: slot.instructor_id,
            title: format!("{} canceled", kind_label(slot.kind)),
            body: format!(
                "The {} on {} was canceled by the student.",
                slot.kind,
                slot.start.to_rfc3339()
            ),
            data: json!({
                "slotId": slot_id.to_string(),
                "kind": slot.kind.as_str(),
                "reason": "student_cancel",
            }),
        });

        Ok(CancelOutcome {
            slot: released,
            refunded,
            hours_until,
        })
    }

    /// Reschedule a slot: terminally cancel the original and create a
    /// fresh available replacement at `new_start`.
    ///
    /// A displaced student is always refunded, regardless of how close to
    /// the start the reschedule happens, and is notified with both times.
    pub async fn change(
        &self,
        slot_id: Uuid,
        new_start: DateTime<Utc>,
        caller: &Caller,
    ) -> Result<ChangeOutcome, Error> {
        let old = self.require_slot(slot_id).await?;

        let authorized = caller.role == Role::Admin
            || (caller.role == Role::Instructor && old.instructor_id == caller.user_id);
        if !authorized {
            return Err(Error::forbidden("not authorized to reschedule this slot"));
        }
        if !matches!(old.status, SlotStatus::Available | SlotStatus::Booked) {
            return Err(Error::invalid_state(
                "only available or booked slots can be rescheduled",
            ));
        }

        let new_end = new_start + TimeDelta::hours(i64::from(old.duration_hours));
        let calendar = self
            .slots
            .list_for_instructor(old.instructor_id)
            .await
            .map_err(Error::from)?;
        let clash = calendar.iter().any(|s| {
            s.id != old.id && s.status.occupies_calendar() && s.overlaps_interval(new_start, new_end)
        });
        if clash {
            return Err(Error::conflict(
                "the new time overlaps another slot of this instructor",
            ));
        }

        let canceled = self
            .slots
            .cancel(slot_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::invalid_state("slot can no longer be rescheduled"))?;

        // Instructor-caused cancellation always refunds.
        let displaced = canceled.student_id;
        if let Some(student) = displaced {
            self.balances
                .credit(student, CreditKind::from(canceled.kind), 1)
                .await
                .map_err(Error::from)?;
        }

        let new_slot = Slot::new_available(old.instructor_id, old.kind, new_start, old.duration_hours);
        self.slots
            .insert(&new_slot)
            .await
            .map_err(Error::from)?;

        if let Some(student) = displaced {
            self.dispatch(PushNote {
                recipient: student,
                title: format!("{} canceled", kind_label(old.kind)),
                body: format!(
                    "Your {} on {} was canceled by the instructor. A new slot is available on {}. Your balance was refunded.",
                    old.kind,
                    old.start.to_rfc3339(),
                    new_start.to_rfc3339()
                ),
                data: json!({
                    "oldSlotId": slot_id.to_string(),
                    "newSlotId": new_slot.id.to_string(),
                    "kind": old.kind.as_str(),
                    "reason": "instructor_change",
                }),
            });
        }

        Ok(ChangeOutcome {
            old_slot: canceled,
            new_slot,
            refunded: displaced.is_some(),
        })
    }

    /// Record an exam result on a completed exam owned by the caller.
    pub async fn set_exam_result(
        &self,
        slot_id: Uuid,
        instructor_id: Uuid,
        result: ExamResult,
    ) -> Result<Slot, Error> {
        let slot = self.require_slot(slot_id).await?;

        if slot.instructor_id != instructor_id {
            return Err(Error::forbidden(
                "not authorized to set the result for this slot",
            ));
        }
        if slot.kind != SlotKind::Exam {
            return Err(Error::invalid_state("results can only be set on exams"));
        }
        if slot.status != SlotStatus::Completed {
            return Err(Error::invalid_state(
                "results can only be set on completed exams",
            ));
        }

        self.slots
            .record_exam_result(slot_id, result)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::invalid_state("exam is no longer completed"))
    }

    /// Rate a finished slot, once.
    pub async fn rate(&self, slot_id: Uuid, student_id: Uuid, rating: u8) -> Result<Slot, Error> {
        if !(RATING_MIN..=RATING_MAX).contains(&rating) {
            return Err(Error::invalid_request(format!(
                "rating must be between {RATING_MIN} and {RATING_MAX}"
            )));
        }

        let slot = self.require_slot(slot_id).await?;

        let assigned = slot
            .student_id
            .ok_or_else(|| Error::not_found("slot has no student assigned"))?;
        if assigned != student_id {
            return Err(Error::forbidden("not authorized to rate this slot"));
        }
        if !matches!(slot.status, SlotStatus::Completed | SlotStatus::Canceled) {
            return Err(Error::invalid_state(
                "only completed or canceled slots can be rated",
            ));
        }
        if slot.rated {
            return Err(Error::already_done("slot has already been rated"));
        }

        // The conditional write closes the race between two concurrent
        // rating attempts: exactly one flips the flag.
        self.slots
            .record_rating(slot_id, rating)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::already_done("slot has already been rated"))
    }

    async fn require_slot(&self, slot_id: Uuid) -> Result<Slot, Error> {
        self.slots
            .find_by_id(slot_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("slot {slot_id} not found")))
    }

    async fn compensate_debit(&self, student_id: Uuid, kind: CreditKind) {
        if let Err(err) = self.balances.credit(student_id, kind, 1).await {
            // Losing this write strands one credit; surfacing it would
            // mask the original failure the caller needs to see.
            error!(error = %err, %student_id, "compensating credit failed after lost booking race");
        }
    }

    /// Fire-and-forget dispatch: the state transition has already
    /// committed, so delivery failures are logged and discarded.
    fn dispatch(&self, note: PushNote) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.notify(note).await {
                warn!(error = %err, "notification delivery failed");
            }
        });
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
