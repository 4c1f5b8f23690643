use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use super::{BookingService, CancelOutcome};
use crate::domain::ports::{
    CreditBalance, CreditKind, DebitOutcome, MockBalanceRepository, MockNotifier,
    MockSlotRepository, Notifier, NotifierError, PushNote,
};
use crate::domain::{
    Caller, ErrorCode, ExamResult, Role, ScheduleConfig, Slot, SlotKind, SlotStatus,
};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Captures spawned notifications so tests can await them.
struct RecordingNotifier {
    tx: mpsc::UnboundedSender<PushNote>,
}

impl RecordingNotifier {
    fn channel() -> (Self, mpsc::UnboundedReceiver<PushNote>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, note: PushNote) -> Result<(), NotifierError> {
        self.tx
            .send(note)
            .map_err(|err| NotifierError::delivery(err.to_string()))
    }
}

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 8, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn available_slot(kind: SlotKind, start: DateTime<Utc>) -> Slot {
    Slot::new_available(Uuid::new_v4(), kind, start, 2)
}

fn booked_slot(kind: SlotKind, start: DateTime<Utc>, student: Uuid) -> Slot {
    let mut slot = available_slot(kind, start);
    slot.status = SlotStatus::Booked;
    slot.student_id = Some(student);
    slot
}

fn service(
    slots: MockSlotRepository,
    balances: MockBalanceRepository,
    notifier: impl Notifier + 'static,
    now: DateTime<Utc>,
) -> BookingService {
    BookingService::new(
        Arc::new(slots),
        Arc::new(balances),
        Arc::new(notifier),
        Arc::new(FixedClock(now)),
        ScheduleConfig::default(),
    )
}

async fn next_note(rx: &mut mpsc::UnboundedReceiver<PushNote>) -> PushNote {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("notification within one second")
        .expect("channel open")
}

#[rstest]
#[tokio::test]
async fn book_debits_one_credit_and_books_the_slot(now: DateTime<Utc>) {
    let student = Uuid::new_v4();
    let slot = available_slot(SlotKind::Lesson, now + TimeDelta::hours(48));
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    let found = slot.clone();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    let mut booked = slot.clone();
    booked.status = SlotStatus::Booked;
    booked.student_id = Some(student);
    let returned = booked.clone();
    slots
        .expect_book()
        .withf(move |id, sid| *id == slot_id && *sid == student)
        .times(1)
        .returning(move |_, _| Ok(Some(returned.clone())));

    let mut balances = MockBalanceRepository::new();
    balances.expect_balance().returning(|_| {
        Ok(Some(CreditBalance {
            lesson_credits: 2,
            exam_credits: 0,
        }))
    });
    balances
        .expect_try_debit()
        .withf(move |sid, kind| *sid == student && *kind == CreditKind::Lesson)
        .times(1)
        .returning(|_, _| Ok(DebitOutcome::Applied));
    balances.expect_credit().times(0);

    let service = service(slots, balances, MockNotifier::new(), now);
    let result = service.book(slot_id, student).await.expect("booking succeeds");

    assert_eq!(result.status, SlotStatus::Booked);
    assert_eq!(result.student_id, Some(student));
}

#[rstest]
#[tokio::test]
async fn book_without_a_ledger_account_is_not_found(now: DateTime<Utc>) {
    let slot = available_slot(SlotKind::Lesson, now + TimeDelta::hours(48));
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));
    slots.expect_book().times(0);

    let mut balances = MockBalanceRepository::new();
    balances.expect_balance().returning(|_| Ok(None));
    balances.expect_try_debit().times(0);

    let service = service(slots, balances, MockNotifier::new(), now);
    let err = service
        .book(slot_id, Uuid::new_v4())
        .await
        .expect_err("unknown student is rejected");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn book_of_a_booked_slot_is_invalid_state(now: DateTime<Utc>) {
    let slot = booked_slot(SlotKind::Lesson, now + TimeDelta::hours(48), Uuid::new_v4());
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));

    let mut balances = MockBalanceRepository::new();
    balances
        .expect_balance()
        .returning(|_| Ok(Some(CreditBalance::default())));
    balances.expect_try_debit().times(0);

    let service = service(slots, balances, MockNotifier::new(), now);
    let err = service
        .book(slot_id, Uuid::new_v4())
        .await
        .expect_err("booked slot is rejected");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn book_with_an_empty_counter_is_insufficient_balance(now: DateTime<Utc>) {
    let slot = available_slot(SlotKind::Exam, now + TimeDelta::hours(48));
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));
    slots.expect_book().times(0);

    let mut balances = MockBalanceRepository::new();
    balances
        .expect_balance()
        .returning(|_| Ok(Some(CreditBalance::default())));
    balances
        .expect_try_debit()
        .times(1)
        .returning(|_, _| Ok(DebitOutcome::InsufficientBalance));

    let service = service(slots, balances, MockNotifier::new(), now);
    let err = service
        .book(slot_id, Uuid::new_v4())
        .await
        .expect_err("empty counter is rejected");
    assert_eq!(err.code(), ErrorCode::InsufficientBalance);
}

#[rstest]
#[tokio::test]
async fn book_losing_the_race_pays_the_credit_back(now: DateTime<Utc>) {
    let student = Uuid::new_v4();
    let slot = available_slot(SlotKind::Lesson, now + TimeDelta::hours(48));
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    slots
        .expect_find_by_id()
        .times(2)
        .returning(move |_| Ok(Some(slot.clone())));
    slots.expect_book().times(1).returning(|_, _| Ok(None));

    let mut balances = MockBalanceRepository::new();
    balances
        .expect_balance()
        .returning(|_| Ok(Some(CreditBalance {
            lesson_credits: 1,
            exam_credits: 0,
        })));
    balances
        .expect_try_debit()
        .times(1)
        .returning(|_, _| Ok(DebitOutcome::Applied));
    balances
        .expect_credit()
        .withf(move |sid, kind, amount| {
            *sid == student && *kind == CreditKind::Lesson && *amount == 1
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let service = service(slots, balances, MockNotifier::new(), now);
    let err = service
        .book(slot_id, student)
        .await
        .expect_err("lost race is rejected");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn cancel_far_ahead_refunds_and_notifies_the_instructor(now: DateTime<Utc>) {
    let student = Uuid::new_v4();
    let slot = booked_slot(SlotKind::Lesson, now + TimeDelta::hours(30), student);
    let slot_id = slot.id;
    let instructor = slot.instructor_id;

    let mut slots = MockSlotRepository::new();
    let found = slot.clone();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    let mut released = slot.clone();
    released.status = SlotStatus::Available;
    released.student_id = None;
    let returned = released.clone();
    slots
        .expect_release()
        .withf(move |id, sid| *id == slot_id && *sid == student)
        .times(1)
        .returning(move |_, _| Ok(Some(returned.clone())));

    let mut balances = MockBalanceRepository::new();
    balances
        .expect_credit()
        .withf(move |sid, kind, amount| {
            *sid == student && *kind == CreditKind::Lesson && *amount == 1
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let (notifier, mut rx) = RecordingNotifier::channel();
    let service = service(slots, balances, notifier, now);
    let outcome = service.cancel(slot_id, student).await.expect("cancel succeeds");

    assert_eq!(
        outcome,
        CancelOutcome {
            slot: released,
            refunded: true,
            hours_until: 30.0,
        }
    );

    let note = next_note(&mut rx).await;
    assert_eq!(note.recipient, instructor);
    assert_eq!(note.data["reason"], "student_cancel");
}

#[rstest]
#[tokio::test]
async fn cancel_close_to_the_start_keeps_the_credit(now: DateTime<Utc>) {
    let student = Uuid::new_v4();
    let slot = booked_slot(SlotKind::Lesson, now + TimeDelta::hours(10), student);
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    let found = slot.clone();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    let mut released = slot.clone();
    released.status = SlotStatus::Available;
    released.student_id = None;
    slots
        .expect_release()
        .times(1)
        .returning(move |_, _| Ok(Some(released.clone())));

    let mut balances = MockBalanceRepository::new();
    balances.expect_credit().times(0);

    let (notifier, mut rx) = RecordingNotifier::channel();
    let service = service(slots, balances, notifier, now);
    let outcome = service.cancel(slot_id, student).await.expect("cancel succeeds");

    assert!(!outcome.refunded);
    assert_eq!(outcome.hours_until, 10.0);
    // The instructor is still told, refund or not.
    next_note(&mut rx).await;
}

#[rstest]
#[tokio::test]
async fn cancel_by_a_non_owner_is_forbidden(now: DateTime<Utc>) {
    let slot = booked_slot(SlotKind::Lesson, now + TimeDelta::hours(30), Uuid::new_v4());
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));
    slots.expect_release().times(0);

    let service = service(slots, MockBalanceRepository::new(), MockNotifier::new(), now);
    let err = service
        .cancel(slot_id, Uuid::new_v4())
        .await
        .expect_err("stranger is rejected");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn change_refunds_and_notifies_the_displaced_student(now: DateTime<Utc>) {
    let student = Uuid::new_v4();
    let old = booked_slot(SlotKind::Lesson, now + TimeDelta::hours(5), student);
    let old_id = old.id;
    let instructor = old.instructor_id;
    let new_start = now + TimeDelta::hours(72);

    let mut slots = MockSlotRepository::new();
    let found = old.clone();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    let calendar = vec![old.clone()];
    slots
        .expect_list_for_instructor()
        .returning(move |_| Ok(calendar.clone()));
    let mut canceled = old.clone();
    canceled.status = SlotStatus::Canceled;
    let returned = canceled.clone();
    slots
        .expect_cancel()
        .withf(move |id| *id == old_id)
        .times(1)
        .returning(move |_| Ok(Some(returned.clone())));
    slots
        .expect_insert()
        .withf(move |slot| {
            slot.instructor_id == instructor
                && slot.kind == SlotKind::Lesson
                && slot.status == SlotStatus::Available
                && slot.student_id.is_none()
                && slot.start == new_start
        })
        .times(1)
        .returning(|_| Ok(()));

    let mut balances = MockBalanceRepository::new();
    balances
        .expect_credit()
        .withf(move |sid, kind, amount| {
            *sid == student && *kind == CreditKind::Lesson && *amount == 1
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let (notifier, mut rx) = RecordingNotifier::channel();
    let service = service(slots, balances, notifier, now);
    let caller = Caller {
        user_id: instructor,
        role: Role::Instructor,
    };
    let outcome = service
        .change(old_id, new_start, &caller)
        .await
        .expect("reschedule succeeds");

    assert!(outcome.refunded);
    assert_eq!(outcome.old_slot.status, SlotStatus::Canceled);
    assert_eq!(outcome.new_slot.start, new_start);

    let note = next_note(&mut rx).await;
    assert_eq!(note.recipient, student);
    assert_eq!(note.data["reason"], "instructor_change");
}

#[rstest]
#[tokio::test]
async fn change_onto_an_occupied_time_is_a_conflict(now: DateTime<Utc>) {
    let old = available_slot(SlotKind::Lesson, now + TimeDelta::hours(5));
    let old_id = old.id;
    let instructor = old.instructor_id;
    let new_start = now + TimeDelta::hours(72);

    let mut other = available_slot(SlotKind::Exam, new_start + TimeDelta::hours(1));
    other.instructor_id = instructor;

    let mut slots = MockSlotRepository::new();
    let found = old.clone();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    let calendar = vec![old.clone(), other];
    slots
        .expect_list_for_instructor()
        .returning(move |_| Ok(calendar.clone()));
    slots.expect_cancel().times(0);
    slots.expect_insert().times(0);

    let service = service(slots, MockBalanceRepository::new(), MockNotifier::new(), now);
    let caller = Caller {
        user_id: instructor,
        role: Role::Instructor,
    };
    let err = service
        .change(old_id, new_start, &caller)
        .await
        .expect_err("overlapping reschedule is rejected");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn change_by_another_instructor_is_forbidden(now: DateTime<Utc>) {
    let old = available_slot(SlotKind::Lesson, now + TimeDelta::hours(5));
    let old_id = old.id;

    let mut slots = MockSlotRepository::new();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(old.clone())));

    let service = service(slots, MockBalanceRepository::new(), MockNotifier::new(), now);
    let caller = Caller {
        user_id: Uuid::new_v4(),
        role: Role::Instructor,
    };
    let err = service
        .change(old_id, now + TimeDelta::hours(72), &caller)
        .await
        .expect_err("foreign slot is rejected");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn change_of_an_unbooked_slot_skips_the_refund(now: DateTime<Utc>) {
    let old = available_slot(SlotKind::Exam, now + TimeDelta::hours(5));
    let old_id = old.id;
    let new_start = now + TimeDelta::hours(72);

    let mut slots = MockSlotRepository::new();
    let found = old.clone();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    let calendar = vec![old.clone()];
    slots
        .expect_list_for_instructor()
        .returning(move |_| Ok(calendar.clone()));
    let mut canceled = old.clone();
    canceled.status = SlotStatus::Canceled;
    slots
        .expect_cancel()
        .times(1)
        .returning(move |_| Ok(Some(canceled.clone())));
    slots.expect_insert().times(1).returning(|_| Ok(()));

    let mut balances = MockBalanceRepository::new();
    balances.expect_credit().times(0);

    let service = service(slots, balances, MockNotifier::new(), now);
    let caller = Caller {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    };
    let outcome = service
        .change(old_id, new_start, &caller)
        .await
        .expect("reschedule succeeds");
    assert!(!outcome.refunded);
}

#[rstest]
#[tokio::test]
async fn exam_result_lands_on_a_completed_exam(now: DateTime<Utc>) {
    let instructor = Uuid::new_v4();
    let mut slot = available_slot(SlotKind::Exam, now - TimeDelta::hours(3));
    slot.instructor_id = instructor;
    slot.status = SlotStatus::Completed;
    slot.student_id = Some(Uuid::new_v4());
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    let found = slot.clone();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    let mut updated = slot.clone();
    updated.exam_result = ExamResult::Passed;
    slots
        .expect_record_exam_result()
        .withf(move |id, result| *id == slot_id && *result == ExamResult::Passed)
        .times(1)
        .returning(move |_, _| Ok(Some(updated.clone())));

    let service = service(slots, MockBalanceRepository::new(), MockNotifier::new(), now);
    let result = service
        .set_exam_result(slot_id, instructor, ExamResult::Passed)
        .await
        .expect("result recorded");
    assert_eq!(result.exam_result, ExamResult::Passed);
}

#[rstest]
#[case(SlotKind::Lesson, SlotStatus::Completed)]
#[case(SlotKind::Exam, SlotStatus::Booked)]
#[tokio::test]
async fn exam_result_requires_a_completed_exam(
    now: DateTime<Utc>,
    #[case] kind: SlotKind,
    #[case] status: SlotStatus,
) {
    let instructor = Uuid::new_v4();
    let mut slot = available_slot(kind, now - TimeDelta::hours(3));
    slot.instructor_id = instructor;
    slot.status = status;
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));
    slots.expect_record_exam_result().times(0);

    let service = service(slots, MockBalanceRepository::new(), MockNotifier::new(), now);
    let err = service
        .set_exam_result(slot_id, instructor, ExamResult::Failed)
        .await
        .expect_err("wrong kind or status is rejected");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[case(0)]
#[case(6)]
#[tokio::test]
async fn rating_outside_the_scale_is_rejected(now: DateTime<Utc>, #[case] rating: u8) {
    let mut slots = MockSlotRepository::new();
    slots.expect_find_by_id().times(0);

    let service = service(slots, MockBalanceRepository::new(), MockNotifier::new(), now);
    let err = service
        .rate(Uuid::new_v4(), Uuid::new_v4(), rating)
        .await
        .expect_err("out-of-scale rating is rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn rating_a_completed_slot_succeeds_once(now: DateTime<Utc>) {
    let student = Uuid::new_v4();
    let mut slot = booked_slot(SlotKind::Lesson, now - TimeDelta::hours(3), student);
    slot.status = SlotStatus::Completed;
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    let found = slot.clone();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    let mut rated = slot.clone();
    rated.rating = Some(5);
    rated.rated = true;
    slots
        .expect_record_rating()
        .withf(move |id, rating| *id == slot_id && *rating == 5)
        .times(1)
        .returning(move |_, _| Ok(Some(rated.clone())));

    let service = service(slots, MockBalanceRepository::new(), MockNotifier::new(), now);
    let result = service.rate(slot_id, student, 5).await.expect("rating lands");
    assert!(result.rated);
}

#[rstest]
#[tokio::test]
async fn rating_twice_is_already_done(now: DateTime<Utc>) {
    let student = Uuid::new_v4();
    let mut slot = booked_slot(SlotKind::Lesson, now - TimeDelta::hours(3), student);
    slot.status = SlotStatus::Completed;
    slot.rating = Some(4);
    slot.rated = true;
    let slot_id = slot.id;

    let mut slots = MockSlotRepository::new();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));
    slots.expect_record_rating().times(0);

    let service = service(slots, MockBalanceRepository::new(), MockNotifier::new(), now);
    let err = service
        .rate(slot_id, student, 3)
        .await
        .expect_err("second rating is rejected");
    assert_eq!(err.code(), ErrorCode::AlreadyDone);
}
