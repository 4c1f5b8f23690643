//! Slot aggregate and its closed status machine.
//!
//! A slot is a two-hour unit of instructor time, typed as a lesson or an
//! exam. Status transitions are enforced centrally by the booking service
//! and the lifecycle reconciler; nothing else mutates a slot.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// Lowest accepted lesson rating.
pub const RATING_MIN: u8 = 1;
/// Highest accepted lesson rating.
pub const RATING_MAX: u8 = 5;

/// The kind of schedulable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Lesson,
    Exam,
}

impl SlotKind {
    /// Wire representation shared with clients and the read models.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Exam => "exam",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown slot kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown slot kind: {0}")]
pub struct ParseSlotKindError(pub String);

impl FromStr for SlotKind {
    type Err = ParseSlotKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "lesson" => Ok(Self::Lesson),
            "exam" => Ok(Self::Exam),
            other => Err(ParseSlotKindError(other.to_owned())),
        }
    }
}

/// Lifecycle status of a slot.
///
/// `Canceled` is terminal: a canceled slot is never offered again, a fresh
/// replacement slot is created instead. Canceled slots are excluded from
/// overlap checks for the same reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    Available,
    Booked,
    Completed,
    Canceled,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Booked => "booked",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Whether slots in this status participate in overlap checks.
    pub fn occupies_calendar(&self) -> bool {
        !matches!(self, Self::Canceled)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a completed exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExamResult {
    Pending,
    Passed,
    Failed,
}

impl ExamResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExamResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown exam result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("exam result must be passed, failed, or pending; got {0}")]
pub struct ParseExamResultError(pub String);

impl FromStr for ExamResult {
    type Err = ParseExamResultError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            other => Err(ParseExamResultError(other.to_owned())),
        }
    }
}

/// A schedulable unit of instructor time.
///
/// ## Invariants
/// - `student_id` is set iff `status` is `Booked` or `Completed`, except
///   that instructor-canceled slots retain the displaced student for
///   history.
/// - Two slots of one instructor never overlap while both occupy the
///   calendar (see [`SlotStatus::occupies_calendar`]).
/// - `rated` flips to `true` exactly once; the rating is then immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: Uuid,
    pub start: DateTime<Utc>,
    pub duration_hours: u8,
    pub kind: SlotKind,
    pub instructor_id: Uuid,
    pub student_id: Option<Uuid>,
    pub status: SlotStatus,
    pub exam_result: ExamResult,
    pub rating: Option<u8>,
    pub rated: bool,
}

impl Slot {
    /// Build a fresh available slot for an instructor.
    pub fn new_available(
        instructor_id: Uuid,
        kind: SlotKind,
        start: DateTime<Utc>,
        duration_hours: u8,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            duration_hours,
            kind,
            instructor_id,
            student_id: None,
            status: SlotStatus::Available,
            exam_result: ExamResult::Pending,
            rating: None,
            rated: false,
        }
    }

    /// Exclusive end instant of the slot's interval.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + TimeDelta::hours(i64::from(self.duration_hours))
    }

    /// Strict interval overlap against another slot.
    pub fn overlaps(&self, other: &Slot) -> bool {
        self.overlaps_interval(other.start, other.end())
    }

    /// Strict interval overlap against `[start, end)`.
    pub fn overlaps_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end() > start
    }
}
