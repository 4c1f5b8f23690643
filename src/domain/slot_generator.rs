//! Randomized conflict-free slot placement for one instructor-week.
//!
//! Placement is a bounded randomized search rather than a deterministic
//! packer: propose a random day and start hour, keep the candidate when it
//! does not overlap anything placed so far, and stop once the target count
//! is reached or the shared attempt budget runs out. Under-delivery near
//! full capacity is accepted by contract; callers must not assume the
//! exact requested count.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::domain::{Slot, SlotKind};

/// Tunables for slot generation and the refund window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Lesson slots generated per instructor-week.
    pub lessons_per_week: u32,
    /// Exam slots generated per instructor-week.
    pub exams_per_week: u32,
    /// Fixed slot length in hours.
    pub duration_hours: u8,
    /// Earliest permitted start hour (inclusive).
    pub work_start_hour: u32,
    /// Number of permitted start hours; the window `8 + 11` allows starts
    /// from 08:00 through 18:00, so the last slot ends at 20:00.
    pub work_hours_span: u32,
    /// Shared attempt budget for one generation call.
    pub max_attempts: u32,
    /// Student cancellations at least this many hours ahead refund the
    /// credit.
    pub cancel_refund_hours: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            lessons_per_week: 16,
            exams_per_week: 4,
            duration_hours: 2,
            work_start_hour: 8,
            work_hours_span: 11,
            max_attempts: 100,
            cancel_refund_hours: 24,
        }
    }
}

/// Generate up to `target_count` non-overlapping available slots for one
/// instructor in the week starting at `week_start` (Monday midnight).
///
/// Candidates are checked against both the slots produced earlier in this
/// call and `existing` (used to keep exams clear of the same week's
/// lessons). Canceled slots in `existing` do not block placement.
///
/// Returns fewer slots than requested when the attempt budget is
/// exhausted first; this is an accepted outcome, not an error.
pub fn generate_slots<R: Rng>(
    rng: &mut R,
    config: &ScheduleConfig,
    instructor_id: Uuid,
    week_start: DateTime<Utc>,
    kind: SlotKind,
    target_count: u32,
    existing: &[Slot],
) -> Vec<Slot> {
    let mut produced: Vec<Slot> = Vec::with_capacity(target_count as usize);

    for _ in 0..config.max_attempts {
        if produced.len() as u32 >= target_count {
            break;
        }

        let day_offset = rng.gen_range(0..7_i64);
        let start_hour = config.work_start_hour + rng.gen_range(0..config.work_hours_span);
        // week_start is Monday midnight, so day + hour offsets land on a
        // whole hour with zeroed minutes and seconds.
        let start =
            week_start + TimeDelta::days(day_offset) + TimeDelta::hours(i64::from(start_hour));
        let end = start + TimeDelta::hours(i64::from(config.duration_hours));

        let conflicts = produced
            .iter()
            .chain(existing.iter().filter(|s| s.status.occupies_calendar()))
            .any(|s| s.overlaps_interval(start, end));

        if !conflicts {
            produced.push(Slot::new_available(
                instructor_id,
                kind,
                start,
                config.duration_hours,
            ));
        }
    }

    produced
}
