//! Weekly schedule generation across all instructors.
//!
//! One run targets the week after the current one. The guard is a single
//! window query: any slot already present in that week means a previous
//! run (or another replica) got there first, and the whole run becomes a
//! no-op. Per-instructor persistence failures are logged and skipped so
//! one bad write cannot starve the remaining instructors.

use std::sync::Arc;

use mockable::Clock;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ports::{InstructorDirectory, SlotRepository};
use crate::domain::slot_generator::generate_slots;
use crate::domain::week::week_bounds;
use crate::domain::{Error, ScheduleConfig, SlotKind};

/// Summary of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// The target week already had slots; nothing was written.
    pub skipped: bool,
    /// Slots persisted across all instructors.
    pub slots_created: u64,
    /// Instructors whose batch failed to persist.
    pub instructors_failed: usize,
}

impl GenerationOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            slots_created: 0,
            instructors_failed: 0,
        }
    }
}

/// Periodic job generating next week's availability.
pub struct AvailabilityScheduler {
    slots: Arc<dyn SlotRepository>,
    instructors: Arc<dyn InstructorDirectory>,
    clock: Arc<dyn Clock>,
    config: ScheduleConfig,
}

impl AvailabilityScheduler {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        instructors: Arc<dyn InstructorDirectory>,
        clock: Arc<dyn Clock>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            slots,
            instructors,
            clock,
            config,
        }
    }

    /// Generate next week's slots for every instructor, unless that week
    /// already has any.
    pub async fn run_weekly_generation(&self) -> Result<GenerationOutcome, Error> {
        let next_week = week_bounds(self.clock.utc()).next();

        let existing = self
            .slots
            .list_in_window(next_week.start, next_week.end)
            .await
            .map_err(Error::from)?;
        if !existing.is_empty() {
            debug!(week_start = %next_week.start, "next week already scheduled, skipping");
            return Ok(GenerationOutcome::skipped());
        }

        let instructors = self
            .instructors
            .list_instructor_ids()
            .await
            .map_err(Error::from)?;

        let mut rng = SmallRng::from_entropy();
        let mut created: u64 = 0;
        let mut failed: usize = 0;
        for &instructor_id in &instructors {
            match self
                .generate_for_instructor(&mut rng, instructor_id, next_week.start)
                .await
            {
                Ok(count) => created += count,
                Err(error) => {
                    warn!(%error, %instructor_id, "slot generation failed for instructor");
                    failed += 1;
                }
            }
        }

        info!(
            week_start = %next_week.start,
            instructors = instructors.len(),
            created,
            failed,
            "weekly schedule generated"
        );
        Ok(GenerationOutcome {
            skipped: false,
            slots_created: created,
            instructors_failed: failed,
        })
    }

    async fn generate_for_instructor(
        &self,
        rng: &mut SmallRng,
        instructor_id: Uuid,
        week_start: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64, Error> {
        let lessons = generate_slots(
            rng,
            &self.config,
            instructor_id,
            week_start,
            SlotKind::Lesson,
            self.config.lessons_per_week,
            &[],
        );
        // Exams see the fresh lessons so the two kinds never collide.
        let exams = generate_slots(
            rng,
            &self.config,
            instructor_id,
            week_start,
            SlotKind::Exam,
            self.config.exams_per_week,
            &lessons,
        );

        let mut batch = lessons;
        batch.extend(exams);
        self.slots
            .insert_batch(&batch)
            .await
            .map_err(Error::from)?;
        Ok(batch.len() as u64)
    }
}

#[cfg(test)]
#[path = "availability_scheduler_tests.rs"]
mod tests;
