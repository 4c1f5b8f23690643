//! Monday-aligned week window arithmetic.
//!
//! The availability scheduler and the read models reason about calendar
//! weeks using ISO conventions: the week starts on Monday at midnight UTC
//! and ends on Sunday at 23:59:59.999.

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Utc};

/// Inclusive boundaries of one calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekBounds {
    /// Monday 00:00:00.000 UTC.
    pub start: DateTime<Utc>,
    /// Sunday 23:59:59.999 UTC of the same week.
    pub end: DateTime<Utc>,
}

impl WeekBounds {
    /// Boundaries of the week immediately after this one.
    pub fn next(&self) -> Self {
        Self {
            start: self.start + TimeDelta::days(7),
            end: self.end + TimeDelta::days(7),
        }
    }
}

/// Compute the week containing `instant`.
///
/// Sunday belongs to the week that started on the *previous* Monday.
/// Total for every representable instant.
///
/// # Examples
/// ```
/// use autoschool_backend::domain::week_bounds;
/// use chrono::{Datelike, TimeZone, Utc, Weekday};
///
/// let wednesday = Utc.with_ymd_and_hms(2026, 3, 4, 15, 30, 0).unwrap();
/// let bounds = week_bounds(wednesday);
/// assert_eq!(bounds.start.weekday(), Weekday::Mon);
/// assert_eq!(bounds.start, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
/// ```
pub fn week_bounds(instant: DateTime<Utc>) -> WeekBounds {
    let days_from_monday = i64::from(instant.weekday().num_days_from_monday());
    let monday = instant.date_naive() - TimeDelta::days(days_from_monday);
    let start = monday.and_time(NaiveTime::MIN).and_utc();
    let end = start + TimeDelta::days(7) - TimeDelta::milliseconds(1);
    WeekBounds { start, end }
}
