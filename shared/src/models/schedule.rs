//! Schedule models and week arithmetic

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One scheduled shift for one employee on one date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ScheduleCell {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl ScheduleCell {
    /// Cells can only be changed while their date is strictly in the future
    pub fn is_editable(&self, today: NaiveDate) -> bool {
        is_future_date(self.work_date, today)
    }

    pub fn assigned_hours(&self) -> Decimal {
        shift_hours(self.start_time, self.end_time)
    }
}

pub fn is_future_date(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

/// Start and end time applied to every generated cell
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShiftTemplate {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ShiftTemplate {
    pub fn hours(&self) -> Decimal {
        shift_hours(self.start, self.end)
    }
}

/// Length of a shift in hours. An end at or before the start crosses midnight.
pub fn shift_hours(start: NaiveTime, end: NaiveTime) -> Decimal {
    let mut minutes = (end - start).num_minutes();
    if minutes <= 0 {
        minutes += 24 * 60;
    }
    Decimal::from(minutes) / Decimal::from(60)
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{date} is a {actual:?}; weeks start on {expected:?}")]
    MisalignedWeekStart {
        date: NaiveDate,
        actual: Weekday,
        expected: Weekday,
    },

    #[error("date {0} is out of range")]
    OutOfRange(NaiveDate),
}

/// First day of the week containing `date`
pub fn week_start(date: NaiveDate, first_day: Weekday) -> Result<NaiveDate, ScheduleError> {
    let offset = (date.weekday().num_days_from_monday() + 7 - first_day.num_days_from_monday()) % 7;
    date.checked_sub_signed(Duration::days(i64::from(offset)))
        .ok_or(ScheduleError::OutOfRange(date))
}

/// The seven dates of the week starting on `start`.
///
/// `start` must fall on `first_day`.
pub fn week_days(start: NaiveDate, first_day: Weekday) -> Result<[NaiveDate; 7], ScheduleError> {
    if start.weekday() != first_day {
        return Err(ScheduleError::MisalignedWeekStart {
            date: start,
            actual: start.weekday(),
            expected: first_day,
        });
    }
    let mut days = [start; 7];
    for (i, day) in days.iter_mut().enumerate().skip(1) {
        *day = start
            .checked_add_signed(Duration::days(i as i64))
            .ok_or(ScheduleError::OutOfRange(start))?;
    }
    Ok(days)
}

/// Days of the week that have no cell yet, in week order
pub fn missing_days(days: &[NaiveDate; 7], existing: &[NaiveDate]) -> Vec<NaiveDate> {
    days.iter().copied().filter(|d| !existing.contains(d)).collect()
}

/// Outcome of a schedule-generation run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GenerationSummary {
    pub created: u32,
    pub already_present: u32,
}

impl GenerationSummary {
    /// Every day of the week not inserted by this run already had a cell
    pub fn for_week(days: &[NaiveDate; 7], created: u32) -> Self {
        let created = created.min(days.len() as u32);
        Self {
            created,
            already_present: days.len() as u32 - created,
        }
    }
}

/// Compliance of a scheduled block, judged against attendance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    /// Date not reached yet
    Future,
    /// No clock-in or clock-out recorded
    Absent,
    /// Some hours worked, less than 95% of the shift
    Partial,
    /// At least 95% of the shift worked
    Complete,
    /// Attendance recorded on a date with no scheduled cell
    AttendanceOnly,
}

pub fn block_status(
    date: NaiveDate,
    today: NaiveDate,
    assigned_hours: Decimal,
    worked_hours: Option<Decimal>,
) -> BlockStatus {
    if date > today {
        return BlockStatus::Future;
    }
    let Some(worked) = worked_hours else {
        return BlockStatus::Absent;
    };
    if worked >= assigned_hours * Decimal::new(95, 2) {
        BlockStatus::Complete
    } else if worked > Decimal::ZERO {
        BlockStatus::Partial
    } else {
        BlockStatus::Absent
    }
}
