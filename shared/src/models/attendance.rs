//! Attendance (clock-in / clock-out) models

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::shift_hours;

/// An employee's attendance for one date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Attendance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub work_date: NaiveDate,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub notes: Option<String>,
}

impl Attendance {
    /// Hours actually worked; zero until both times are recorded
    pub fn worked_hours(&self) -> Decimal {
        match (self.clock_in, self.clock_out) {
            (Some(clock_in), Some(clock_out)) => shift_hours(clock_in, clock_out),
            _ => Decimal::ZERO,
        }
    }

    pub fn has_clock_time(&self) -> bool {
        self.clock_in.is_some() || self.clock_out.is_some()
    }
}

/// Kind of kiosk punch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    In,
    Out,
}

/// What a punch does to today's attendance row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockAction {
    /// No row yet: create one with the clock-in time
    CreateWithClockIn,
    /// Row exists without a clock-in: set it
    SetClockIn,
    /// Row has a clock-in and no clock-out: set the clock-out
    SetClockOut,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("a clock-in is already recorded for today")]
    AlreadyClockedIn,

    #[error("a clock-out is already recorded for today")]
    AlreadyClockedOut,

    #[error("no clock-in recorded for today")]
    NotClockedIn,
}

/// Decide how a punch applies to the existing attendance row for today
pub fn clock_action(existing: Option<&Attendance>, kind: ClockKind) -> Result<ClockAction, ClockError> {
    match (kind, existing) {
        (ClockKind::In, None) => Ok(ClockAction::CreateWithClockIn),
        (ClockKind::In, Some(a)) if a.clock_in.is_none() => Ok(ClockAction::SetClockIn),
        (ClockKind::In, Some(_)) => Err(ClockError::AlreadyClockedIn),
        (ClockKind::Out, None) => Err(ClockError::NotClockedIn),
        (ClockKind::Out, Some(a)) if a.clock_out.is_some() => Err(ClockError::AlreadyClockedOut),
        (ClockKind::Out, Some(a)) if a.clock_in.is_none() => Err(ClockError::NotClockedIn),
        (ClockKind::Out, Some(_)) => Ok(ClockAction::SetClockOut),
    }
}

/// Append a note on a new line, ignoring blank input
pub fn append_note(existing: Option<&str>, note: &str) -> Option<String> {
    let note = note.trim();
    match (existing, note.is_empty()) {
        (existing, true) => existing.map(str::to_string),
        (Some(prev), false) if !prev.is_empty() => Some(format!("{}\n{}", prev, note)),
        (_, false) => Some(note.to_string()),
    }
}
