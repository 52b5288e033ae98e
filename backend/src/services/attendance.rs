//! Attendance kiosk and attendance history

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{append_note, clock_action, Attendance, ClockAction, ClockKind, DateRange};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult, UniqueViolationExt};
use crate::services::EmployeeService;

const ATTENDANCE_COLUMNS: &str = "id, employee_id, work_date, clock_in, clock_out, notes";

#[derive(Clone)]
pub struct AttendanceService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct ClockInput {
    pub email: String,
    pub password: String,
    pub kind: ClockKind,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceFilter {
    pub employee_id: Option<Uuid>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendanceRecord {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attendance: Attendance,
    pub employee_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub worked_hours: Decimal,
}

impl AttendanceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Kiosk punch: verify the employee's password, then record a clock-in or clock-out
    pub async fn clock(&self, input: ClockInput, now: NaiveDateTime) -> AppResult<Attendance> {
        let employee = EmployeeService::new(self.db.clone())
            .find_active_by_email(&input.email)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;

        let Some(hash) = employee.password_hash.as_deref() else {
            return Err(AppError::InvalidCredentials);
        };
        let verified = bcrypt::verify(&input.password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !verified {
            tracing::warn!(employee_id = %employee.id, "Kiosk password rejected");
            return Err(AppError::InvalidCredentials);
        }

        let today = now.date();
        let time = truncate_to_seconds(now.time());
        let note = input.notes.as_deref().unwrap_or_default();

        let mut tx = self.db.begin().await?;
        let existing = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = $1 AND work_date = $2 FOR UPDATE"
        ))
        .bind(employee.id)
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

        let action = clock_action(existing.as_ref(), input.kind)?;
        let notes = append_note(existing.as_ref().and_then(|a| a.notes.as_deref()), note);

        let attendance = match (action, existing) {
            (ClockAction::CreateWithClockIn, _) => sqlx::query_as::<_, Attendance>(&format!(
                r#"
                INSERT INTO attendance (employee_id, work_date, clock_in, notes)
                VALUES ($1, $2, $3, $4)
                RETURNING {ATTENDANCE_COLUMNS}
                "#
            ))
            .bind(employee.id)
            .bind(today)
            .bind(time)
            .bind(&notes)
            .fetch_one(&mut *tx)
            .await
            .on_unique_violation(|| AppError::Conflict("a clock-in is already recorded for today".to_string()))?,
            (ClockAction::SetClockIn, Some(current)) => {
                update_times(&mut tx, current.id, Some(time), current.clock_out, &notes).await?
            }
            (ClockAction::SetClockOut, Some(current)) => {
                update_times(&mut tx, current.id, current.clock_in, Some(time), &notes).await?
            }
            (_, None) => {
                return Err(AppError::Internal("attendance row vanished during clock".to_string()))
            }
        };
        tx.commit().await?;

        tracing::info!(
            employee_id = %employee.id,
            kind = ?input.kind,
            time = %time,
            "Attendance punch recorded"
        );
        Ok(attendance)
    }

    /// Attendance in a date range, newest first
    pub async fn list(&self, employee_id: Option<Uuid>, range: DateRange) -> AppResult<Vec<AttendanceEntry>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT a.id, a.employee_id, a.work_date, a.clock_in, a.clock_out, a.notes,
                   e.name AS employee_name
            FROM attendance a
            JOIN employees e ON e.id = a.employee_id
            WHERE a.work_date BETWEEN $1 AND $2
              AND ($3::UUID IS NULL OR a.employee_id = $3)
            ORDER BY a.work_date DESC, e.name
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(employee_id)
        .fetch_all(&self.db)
        .await?;

        Ok(records
            .into_iter()
            .map(|record| AttendanceEntry {
                worked_hours: record.attendance.worked_hours(),
                record,
            })
            .collect())
    }
}

async fn update_times(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
    notes: &Option<String>,
) -> AppResult<Attendance> {
    let attendance = sqlx::query_as::<_, Attendance>(&format!(
        r#"
        UPDATE attendance
        SET clock_in = $2, clock_out = $3, notes = $4
        WHERE id = $1
        RETURNING {ATTENDANCE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(clock_in)
    .bind(clock_out)
    .bind(notes)
    .fetch_one(&mut **tx)
    .await?;

    Ok(attendance)
}

fn truncate_to_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}
