//! Schedule service: weekly generation, week view and manual cells

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    block_status, is_future_date, missing_days, shift_hours, validate_shift, week_days, week_start, BlockStatus,
    GenerationSummary, ScheduleCell, ShiftTemplate,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::config::ScheduleConfig;
use crate::error::{AppError, AppResult, FieldCheck, UniqueViolationExt};

const CELL_COLUMNS: &str = "id, employee_id, work_date, start_time, end_time, created_at";

#[derive(Clone)]
pub struct ScheduleService {
    db: PgPool,
    first_day: Weekday,
    template: ShiftTemplate,
}

#[derive(Debug, Deserialize)]
pub struct CreateCellInput {
    pub employee_id: Uuid,
    pub work_date: NaiveDate,
    /// Defaults to the configured shift
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCellInput {
    pub employee_id: Option<Uuid>,
    pub work_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateWeekInput {
    pub week_start: NaiveDate,
    pub employee_id: Uuid,
}

/// One block of the week view: a scheduled cell, or attendance without one
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleBlock {
    pub cell_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub assigned_hours: Decimal,
    pub worked_hours: Option<Decimal>,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub status: BlockStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub blocks: Vec<ScheduleBlock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekSchedule {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<DaySchedule>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CellRow {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRow {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub work_date: NaiveDate,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
}

impl AttendanceRow {
    fn worked_hours(&self) -> Option<Decimal> {
        match (self.clock_in, self.clock_out) {
            (None, None) => None,
            (Some(clock_in), Some(clock_out)) => Some(shift_hours(clock_in, clock_out)),
            _ => Some(Decimal::ZERO),
        }
    }
}

#[derive(Debug, FromRow)]
struct EmployeeState {
    is_active: bool,
}

/// Lay out cells and attendance over the seven days of a week.
///
/// Cells are sorted by start time then employee name; attendance rows with
/// no cell for the same employee and date become `attendance_only` blocks.
pub fn build_week(
    days: [NaiveDate; 7],
    today: NaiveDate,
    cells: &[CellRow],
    attendance: &[AttendanceRow],
) -> WeekSchedule {
    let attendance_by_key: HashMap<(Uuid, NaiveDate), &AttendanceRow> = attendance
        .iter()
        .map(|a| ((a.employee_id, a.work_date), a))
        .collect();
    let scheduled: HashSet<(Uuid, NaiveDate)> =
        cells.iter().map(|c| (c.employee_id, c.work_date)).collect();

    let week_start = days[0];
    let week_end = days[6];
    let days = days
        .into_iter()
        .map(|date| {
            let mut day_cells: Vec<&CellRow> = cells.iter().filter(|c| c.work_date == date).collect();
            day_cells.sort_by(|a, b| {
                a.start_time
                    .cmp(&b.start_time)
                    .then_with(|| a.employee_name.cmp(&b.employee_name))
            });

            let mut blocks: Vec<ScheduleBlock> = day_cells
                .into_iter()
                .map(|cell| {
                    let record = attendance_by_key.get(&(cell.employee_id, date));
                    let assigned = shift_hours(cell.start_time, cell.end_time);
                    let worked = record.and_then(|a| a.worked_hours());
                    ScheduleBlock {
                        cell_id: Some(cell.id),
                        employee_id: cell.employee_id,
                        employee_name: cell.employee_name.clone(),
                        start_time: Some(cell.start_time),
                        end_time: Some(cell.end_time),
                        assigned_hours: assigned,
                        worked_hours: worked,
                        clock_in: record.and_then(|a| a.clock_in),
                        clock_out: record.and_then(|a| a.clock_out),
                        status: block_status(date, today, assigned, worked),
                    }
                })
                .collect();

            let mut unscheduled: Vec<&AttendanceRow> = attendance
                .iter()
                .filter(|a| a.work_date == date && !scheduled.contains(&(a.employee_id, date)))
                .collect();
            unscheduled.sort_by(|a, b| a.employee_name.cmp(&b.employee_name));
            blocks.extend(unscheduled.into_iter().map(|a| ScheduleBlock {
                cell_id: None,
                employee_id: a.employee_id,
                employee_name: a.employee_name.clone(),
                start_time: None,
                end_time: None,
                assigned_hours: Decimal::ZERO,
                worked_hours: a.worked_hours(),
                clock_in: a.clock_in,
                clock_out: a.clock_out,
                status: BlockStatus::AttendanceOnly,
            }));

            DaySchedule { date, blocks }
        })
        .collect();

    WeekSchedule {
        week_start,
        week_end,
        days,
    }
}

impl ScheduleService {
    pub fn new(db: PgPool, config: &ScheduleConfig) -> Self {
        Self {
            db,
            first_day: config.first_day_of_week,
            template: config.shift_template(),
        }
    }

    /// Create the default shift for every day of a week that has no cell yet.
    ///
    /// Safe to repeat: existing cells are left as they are.
    pub async fn generate_week(&self, week_start: NaiveDate, employee_id: Uuid) -> AppResult<GenerationSummary> {
        let days = week_days(week_start, self.first_day)?;

        let mut tx = self.db.begin().await?;
        let employee = sqlx::query_as::<_, EmployeeState>("SELECT is_active FROM employees WHERE id = $1")
            .bind(employee_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;
        if !employee.is_active {
            return Err(AppError::ValidationError(
                "Cannot generate a schedule for an inactive employee".to_string(),
            ));
        }

        let existing: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT work_date FROM schedule_cells
            WHERE employee_id = $1 AND work_date BETWEEN $2 AND $3
            "#,
        )
        .bind(employee_id)
        .bind(days[0])
        .bind(days[6])
        .fetch_all(&mut *tx)
        .await?;

        let mut created = 0u32;
        for day in missing_days(&days, &existing) {
            let result = sqlx::query(
                r#"
                INSERT INTO schedule_cells (employee_id, work_date, start_time, end_time)
                SELECT $1, $2, $3, $4
                WHERE NOT EXISTS (
                    SELECT 1 FROM schedule_cells WHERE employee_id = $1 AND work_date = $2
                )
                ON CONFLICT (employee_id, work_date, start_time) DO NOTHING
                "#,
            )
            .bind(employee_id)
            .bind(day)
            .bind(self.template.start)
            .bind(self.template.end)
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected() as u32;
        }
        let summary = GenerationSummary::for_week(&days, created);
        tx.commit().await?;

        tracing::info!(
            %employee_id,
            %week_start,
            created = summary.created,
            already_present = summary.already_present,
            "Week schedule generated"
        );
        Ok(summary)
    }

    /// The week containing `date`, with compliance status per block
    pub async fn week_view(&self, date: NaiveDate, today: NaiveDate) -> AppResult<WeekSchedule> {
        let start = week_start(date, self.first_day)?;
        let days = week_days(start, self.first_day)?;
        let end = days[6];

        let cells = sqlx::query_as::<_, CellRow>(
            r#"
            SELECT c.id, c.employee_id, e.name AS employee_name, c.work_date, c.start_time, c.end_time
            FROM schedule_cells c
            JOIN employees e ON e.id = c.employee_id
            WHERE c.work_date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let attendance = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT a.employee_id, e.name AS employee_name, a.work_date, a.clock_in, a.clock_out
            FROM attendance a
            JOIN employees e ON e.id = a.employee_id
            WHERE a.work_date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(build_week(days, today, &cells, &attendance))
    }

    pub async fn get_cell(&self, id: Uuid) -> AppResult<ScheduleCell> {
        sqlx::query_as::<_, ScheduleCell>(&format!("SELECT {CELL_COLUMNS} FROM schedule_cells WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Schedule cell".to_string()))
    }

    pub async fn create_cell(&self, input: CreateCellInput, today: NaiveDate) -> AppResult<ScheduleCell> {
        ensure_future("work_date", input.work_date, today)?;
        let start = input.start_time.unwrap_or(self.template.start);
        let end = input.end_time.unwrap_or(self.template.end);
        validate_shift(start, end).for_field("end_time")?;

        let mut tx = self.db.begin().await?;
        ensure_active_employee(&mut tx, input.employee_id).await?;

        let cell = sqlx::query_as::<_, ScheduleCell>(&format!(
            r#"
            INSERT INTO schedule_cells (employee_id, work_date, start_time, end_time)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (employee_id, work_date, start_time) DO NOTHING
            RETURNING {CELL_COLUMNS}
            "#
        ))
        .bind(input.employee_id)
        .bind(input.work_date)
        .bind(start)
        .bind(end)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("The employee already has a shift starting at that time on that date".to_string())
        })?;
        tx.commit().await?;

        Ok(cell)
    }

    pub async fn update_cell(&self, id: Uuid, input: UpdateCellInput, today: NaiveDate) -> AppResult<ScheduleCell> {
        let mut tx = self.db.begin().await?;
        let current = sqlx::query_as::<_, ScheduleCell>(&format!(
            "SELECT {CELL_COLUMNS} FROM schedule_cells WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule cell".to_string()))?;

        if !current.is_editable(today) {
            return Err(AppError::NotEditable(
                "Only cells dated after today can be changed".to_string(),
            ));
        }

        let work_date = input.work_date.unwrap_or(current.work_date);
        ensure_future("work_date", work_date, today)?;
        let start = input.start_time.unwrap_or(current.start_time);
        let end = input.end_time.unwrap_or(current.end_time);
        validate_shift(start, end).for_field("end_time")?;
        let employee_id = input.employee_id.unwrap_or(current.employee_id);
        if employee_id != current.employee_id {
            ensure_active_employee(&mut tx, employee_id).await?;
        }

        let cell = sqlx::query_as::<_, ScheduleCell>(&format!(
            r#"
            UPDATE schedule_cells
            SET employee_id = $2, work_date = $3, start_time = $4, end_time = $5
            WHERE id = $1
            RETURNING {CELL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(employee_id)
        .bind(work_date)
        .bind(start)
        .bind(end)
        .fetch_one(&mut *tx)
        .await
        .on_unique_violation(|| {
            AppError::Conflict("The employee already has a shift starting at that time on that date".to_string())
        })?;
        tx.commit().await?;

        Ok(cell)
    }

    pub async fn delete_cell(&self, id: Uuid, today: NaiveDate) -> AppResult<()> {
        let cell = self.get_cell(id).await?;
        if !cell.is_editable(today) {
            return Err(AppError::NotEditable(
                "Only cells dated after today can be deleted".to_string(),
            ));
        }

        // The date guard is repeated so a concurrent edit cannot slip a past cell through
        let result = sqlx::query("DELETE FROM schedule_cells WHERE id = $1 AND work_date > $2")
            .bind(id)
            .bind(today)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Schedule cell".to_string()));
        }
        Ok(())
    }
}

fn ensure_future(field: &str, date: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if is_future_date(date, today) {
        Ok(())
    } else {
        Err(AppError::validation(field, "Date must be after today"))
    }
}

async fn ensure_active_employee(tx: &mut Transaction<'_, Postgres>, employee_id: Uuid) -> AppResult<()> {
    let employee = sqlx::query_as::<_, EmployeeState>("SELECT is_active FROM employees WHERE id = $1")
        .bind(employee_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;
    if !employee.is_active {
        return Err(AppError::validation("employee_id", "Employee is inactive"));
    }
    Ok(())
}
