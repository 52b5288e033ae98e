//! Reporting service for payroll and data export

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{round2, shift_hours, Attendance, DateRange};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Report filter parameters
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub format: Option<String>, // "json" or "csv"
}

impl ReportFilter {
    pub fn wants_csv(&self) -> bool {
        self.format.as_deref() == Some("csv")
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PayrollEmployee {
    pub id: Uuid,
    pub name: String,
    pub hourly_rate: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct ShiftRow {
    pub employee_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Payroll entry for one employee
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PayrollLine {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub hourly_rate: Decimal,
    pub assigned_hours: Decimal,
    pub worked_hours: Decimal,
    pub pay: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayrollReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub lines: Vec<PayrollLine>,
    pub total_pay: Decimal,
}

/// Aggregate shifts and attendance into payroll lines, one per employee in
/// the given order. Pay is worked hours times the hourly rate.
pub fn build_payroll(
    employees: &[PayrollEmployee],
    shifts: &[ShiftRow],
    attendance: &[Attendance],
) -> Vec<PayrollLine> {
    let mut assigned: HashMap<Uuid, Decimal> = HashMap::new();
    for shift in shifts {
        *assigned.entry(shift.employee_id).or_default() += shift_hours(shift.start_time, shift.end_time);
    }
    let mut worked: HashMap<Uuid, Decimal> = HashMap::new();
    for record in attendance {
        *worked.entry(record.employee_id).or_default() += record.worked_hours();
    }

    employees
        .iter()
        .map(|employee| {
            let worked_hours = worked.get(&employee.id).copied().unwrap_or_default();
            PayrollLine {
                employee_id: employee.id,
                employee_name: employee.name.clone(),
                hourly_rate: employee.hourly_rate,
                assigned_hours: round2(assigned.get(&employee.id).copied().unwrap_or_default()),
                worked_hours: round2(worked_hours),
                pay: round2(worked_hours * employee.hourly_rate),
            }
        })
        .collect()
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Payroll for active employees over an inclusive date range
    pub async fn payroll(&self, range: DateRange) -> AppResult<PayrollReport> {
        let employees = sqlx::query_as::<_, PayrollEmployee>(
            "SELECT id, name, hourly_rate FROM employees WHERE is_active ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        let shifts = sqlx::query_as::<_, ShiftRow>(
            r#"
            SELECT employee_id, start_time, end_time
            FROM schedule_cells
            WHERE work_date BETWEEN $1 AND $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, employee_id, work_date, clock_in, clock_out, notes
            FROM attendance
            WHERE work_date BETWEEN $1 AND $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        let lines = build_payroll(&employees, &shifts, &attendance);
        let total_pay = lines.iter().map(|l| l.pay).sum();

        tracing::debug!(start = %range.start, end = %range.end, employees = lines.len(), "Payroll computed");
        Ok(PayrollReport {
            start: range.start,
            end: range.end,
            lines,
            total_pay,
        })
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn employee(name: &str, rate: i64) -> PayrollEmployee {
        PayrollEmployee {
            id: Uuid::new_v4(),
            name: name.to_string(),
            hourly_rate: Decimal::from(rate),
        }
    }

    fn punch(employee_id: Uuid, day: u32, clock_in: NaiveTime, clock_out: Option<NaiveTime>) -> Attendance {
        Attendance {
            id: Uuid::new_v4(),
            employee_id,
            work_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            clock_in: Some(clock_in),
            clock_out,
            notes: None,
        }
    }

    #[test]
    fn test_build_payroll_sums_per_employee() {
        let ana = employee("Ana", 12);
        let luis = employee("Luis", 10);
        let shifts = vec![
            ShiftRow { employee_id: ana.id, start_time: t(8, 0), end_time: t(16, 0) },
            ShiftRow { employee_id: ana.id, start_time: t(8, 0), end_time: t(12, 0) },
        ];
        let attendance = vec![
            punch(ana.id, 4, t(8, 0), Some(t(15, 30))),
            punch(ana.id, 5, t(8, 0), Some(t(12, 0))),
            punch(luis.id, 4, t(9, 0), None),
        ];

        let lines = build_payroll(&[ana.clone(), luis.clone()], &shifts, &attendance);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].assigned_hours, Decimal::from(12));
        assert_eq!(lines[0].worked_hours, Decimal::new(115, 1));
        assert_eq!(lines[0].pay, Decimal::from(138));
        assert_eq!(lines[1].assigned_hours, Decimal::ZERO);
        assert_eq!(lines[1].worked_hours, Decimal::ZERO);
        assert_eq!(lines[1].pay, Decimal::ZERO);
    }

    #[test]
    fn test_export_to_csv_writes_header() {
        let lines = build_payroll(&[employee("Ana", 12)], &[], &[]);
        let csv = ReportingService::export_to_csv(&lines).unwrap();
        let mut rows = csv.lines();
        assert_eq!(
            rows.next(),
            Some("employee_id,employee_name,hourly_rate,assigned_hours,worked_hours,pay")
        );
        assert!(rows.next().unwrap().contains(",Ana,12,"));
    }
}
