//! HTTP handlers for the attendance kiosk and history

use axum::{
    extract::{Query, State},
    Json,
};
use shared::{Attendance, DateRange};

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Permission};
use crate::services::attendance::{AttendanceEntry, AttendanceFilter, ClockInput};
use crate::services::AttendanceService;
use crate::AppState;

/// Kiosk clock-in/clock-out (public, authenticated by the employee's password)
pub async fn clock(State(state): State<AppState>, Json(input): Json<ClockInput>) -> AppResult<Json<Attendance>> {
    let now = state.config.schedule.local_now();
    let attendance = AttendanceService::new(state.db).clock(input, now).await?;
    Ok(Json(attendance))
}

/// Attendance history; the range defaults to today
pub async fn list_attendance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<AttendanceFilter>,
) -> AppResult<Json<Vec<AttendanceEntry>>> {
    user.require(Permission::View)?;
    let range = DateRange::resolve(filter.start, filter.end, state.config.schedule.today());
    let entries = AttendanceService::new(state.db)
        .list(filter.employee_id, range)
        .await?;
    Ok(Json(entries))
}
