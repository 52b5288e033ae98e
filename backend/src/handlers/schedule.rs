//! HTTP handlers for the weekly schedule

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{GenerationSummary, ScheduleCell};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Permission};
use crate::services::schedule::{CreateCellInput, GenerateWeekInput, UpdateCellInput, WeekSchedule};
use crate::services::ScheduleService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    /// Any date inside the wanted week, defaults to today
    pub date: Option<NaiveDate>,
}

fn schedule_service(state: &AppState) -> ScheduleService {
    ScheduleService::new(state.db.clone(), &state.config.schedule)
}

/// Week view with per-cell attendance status
pub async fn get_week_schedule(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<WeekQuery>,
) -> AppResult<Json<WeekSchedule>> {
    user.require(Permission::View)?;
    let today = state.config.schedule.today();
    let week = schedule_service(&state)
        .week_view(query.date.unwrap_or(today), today)
        .await?;
    Ok(Json(week))
}

pub async fn create_schedule_cell(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateCellInput>,
) -> AppResult<(StatusCode, Json<ScheduleCell>)> {
    user.require(Permission::Manage)?;
    let today = state.config.schedule.today();
    let cell = schedule_service(&state).create_cell(input, today).await?;
    Ok((StatusCode::CREATED, Json(cell)))
}

pub async fn update_schedule_cell(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCellInput>,
) -> AppResult<Json<ScheduleCell>> {
    user.require(Permission::Manage)?;
    let today = state.config.schedule.today();
    let cell = schedule_service(&state).update_cell(id, input, today).await?;
    Ok(Json(cell))
}

pub async fn delete_schedule_cell(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require(Permission::Manage)?;
    let today = state.config.schedule.today();
    schedule_service(&state).delete_cell(id, today).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fill one employee's week with the default shift
pub async fn generate_week_schedule(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<GenerateWeekInput>,
) -> AppResult<Json<GenerationSummary>> {
    user.require(Permission::Manage)?;
    let summary = schedule_service(&state)
        .generate_week(input.week_start, input.employee_id)
        .await?;
    Ok(Json(summary))
}
