//! HTTP handlers for employee management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::Employee;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Permission};
use crate::services::employee::{CreateEmployeeInput, EmployeeFilter, UpdateEmployeeInput};
use crate::services::EmployeeService;
use crate::AppState;

/// List employees
pub async fn list_employees(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<EmployeeFilter>,
) -> AppResult<Json<Vec<Employee>>> {
    user.require(Permission::View)?;
    let employees = EmployeeService::new(state.db).list(&filter).await?;
    Ok(Json(employees))
}

pub async fn get_employee(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Employee>> {
    user.require(Permission::View)?;
    let employee = EmployeeService::new(state.db).get(id).await?;
    Ok(Json(employee))
}

/// Create an employee
pub async fn create_employee(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateEmployeeInput>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    user.require(Permission::Manage)?;
    let today = state.config.schedule.today();
    let employee = EmployeeService::new(state.db).create(input, today).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateEmployeeInput>,
) -> AppResult<Json<Employee>> {
    user.require(Permission::Manage)?;
    let employee = EmployeeService::new(state.db).update(id, input).await?;
    Ok(Json(employee))
}

/// Soft-delete an employee
pub async fn deactivate_employee(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Employee>> {
    user.require(Permission::Manage)?;
    let today = state.config.schedule.today();
    let employee = EmployeeService::new(state.db).deactivate(id, today).await?;
    Ok(Json(employee))
}
