//! HTTP handlers for loyalty customers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::Customer;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Permission};
use crate::services::customer::{CreateCustomerInput, CustomerFilter, UpdateCustomerInput};
use crate::services::CustomerService;
use crate::AppState;

pub async fn list_customers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<CustomerFilter>,
) -> AppResult<Json<Vec<Customer>>> {
    user.require(Permission::View)?;
    let customers = CustomerService::new(state.db).list(&filter).await?;
    Ok(Json(customers))
}

pub async fn get_customer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    user.require(Permission::View)?;
    let customer = CustomerService::new(state.db).get(id).await?;
    Ok(Json(customer))
}

pub async fn create_customer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    user.require(Permission::Manage)?;
    let customer = CustomerService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<Customer>> {
    user.require(Permission::Manage)?;
    let customer = CustomerService::new(state.db).update(id, input).await?;
    Ok(Json(customer))
}

pub async fn deactivate_customer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    user.require(Permission::Manage)?;
    let customer = CustomerService::new(state.db).deactivate(id).await?;
    Ok(Json(customer))
}
