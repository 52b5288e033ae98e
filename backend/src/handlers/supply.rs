//! HTTP handlers for supply (inventory) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::SupplyView;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Permission};
use crate::services::supply::{CreateSupplyInput, InventorySummary, SupplyFilter, UpdateSupplyInput};
use crate::services::SupplyService;
use crate::AppState;

pub async fn list_supplies(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<SupplyFilter>,
) -> AppResult<Json<Vec<SupplyView>>> {
    user.require(Permission::View)?;
    let supplies = SupplyService::new(state.db).list(&filter).await?;
    Ok(Json(supplies))
}

/// Supplies at or below their minimum
pub async fn list_low_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<SupplyView>>> {
    user.require(Permission::View)?;
    let supplies = SupplyService::new(state.db).low_stock().await?;
    Ok(Json(supplies))
}

pub async fn get_inventory_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<InventorySummary>> {
    user.require(Permission::View)?;
    let summary = SupplyService::new(state.db).summary().await?;
    Ok(Json(summary))
}

pub async fn get_supply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SupplyView>> {
    user.require(Permission::View)?;
    let supply = SupplyService::new(state.db).get(id).await?;
    Ok(Json(supply))
}

pub async fn create_supply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateSupplyInput>,
) -> AppResult<(StatusCode, Json<SupplyView>)> {
    user.require(Permission::Manage)?;
    let supply = SupplyService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(supply)))
}

pub async fn update_supply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSupplyInput>,
) -> AppResult<Json<SupplyView>> {
    user.require(Permission::Manage)?;
    let supply = SupplyService::new(state.db).update(id, input).await?;
    Ok(Json(supply))
}

pub async fn deactivate_supply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SupplyView>> {
    user.require(Permission::Manage)?;
    let supply = SupplyService::new(state.db).deactivate(id).await?;
    Ok(Json(supply))
}
