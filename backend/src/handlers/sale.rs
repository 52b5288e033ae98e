//! HTTP handlers for sales

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{PaginatedResponse, Pagination, Sale, SaleWithLines};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Permission};
use crate::services::sale::{RecordSaleInput, SaleFilter, SaleReceipt};
use crate::services::SaleService;
use crate::AppState;

fn sale_service(state: &AppState) -> SaleService {
    SaleService::new(state.db.clone(), &state.config.loyalty)
}

/// Record a sale, deducting stock and moving loyalty points
pub async fn record_sale(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<(StatusCode, Json<SaleReceipt>)> {
    user.require(Permission::RecordSale)?;
    let now = state.config.schedule.local_now();
    let receipt = sale_service(&state).record(input, now).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_sales(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<SaleFilter>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    user.require(Permission::View)?;
    let sales = sale_service(&state).list(&filter, &pagination).await?;
    Ok(Json(sales))
}

pub async fn get_sale(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SaleWithLines>> {
    user.require(Permission::View)?;
    let sale = sale_service(&state).get(id).await?;
    Ok(Json(sale))
}
