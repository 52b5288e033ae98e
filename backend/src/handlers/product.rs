//! HTTP handlers for products and their recipes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{ProductDetail, RecipeItem};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Permission};
use crate::services::product::{
    CreateProductInput, ProductFilter, RecipeItemInput, UpdateProductInput, UpdateRecipeItemInput,
};
use crate::services::ProductService;
use crate::AppState;

/// List products with recipe cost and margin
pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<ProductDetail>>> {
    user.require(Permission::View)?;
    let products = ProductService::new(state.db).list(&filter).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductDetail>> {
    user.require(Permission::View)?;
    let product = ProductService::new(state.db).get(id).await?;
    Ok(Json(product))
}

/// Create a product together with its recipe
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<ProductDetail>)> {
    user.require(Permission::Manage)?;
    let product = ProductService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductDetail>> {
    user.require(Permission::Manage)?;
    let product = ProductService::new(state.db).update(id, input).await?;
    Ok(Json(product))
}

pub async fn deactivate_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductDetail>> {
    user.require(Permission::Manage)?;
    let product = ProductService::new(state.db).deactivate(id).await?;
    Ok(Json(product))
}

pub async fn add_recipe_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<RecipeItemInput>,
) -> AppResult<(StatusCode, Json<RecipeItem>)> {
    user.require(Permission::Manage)?;
    let item = ProductService::new(state.db).add_recipe_item(product_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_recipe_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRecipeItemInput>,
) -> AppResult<Json<RecipeItem>> {
    user.require(Permission::Manage)?;
    let item = ProductService::new(state.db).update_recipe_item(id, input).await?;
    Ok(Json(item))
}

pub async fn remove_recipe_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require(Permission::Manage)?;
    ProductService::new(state.db).remove_recipe_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
