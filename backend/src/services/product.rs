//! Product and recipe service

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    duplicate_recipe_supplies, validate_name, validate_price, validate_recipe_item, Product,
    ProductDetail, RecipeComponent, RecipeItem, Unit,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldCheck, UniqueViolationExt};

const PRODUCT_COLUMNS: &str = "id, name, price, description, is_active, created_at, updated_at";
const RECIPE_ITEM_COLUMNS: &str = "id, product_id, supply_id, quantity, unit";

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeItemInput {
    pub supply_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    #[serde(default)]
    pub recipe: Vec<RecipeItemInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    /// When present, replaces the whole recipe
    pub recipe: Option<Vec<RecipeItemInput>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeItemInput {
    pub quantity: Option<Decimal>,
    pub unit: Option<Unit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    /// Only products whose recipe uses this supply
    pub supply_id: Option<Uuid>,
    pub ordering: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, FromRow)]
struct SupplyUnitRow {
    id: Uuid,
    name: String,
    #[sqlx(try_from = "String")]
    unit: Unit,
}

fn product_order_by(raw: Option<&str>) -> AppResult<&'static str> {
    match raw.map(str::trim).unwrap_or("") {
        "" | "name" => Ok("name ASC"),
        "-name" => Ok("name DESC"),
        "price" => Ok("price ASC, name ASC"),
        "-price" => Ok("price DESC, name ASC"),
        other => Err(AppError::validation(
            "ordering",
            format!("unknown ordering '{}'", other),
        )),
    }
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &ProductFilter) -> AppResult<Vec<ProductDetail>> {
        let order_by = product_order_by(filter.ordering.as_deref())?;
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE ($1 OR p.is_active)
              AND ($2::TEXT IS NULL OR p.name ILIKE $2)
              AND ($3::UUID IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_items ri WHERE ri.product_id = p.id AND ri.supply_id = $3
              ))
            ORDER BY {order_by}
            "#
        ))
        .bind(filter.include_inactive)
        .bind(search)
        .bind(filter.supply_id)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
        let mut recipes: HashMap<Uuid, Vec<RecipeComponent>> = HashMap::new();
        for component in self.components(&ids).await? {
            recipes.entry(component.product_id).or_default().push(component);
        }

        Ok(products
            .into_iter()
            .map(|p| {
                let recipe = recipes.remove(&p.id).unwrap_or_default();
                ProductDetail::new(p, recipe)
            })
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ProductDetail> {
        let product = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let recipe = self.components(&[id]).await?;

        Ok(ProductDetail::new(product, recipe))
    }

    /// Create a product together with its recipe
    pub async fn create(&self, input: CreateProductInput) -> AppResult<ProductDetail> {
        validate_name(&input.name).for_field("name")?;
        validate_price(input.price).for_field("price")?;

        let mut tx = self.db.begin().await?;
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, price, description)
            VALUES ($1, $2, $3)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.price)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await
        .on_unique_violation(|| AppError::DuplicateEntry("name".to_string()))?;

        write_recipe(&mut tx, product.id, &input.recipe).await?;
        tx.commit().await?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        self.get(product.id).await
    }

    /// Update a product; a supplied recipe replaces the current one in the same transaction
    pub async fn update(&self, id: Uuid, input: UpdateProductInput) -> AppResult<ProductDetail> {
        let mut tx = self.db.begin().await?;
        let current = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let name = match input.name {
            Some(name) => {
                validate_name(&name).for_field("name")?;
                name.trim().to_string()
            }
            None => current.name,
        };
        let price = input.price.unwrap_or(current.price);
        validate_price(price).for_field("price")?;

        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, price = $3, description = $4, is_active = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(price)
        .bind(input.description.or(current.description))
        .bind(input.is_active.unwrap_or(current.is_active))
        .execute(&mut *tx)
        .await
        .on_unique_violation(|| AppError::DuplicateEntry("name".to_string()))?;

        if let Some(recipe) = &input.recipe {
            sqlx::query("DELETE FROM recipe_items WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            write_recipe(&mut tx, id, recipe).await?;
        }
        tx.commit().await?;

        self.get(id).await
    }

    pub async fn deactivate(&self, id: Uuid) -> AppResult<ProductDetail> {
        let result = sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tracing::info!(product_id = %id, "Product deactivated");
        self.get(id).await
    }

    pub async fn add_recipe_item(&self, product_id: Uuid, input: RecipeItemInput) -> AppResult<RecipeItem> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let supply = self.supply_unit(input.supply_id).await?;
        validate_recipe_item(input.quantity, input.unit, supply.unit).for_field("quantity")?;

        let item = sqlx::query_as::<_, RecipeItem>(&format!(
            r#"
            INSERT INTO recipe_items (product_id, supply_id, quantity, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING {RECIPE_ITEM_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(input.supply_id)
        .bind(input.quantity)
        .bind(input.unit.as_str())
        .fetch_one(&self.db)
        .await
        .on_unique_violation(|| {
            AppError::Conflict(format!("'{}' is already part of this recipe", supply.name))
        })?;

        Ok(item)
    }

    pub async fn update_recipe_item(&self, id: Uuid, input: UpdateRecipeItemInput) -> AppResult<RecipeItem> {
        let current = sqlx::query_as::<_, RecipeItem>(&format!(
            "SELECT {RECIPE_ITEM_COLUMNS} FROM recipe_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe item".to_string()))?;

        let quantity = input.quantity.unwrap_or(current.quantity);
        let unit = input.unit.unwrap_or(current.unit);
        let supply = self.supply_unit(current.supply_id).await?;
        validate_recipe_item(quantity, unit, supply.unit).for_field("quantity")?;

        let item = sqlx::query_as::<_, RecipeItem>(&format!(
            r#"
            UPDATE recipe_items SET quantity = $2, unit = $3
            WHERE id = $1
            RETURNING {RECIPE_ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(quantity)
        .bind(unit.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(item)
    }

    pub async fn remove_recipe_item(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM recipe_items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Recipe item".to_string()));
        }
        Ok(())
    }

    async fn supply_unit(&self, supply_id: Uuid) -> AppResult<SupplyUnitRow> {
        sqlx::query_as::<_, SupplyUnitRow>("SELECT id, name, unit FROM supplies WHERE id = $1")
            .bind(supply_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Supply".to_string()))
    }

    async fn components(&self, product_ids: &[Uuid]) -> AppResult<Vec<RecipeComponent>> {
        let components = sqlx::query_as::<_, RecipeComponent>(
            r#"
            SELECT ri.id, ri.product_id, ri.supply_id, s.name AS supply_name, ri.quantity, ri.unit,
                   s.unit AS supply_unit, s.unit_cost AS supply_unit_cost
            FROM recipe_items ri
            JOIN supplies s ON s.id = ri.supply_id
            WHERE ri.product_id = ANY($1)
            ORDER BY s.name
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(components)
    }
}

/// Insert a full recipe for a product inside the caller's transaction
async fn write_recipe(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    items: &[RecipeItemInput],
) -> AppResult<()> {
    if items.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = items.iter().map(|i| i.supply_id).collect();
    let supplies: HashMap<Uuid, SupplyUnitRow> =
        sqlx::query_as::<_, SupplyUnitRow>("SELECT id, name, unit FROM supplies WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut **tx)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

    let duplicates = duplicate_recipe_supplies(ids.iter().copied());
    if !duplicates.is_empty() {
        let names: Vec<&str> = duplicates
            .iter()
            .map(|id| supplies.get(id).map(|s| s.name.as_str()).unwrap_or("unknown supply"))
            .collect();
        return Err(AppError::validation(
            "recipe",
            format!("The recipe lists the same supply more than once: {}", names.join(", ")),
        ));
    }

    for item in items {
        let supply = supplies
            .get(&item.supply_id)
            .ok_or_else(|| AppError::NotFound("Supply".to_string()))?;
        validate_recipe_item(item.quantity, item.unit, supply.unit).for_field("recipe")?;

        sqlx::query("INSERT INTO recipe_items (product_id, supply_id, quantity, unit) VALUES ($1, $2, $3, $4)")
            .bind(product_id)
            .bind(item.supply_id)
            .bind(item.quantity)
            .bind(item.unit.as_str())
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_order_by() {
        assert_eq!(product_order_by(None).unwrap(), "name ASC");
        assert_eq!(product_order_by(Some("-price")).unwrap(), "price DESC, name ASC");
        assert!(product_order_by(Some("cost")).is_err());
    }
}
