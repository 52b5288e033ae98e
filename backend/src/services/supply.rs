//! Supply (inventory item) service

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    round2, validate_name, validate_non_negative, validate_stock_quantity, validate_supply_unit, Supply,
    SupplyView, Unit,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldCheck, UniqueViolationExt};

const SUPPLY_COLUMNS: &str =
    "id, name, quantity, min_quantity, unit, unit_cost, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct SupplyService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplyInput {
    pub name: String,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub unit: Unit,
    pub unit_cost: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSupplyInput {
    pub name: Option<String>,
    pub quantity: Option<Decimal>,
    pub min_quantity: Option<Decimal>,
    pub unit: Option<Unit>,
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplyFilter {
    pub search: Option<String>,
    pub low_stock: Option<bool>,
    pub ordering: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Whitelisted sort orders for the supply list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupplyOrdering {
    #[default]
    NameAsc,
    NameDesc,
    QuantityAsc,
    QuantityDesc,
    UnitCostAsc,
    UnitCostDesc,
}

impl SupplyOrdering {
    /// Parse `name`, `-name`, `quantity`, `-quantity`, `unit_cost`, `-unit_cost`
    pub fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim).unwrap_or("") {
            "" | "name" => Ok(SupplyOrdering::NameAsc),
            "-name" => Ok(SupplyOrdering::NameDesc),
            "quantity" => Ok(SupplyOrdering::QuantityAsc),
            "-quantity" => Ok(SupplyOrdering::QuantityDesc),
            "unit_cost" => Ok(SupplyOrdering::UnitCostAsc),
            "-unit_cost" => Ok(SupplyOrdering::UnitCostDesc),
            other => Err(AppError::validation(
                "ordering",
                format!("unknown ordering '{}'", other),
            )),
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            SupplyOrdering::NameAsc => "name ASC",
            SupplyOrdering::NameDesc => "name DESC",
            SupplyOrdering::QuantityAsc => "quantity ASC, name ASC",
            SupplyOrdering::QuantityDesc => "quantity DESC, name ASC",
            SupplyOrdering::UnitCostAsc => "unit_cost ASC, name ASC",
            SupplyOrdering::UnitCostDesc => "unit_cost DESC, name ASC",
        }
    }
}

/// Stock overview of active supplies
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventorySummary {
    pub active_supplies: i64,
    pub low_stock_supplies: i64,
    /// Σ quantity × unit cost
    pub total_value: Decimal,
}

impl SupplyService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &SupplyFilter) -> AppResult<Vec<SupplyView>> {
        let ordering = SupplyOrdering::parse(filter.ordering.as_deref())?;
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let supplies = sqlx::query_as::<_, Supply>(&format!(
            r#"
            SELECT {SUPPLY_COLUMNS}
            FROM supplies
            WHERE ($1 OR is_active)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
              AND ($3::BOOLEAN IS NULL OR (quantity <= min_quantity) = $3)
            ORDER BY {}
            "#,
            ordering.order_by()
        ))
        .bind(filter.include_inactive)
        .bind(search)
        .bind(filter.low_stock)
        .fetch_all(&self.db)
        .await?;

        Ok(supplies.into_iter().map(Supply::into_view).collect())
    }

    /// Active supplies at or below their minimum
    pub async fn low_stock(&self) -> AppResult<Vec<SupplyView>> {
        self.list(&SupplyFilter {
            low_stock: Some(true),
            ..Default::default()
        })
        .await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SupplyView> {
        sqlx::query_as::<_, Supply>(&format!("SELECT {SUPPLY_COLUMNS} FROM supplies WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(Supply::into_view)
            .ok_or_else(|| AppError::NotFound("Supply".to_string()))
    }

    pub async fn create(&self, input: CreateSupplyInput) -> AppResult<SupplyView> {
        validate_name(&input.name).for_field("name")?;
        validate_stock_quantity(input.quantity).for_field("quantity")?;
        validate_stock_quantity(input.min_quantity).for_field("min_quantity")?;
        validate_non_negative(input.unit_cost).for_field("unit_cost")?;
        validate_supply_unit(input.unit).for_field("unit")?;

        let supply = sqlx::query_as::<_, Supply>(&format!(
            r#"
            INSERT INTO supplies (name, quantity, min_quantity, unit, unit_cost)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUPPLY_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.quantity)
        .bind(input.min_quantity)
        .bind(input.unit.as_str())
        .bind(input.unit_cost)
        .fetch_one(&self.db)
        .await
        .on_unique_violation(|| AppError::DuplicateEntry("name".to_string()))?;

        tracing::info!(supply_id = %supply.id, name = %supply.name, "Supply created");
        Ok(supply.into_view())
    }

    pub async fn update(&self, id: Uuid, input: UpdateSupplyInput) -> AppResult<SupplyView> {
        let current = self.get(id).await?.supply;

        let name = match input.name {
            Some(name) => {
                validate_name(&name).for_field("name")?;
                name.trim().to_string()
            }
            None => current.name,
        };
        let quantity = input.quantity.unwrap_or(current.quantity);
        let min_quantity = input.min_quantity.unwrap_or(current.min_quantity);
        let unit_cost = input.unit_cost.unwrap_or(current.unit_cost);
        validate_stock_quantity(quantity).for_field("quantity")?;
        validate_stock_quantity(min_quantity).for_field("min_quantity")?;
        validate_non_negative(unit_cost).for_field("unit_cost")?;

        let unit = input.unit.unwrap_or(current.unit);
        validate_supply_unit(unit).for_field("unit")?;
        if unit != current.unit {
            self.ensure_recipes_accept(id, unit).await?;
        }

        let supply = sqlx::query_as::<_, Supply>(&format!(
            r#"
            UPDATE supplies
            SET name = $2, quantity = $3, min_quantity = $4, unit = $5, unit_cost = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUPPLY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&name)
        .bind(quantity)
        .bind(min_quantity)
        .bind(unit.as_str())
        .bind(unit_cost)
        .fetch_one(&self.db)
        .await
        .on_unique_violation(|| AppError::DuplicateEntry("name".to_string()))?;

        Ok(supply.into_view())
    }

    pub async fn deactivate(&self, id: Uuid) -> AppResult<SupplyView> {
        let supply = sqlx::query_as::<_, Supply>(&format!(
            r#"
            UPDATE supplies SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {SUPPLY_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supply".to_string()))?;

        tracing::info!(supply_id = %supply.id, "Supply deactivated");
        Ok(supply.into_view())
    }

    pub async fn summary(&self) -> AppResult<InventorySummary> {
        let summary = sqlx::query_as::<_, InventorySummary>(
            r#"
            SELECT COUNT(*) AS active_supplies,
                   COUNT(*) FILTER (WHERE quantity <= min_quantity) AS low_stock_supplies,
                   COALESCE(SUM(quantity * unit_cost), 0) AS total_value
            FROM supplies
            WHERE is_active
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(InventorySummary {
            total_value: round2(summary.total_value),
            ..summary
        })
    }

    /// A unit change must stay convertible for every recipe using the supply
    async fn ensure_recipes_accept(&self, id: Uuid, unit: Unit) -> AppResult<()> {
        let recipe_units: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT unit FROM recipe_items WHERE supply_id = $1")
                .bind(id)
                .fetch_all(&self.db)
                .await?;

        for raw in recipe_units {
            let recipe_unit: Unit = raw.parse()?;
            if !recipe_unit.is_compatible_with(unit) {
                return Err(AppError::validation(
                    "unit",
                    format!("recipes measure this supply in {}, which cannot be converted to {}", recipe_unit, unit),
                ));
            }
        }
        Ok(())
    }
}
