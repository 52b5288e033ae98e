//! Product and recipe models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{convert_quantity, Unit};
use crate::types::round2;

/// A product sold at the counter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a product's recipe: how much of a supply one unit sold consumes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecipeItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub supply_id: Uuid,
    pub quantity: Decimal,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub unit: Unit,
}

/// A recipe item joined with the supply it consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecipeComponent {
    pub id: Uuid,
    pub product_id: Uuid,
    pub supply_id: Uuid,
    pub supply_name: String,
    pub quantity: Decimal,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub unit: Unit,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub supply_unit: Unit,
    pub supply_unit_cost: Decimal,
}

impl RecipeComponent {
    /// Recipe quantity expressed in the supply's own unit.
    ///
    /// Incompatible units are rejected when recipes are written; if one slips
    /// through, the raw quantity is used.
    pub fn quantity_in_supply_unit(&self) -> Decimal {
        convert_quantity(self.quantity, self.unit, self.supply_unit).unwrap_or(self.quantity)
    }

    pub fn cost(&self) -> Decimal {
        self.quantity_in_supply_unit() * self.supply_unit_cost
    }
}

/// Cost and profitability of one unit of a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductCosting {
    pub cost: Decimal,
    pub unit_profit: Decimal,
    /// (price - cost) / cost * 100, zero when the recipe costs nothing
    pub margin_percent: Decimal,
}

/// Raw (unrounded) cost of one unit made from `components`
pub fn recipe_cost(components: &[RecipeComponent]) -> Decimal {
    components.iter().map(RecipeComponent::cost).sum()
}

pub fn product_costing(price: Decimal, components: &[RecipeComponent]) -> ProductCosting {
    let cost = recipe_cost(components);
    let margin_percent = if cost.is_zero() {
        Decimal::ZERO
    } else {
        round2((price - cost) / cost * Decimal::from(100))
    };
    ProductCosting {
        cost: round2(cost),
        unit_profit: round2(price - cost),
        margin_percent,
    }
}

/// A product with its recipe, as shown on the detail screen
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub recipe: Vec<RecipeComponent>,
    pub costing: ProductCosting,
}

impl ProductDetail {
    pub fn new(product: Product, recipe: Vec<RecipeComponent>) -> Self {
        let costing = product_costing(product.price, &recipe);
        Self {
            product,
            recipe,
            costing,
        }
    }
}
