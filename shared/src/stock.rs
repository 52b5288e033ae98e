//! Sale-time stock planning
//!
//! Given the lines of a proposed sale, the recipes of the products sold and
//! the current supply levels, compute how much of every supply the sale
//! consumes and check that none would go negative. The plan is all-or-nothing:
//! either every deduction fits or the sale is rejected.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{convert_quantity, is_low_stock, RecipeItem, Unit};

/// A product as seen by the planner
#[derive(Debug, Clone)]
pub struct PlannedProduct {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub recipe: Vec<RecipeItem>,
}

/// Current level of a supply as seen by the planner
#[derive(Debug, Clone)]
pub struct SupplyLevel {
    pub id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub unit: Unit,
}

/// Requested quantity of one product
#[derive(Debug, Clone, Copy)]
pub struct PlannedLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Deduction applied to one supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockDeduction {
    pub supply_id: Uuid,
    pub supply_name: String,
    pub required: Decimal,
    pub available: Decimal,
    pub remaining: Decimal,
    /// Low-stock flag recomputed on the remaining quantity
    pub low_stock: bool,
}

/// Validated set of deductions, ordered by supply id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockPlan {
    pub deductions: Vec<StockDeduction>,
}

impl StockPlan {
    pub fn is_empty(&self) -> bool {
        self.deductions.is_empty()
    }

    pub fn required_for(&self, supply_id: Uuid) -> Decimal {
        self.deductions
            .iter()
            .find(|d| d.supply_id == supply_id)
            .map(|d| d.required)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total_required(&self) -> Decimal {
        self.deductions.iter().map(|d| d.required).sum()
    }

    pub fn low_stock_supplies(&self) -> impl Iterator<Item = &StockDeduction> {
        self.deductions.iter().filter(|d| d.low_stock)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StockError {
    #[error("a sale needs at least one line")]
    EmptySale,

    #[error("quantity for product {product_id} must be positive")]
    NonPositiveQuantity { product_id: Uuid },

    #[error("product {product_id} does not exist")]
    UnknownProduct { product_id: Uuid },

    #[error("product '{name}' is no longer sold")]
    InactiveProduct { product_id: Uuid, name: String },

    #[error("supply {supply_id} referenced by a recipe does not exist")]
    UnknownSupply { supply_id: Uuid },

    #[error("recipe unit {recipe_unit} cannot be converted to {supply_unit} for supply '{supply_name}'")]
    IncompatibleUnits {
        supply_name: String,
        recipe_unit: Unit,
        supply_unit: Unit,
    },

    #[error("insufficient stock of '{supply_name}': requires {required}, {available} available")]
    InsufficientStock {
        supply_id: Uuid,
        supply_name: String,
        required: Decimal,
        available: Decimal,
    },
}

/// Plan the supply deductions for a sale.
///
/// Deltas are summed per supply across all lines before checking, so two
/// lines drawing on the same supply cannot each pass on their own and jointly
/// overdraw it. When several supplies are short, the one with the lowest id
/// is reported.
pub fn plan_stock_deduction(
    lines: &[PlannedLine],
    products: &HashMap<Uuid, PlannedProduct>,
    supplies: &HashMap<Uuid, SupplyLevel>,
) -> Result<StockPlan, StockError> {
    if lines.is_empty() {
        return Err(StockError::EmptySale);
    }

    let mut required: BTreeMap<Uuid, Decimal> = BTreeMap::new();

    for line in lines {
        if line.quantity <= 0 {
            return Err(StockError::NonPositiveQuantity {
                product_id: line.product_id,
            });
        }
        let product = products
            .get(&line.product_id)
            .ok_or(StockError::UnknownProduct {
                product_id: line.product_id,
            })?;
        if !product.is_active {
            return Err(StockError::InactiveProduct {
                product_id: product.id,
                name: product.name.clone(),
            });
        }

        for item in &product.recipe {
            let supply = supplies
                .get(&item.supply_id)
                .ok_or(StockError::UnknownSupply {
                    supply_id: item.supply_id,
                })?;
            let per_unit = convert_quantity(item.quantity, item.unit, supply.unit).ok_or_else(|| {
                StockError::IncompatibleUnits {
                    supply_name: supply.name.clone(),
                    recipe_unit: item.unit,
                    supply_unit: supply.unit,
                }
            })?;
            *required.entry(supply.id).or_insert(Decimal::ZERO) += per_unit * Decimal::from(line.quantity);
        }
    }

    let mut deductions = Vec::with_capacity(required.len());
    for (supply_id, required) in required {
        // Present: every key was inserted from a successful lookup above
        let Some(supply) = supplies.get(&supply_id) else {
            return Err(StockError::UnknownSupply { supply_id });
        };
        if supply.quantity < required {
            return Err(StockError::InsufficientStock {
                supply_id,
                supply_name: supply.name.clone(),
                required,
                available: supply.quantity,
            });
        }
        let remaining = supply.quantity - required;
        deductions.push(StockDeduction {
            supply_id,
            supply_name: supply.name.clone(),
            required,
            available: supply.quantity,
            remaining,
            low_stock: is_low_stock(remaining, supply.min_quantity),
        });
    }

    Ok(StockPlan { deductions })
}
