//! Sale models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::round2;

/// A recorded sale. Sales are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: Uuid,
    pub title: String,
    pub customer_id: Option<Uuid>,
    /// Sum of line totals before any points redemption
    pub subtotal: Decimal,
    pub points_redeemed: i64,
    /// Amount charged: subtotal minus redeemed points, never negative
    pub total: Decimal,
    /// Recipe cost of everything sold
    pub cost_total: Decimal,
    pub points_awarded: i64,
    pub created_at: DateTime<Utc>,
}

/// One line of a sale, owned by the sale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub position: i32,
    pub product_id: Option<Uuid>,
    /// Product name at the time of sale
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// A requested line of a new sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Defaults to the product's current price
    pub unit_price: Option<Decimal>,
}

/// A sale with its lines
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithLines {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round2(unit_price * Decimal::from(quantity))
}

/// Subtotal of a sale from (unit price, quantity) pairs
pub fn sale_subtotal<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    round2(
        lines
            .into_iter()
            .map(|(price, qty)| price * Decimal::from(qty))
            .sum(),
    )
}
