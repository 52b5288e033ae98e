//! Inventory (supply) models and unit conversion

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ParseEnumError;

/// A raw inventory item consumed by products (coffee beans, milk, cups)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supply {
    pub id: Uuid,
    pub name: String,
    /// Quantity on hand, expressed in `unit`. Never negative.
    pub quantity: Decimal,
    /// Minimum-stock threshold
    pub min_quantity: Decimal,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub unit: Unit,
    pub unit_cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supply {
    /// Low-stock flag, derived on read: at or below the minimum
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.quantity, self.min_quantity)
    }

    /// Value of the stock on hand
    pub fn stock_value(&self) -> Decimal {
        self.quantity * self.unit_cost
    }

    pub fn into_view(self) -> SupplyView {
        let low_stock = self.is_low_stock();
        SupplyView {
            supply: self,
            low_stock,
        }
    }
}

pub fn is_low_stock(quantity: Decimal, min_quantity: Decimal) -> bool {
    quantity <= min_quantity
}

/// A supply as returned to clients, with its low-stock flag
#[derive(Debug, Clone, Serialize)]
pub struct SupplyView {
    #[serde(flatten)]
    pub supply: Supply,
    pub low_stock: bool,
}

/// Measurement unit of a supply or recipe quantity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Kg,
    G,
    L,
    Ml,
    Unit,
    Dozen,
}

/// Physical dimension of a unit; conversion only happens within one dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Volume,
    Count,
}

impl Unit {
    pub const ALL: [Unit; 6] = [Unit::Kg, Unit::G, Unit::L, Unit::Ml, Unit::Unit, Unit::Dozen];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::Unit => "unit",
            Unit::Dozen => "dozen",
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Kg | Unit::G => Dimension::Mass,
            Unit::L | Unit::Ml => Dimension::Volume,
            Unit::Unit | Unit::Dozen => Dimension::Count,
        }
    }

    /// How many base units (g, ml, unit) one of this unit holds
    fn base_factor(&self) -> Decimal {
        match self {
            Unit::Kg | Unit::L => Decimal::from(1000),
            Unit::Dozen => Decimal::from(12),
            Unit::G | Unit::Ml | Unit::Unit => Decimal::ONE,
        }
    }

    pub fn is_compatible_with(&self, other: Unit) -> bool {
        self.dimension() == other.dimension()
    }
}

/// Convert `quantity` from one unit to another of the same dimension.
///
/// Returns `None` when the units measure different things (mass vs volume).
pub fn convert_quantity(quantity: Decimal, from: Unit, to: Unit) -> Option<Decimal> {
    if from == to {
        return Some(quantity);
    }
    if !from.is_compatible_with(to) {
        return None;
    }
    Some(quantity * from.base_factor() / to.base_factor())
}

impl std::str::FromStr for Unit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("unit", s))
    }
}

impl TryFrom<String> for Unit {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_unit_is_identity() {
        let q = Decimal::new(185, 1);
        assert_eq!(convert_quantity(q, Unit::G, Unit::G), Some(q));
    }

    #[test]
    fn test_mass_and_volume_conversions() {
        assert_eq!(
            convert_quantity(Decimal::from(18), Unit::G, Unit::Kg),
            Some(Decimal::new(18, 3))
        );
        assert_eq!(
            convert_quantity(Decimal::new(25, 2), Unit::L, Unit::Ml),
            Some(Decimal::from(250))
        );
        assert_eq!(
            convert_quantity(Decimal::from(2), Unit::Dozen, Unit::Unit),
            Some(Decimal::from(24))
        );
    }

    #[test]
    fn test_incompatible_units() {
        assert_eq!(convert_quantity(Decimal::ONE, Unit::G, Unit::Ml), None);
        assert_eq!(convert_quantity(Decimal::ONE, Unit::Unit, Unit::Kg), None);
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(is_low_stock(Decimal::from(5), Decimal::from(5)));
        assert!(is_low_stock(Decimal::from(4), Decimal::from(5)));
        assert!(!is_low_stock(Decimal::from(6), Decimal::from(5)));
    }

    #[test]
    fn test_unit_parse_round_trip_names() {
        for unit in Unit::ALL {
            assert_eq!(unit.as_str().parse::<Unit>(), Ok(unit));
        }
        assert!("litre".parse::<Unit>().is_err());
    }
}
