//! Validation utilities for the Cafeteria Administration backend
//!
//! Every function returns a short human readable message on failure; the
//! backend attaches the offending field name when mapping it to an API error.

use std::collections::HashSet;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{convert_quantity, Unit};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Decimal places stored for recipe quantities
pub const RECIPE_QUANTITY_SCALE: u32 = 3;
/// Decimal places stored for supply stock levels. A recipe quantity in g or ml
/// converted into kg or l needs three more places than the recipe itself.
pub const STOCK_QUANTITY_SCALE: u32 = 6;

pub const MAX_SALE_LINE_QUANTITY: i32 = 10_000;
/// Largest unit price a product or sale line can carry: 99999999.99
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);
/// Largest sale or line amount that can be stored: 9999999999.99
pub const MAX_SALE_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

// ============================================================================
// General Validations
// ============================================================================

/// Validate a display name (employee, supply, product, customer)
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required");
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err("Name must be at most 100 characters");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format");
    }
    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate a phone number: 7 to 15 digits, optional leading `+`, spaces and dashes allowed
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err("Phone number may only contain digits, spaces and dashes");
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err("Phone number must have between 7 and 15 digits");
    }
    Ok(())
}

/// Validate the attendance kiosk password
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 4 characters");
    }
    Ok(())
}

// ============================================================================
// Amount Validations
// ============================================================================

/// Prices, rates, costs and stock levels
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value cannot be negative");
    }
    Ok(())
}

pub fn validate_positive(value: Decimal) -> Result<(), &'static str> {
    if value <= Decimal::ZERO {
        return Err("Value must be greater than zero");
    }
    Ok(())
}

/// Whether `value` is representable with at most `scale` decimal places
pub fn fits_scale(value: Decimal, scale: u32) -> bool {
    value.normalize().scale() <= scale
}

/// Supply quantity and minimum quantity
pub fn validate_stock_quantity(value: Decimal) -> Result<(), &'static str> {
    validate_non_negative(value)?;
    if !fits_scale(value, STOCK_QUANTITY_SCALE) {
        return Err("Stock quantities allow at most 6 decimal places");
    }
    Ok(())
}

pub fn validate_price(value: Decimal) -> Result<(), &'static str> {
    validate_non_negative(value)?;
    if value > MAX_PRICE {
        return Err("Price is too large");
    }
    Ok(())
}

pub fn validate_sale_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    if quantity > MAX_SALE_LINE_QUANTITY {
        return Err("Quantity cannot exceed 10000 per line");
    }
    Ok(())
}

/// Line totals, subtotal and cost of a sale
pub fn validate_sale_amount(value: Decimal) -> Result<(), &'static str> {
    if value > MAX_SALE_AMOUNT {
        return Err("Sale amount is too large");
    }
    Ok(())
}

// ============================================================================
// Schedule Validations
// ============================================================================

/// A shift must have a non-zero length; an end before the start crosses midnight
pub fn validate_shift(start: NaiveTime, end: NaiveTime) -> Result<(), &'static str> {
    if start == end {
        return Err("Shift start and end cannot be equal");
    }
    Ok(())
}

// ============================================================================
// Recipe Validations
// ============================================================================

/// Supplies are stocked in kg, g, l, ml or unit; dozens exist only in recipes
pub fn validate_supply_unit(unit: Unit) -> Result<(), &'static str> {
    if unit == Unit::Dozen {
        return Err("Supplies cannot be stocked in dozens");
    }
    Ok(())
}

/// Validate one recipe line against the unit its supply is stocked in
pub fn validate_recipe_item(
    quantity: Decimal,
    unit: Unit,
    supply_unit: Unit,
) -> Result<(), &'static str> {
    validate_positive(quantity).map_err(|_| "Recipe quantity must be greater than zero")?;
    if !fits_scale(quantity, RECIPE_QUANTITY_SCALE) {
        return Err("Recipe quantities allow at most 3 decimal places");
    }
    match convert_quantity(quantity, unit, supply_unit) {
        None => Err("Recipe unit is not compatible with the supply unit"),
        Some(per_unit) if !fits_scale(per_unit, STOCK_QUANTITY_SCALE) => {
            Err("Recipe quantity is finer than the supply's stock precision")
        }
        Some(_) => Ok(()),
    }
}

/// Supplies that appear more than once in a recipe, in first-repeat order
pub fn duplicate_recipe_supplies<I>(supply_ids: I) -> Vec<Uuid>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for supply_id in supply_ids {
        if !seen.insert(supply_id) && !duplicates.contains(&supply_id) {
            duplicates.push(supply_id);
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ana Torres").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("ana@cafe.com").is_ok());
        assert!(validate_email("a.b@mail.example.org").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@cafe.com").is_err());
        assert!(validate_email("ana@cafe").is_err());
        assert!(validate_email("ana @cafe.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("555-1234").is_ok());
        assert!(validate_phone("+56 9 1234 5678").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("1234").is_ok());
        assert!(validate_password("123").is_err());
    }

    // ========================================================================
    // Amount Validation Tests
    // ========================================================================

    #[test]
    fn test_amounts() {
        assert!(validate_non_negative(Decimal::ZERO).is_ok());
        assert!(validate_non_negative(Decimal::new(-1, 2)).is_err());
        assert!(validate_positive(Decimal::ZERO).is_err());
        assert!(validate_positive(Decimal::new(1, 3)).is_ok());
        assert!(validate_sale_quantity(0).is_err());
        assert!(validate_sale_quantity(1).is_ok());
        assert!(validate_sale_quantity(MAX_SALE_LINE_QUANTITY).is_ok());
        assert!(validate_sale_quantity(2_000_000_000).is_err());
    }

    #[test]
    fn test_amount_limits_match_column_ranges() {
        assert_eq!(MAX_PRICE.to_string(), "99999999.99");
        assert_eq!(MAX_SALE_AMOUNT.to_string(), "9999999999.99");
        assert!(validate_price(MAX_PRICE).is_ok());
        assert!(validate_price(MAX_PRICE + Decimal::new(1, 2)).is_err());
        assert!(validate_sale_amount(MAX_SALE_AMOUNT).is_ok());
        assert!(validate_sale_amount(Decimal::from(200_000_000_000i64)).is_err());
    }

    #[test]
    fn test_stock_quantity_scale() {
        assert!(validate_stock_quantity(Decimal::new(2_997_500, 6)).is_ok());
        assert!(validate_stock_quantity(Decimal::new(25, 7)).is_err());
        // Trailing zeros do not count
        assert!(validate_stock_quantity(Decimal::new(1_000_000_000, 9)).is_ok());
    }

    // ========================================================================
    // Schedule and Recipe Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_shift() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        assert!(validate_shift(t(8), t(16)).is_ok());
        assert!(validate_shift(t(22), t(6)).is_ok());
        assert!(validate_shift(t(8), t(8)).is_err());
    }

    #[test]
    fn test_validate_recipe_item() {
        assert!(validate_recipe_item(Decimal::from(18), Unit::G, Unit::Kg).is_ok());
        assert!(validate_recipe_item(Decimal::ZERO, Unit::G, Unit::Kg).is_err());
        assert!(validate_recipe_item(Decimal::ONE, Unit::Ml, Unit::Kg).is_err());
        assert!(validate_recipe_item(Decimal::new(5, 1), Unit::G, Unit::Kg).is_ok());
        assert!(validate_recipe_item(Decimal::new(1, 3), Unit::Ml, Unit::L).is_ok());
        assert!(validate_recipe_item(Decimal::new(25, 4), Unit::G, Unit::Kg).is_err());
        assert!(validate_supply_unit(Unit::Dozen).is_err());
        assert!(validate_supply_unit(Unit::Unit).is_ok());
    }

    #[test]
    fn test_duplicate_recipe_supplies() {
        let beans = Uuid::new_v4();
        let milk = Uuid::new_v4();
        assert_eq!(duplicate_recipe_supplies([beans, milk, beans, beans]), vec![beans]);
        assert!(duplicate_recipe_supplies([beans, milk]).is_empty());
    }

    // ========================================================================
    // Property Tests
    // ========================================================================

    mod properties {
        use crate::validation::{validate_name, validate_phone, MAX_NAME_LENGTH};
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// Local numbers with optional country code and separators are accepted
            #[test]
            fn prop_formatted_phones_are_valid(phone in "(\\+51 )?9[0-9]{2}[ -]?[0-9]{3}[ -]?[0-9]{3}") {
                prop_assert!(validate_phone(&phone).is_ok());
            }

            /// Any letter makes a phone number invalid
            #[test]
            fn prop_phones_with_letters_are_invalid(prefix in "[0-9]{7,10}", letter in "[a-zA-Z]") {
                let phone = format!("{}{}", prefix, letter);
                prop_assert!(validate_phone(&phone).is_err());
            }

            /// Names up to the limit pass once trimmed, longer ones fail
            #[test]
            fn prop_name_length_limit(name in "[A-Za-z]{1,120}") {
                prop_assert_eq!(validate_name(&name).is_ok(), name.len() <= MAX_NAME_LENGTH);
            }
        }
    }
}
