//! Stock deduction tests
//!
//! Covers sale planning against recipes:
//! - a sale that would overdraw any supply is rejected as a whole
//! - accepted sales deduct exactly the recipe consumption
//! - the coffee beans example (500 g stock, 18 g per cup)

use std::collections::HashMap;

use cafe_backend::error::AppError;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    fits_scale, plan_stock_deduction, validate_recipe_item, PlannedLine, PlannedProduct, RecipeItem,
    StockError, SupplyLevel, Unit, STOCK_QUANTITY_SCALE,
};
use uuid::Uuid;

fn supply(name: &str, quantity: Decimal, min_quantity: Decimal, unit: Unit) -> SupplyLevel {
    SupplyLevel {
        id: Uuid::new_v4(),
        name: name.to_string(),
        quantity,
        min_quantity,
        unit,
    }
}

fn product(name: &str, recipe: &[(&SupplyLevel, Decimal, Unit)]) -> PlannedProduct {
    let id = Uuid::new_v4();
    PlannedProduct {
        id,
        name: name.to_string(),
        is_active: true,
        recipe: recipe
            .iter()
            .map(|(supply, quantity, unit)| RecipeItem {
                id: Uuid::new_v4(),
                product_id: id,
                supply_id: supply.id,
                quantity: *quantity,
                unit: *unit,
            })
            .collect(),
    }
}

fn by_id<T, F: Fn(&T) -> Uuid>(items: Vec<T>, id: F) -> HashMap<Uuid, T> {
    items.into_iter().map(|item| (id(&item), item)).collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn coffee_setup() -> (SupplyLevel, PlannedProduct) {
        let beans = supply("Coffee beans", Decimal::from(500), Decimal::from(50), Unit::G);
        let espresso = product("Espresso", &[(&beans, Decimal::from(18), Unit::G)]);
        (beans, espresso)
    }

    /// 27 cups need 486 g of the 500 g in stock
    #[test]
    fn test_coffee_example_succeeds_at_27_cups() {
        let (beans, espresso) = coffee_setup();
        let lines = [PlannedLine { product_id: espresso.id, quantity: 27 }];
        let beans_id = beans.id;

        let plan = plan_stock_deduction(
            &lines,
            &by_id(vec![espresso], |p| p.id),
            &by_id(vec![beans], |s| s.id),
        )
        .unwrap();

        assert_eq!(plan.required_for(beans_id), Decimal::from(486));
        assert_eq!(plan.deductions[0].remaining, Decimal::from(14));
        assert!(plan.deductions[0].low_stock);
    }

    /// 28 cups need 504 g: rejected, naming the supply
    #[test]
    fn test_coffee_example_rejected_at_28_cups() {
        let (beans, espresso) = coffee_setup();
        let lines = [PlannedLine { product_id: espresso.id, quantity: 28 }];

        let err = plan_stock_deduction(
            &lines,
            &by_id(vec![espresso], |p| p.id),
            &by_id(vec![beans], |s| s.id),
        )
        .unwrap_err();

        match &err {
            StockError::InsufficientStock { supply_name, required, available, .. } => {
                assert_eq!(supply_name, "Coffee beans");
                assert_eq!(*required, Decimal::from(504));
                assert_eq!(*available, Decimal::from(500));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let app_error = AppError::from(err);
        assert_eq!(app_error.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(app_error.code(), "INSUFFICIENT_STOCK");
    }

    /// Two lines drawing on one supply are checked together
    #[test]
    fn test_lines_sharing_a_supply_are_aggregated() {
        let milk = supply("Milk", Decimal::from(1), Decimal::ZERO, Unit::L);
        let latte = product("Latte", &[(&milk, Decimal::from(250), Unit::Ml)]);
        let cappuccino = product("Cappuccino", &[(&milk, Decimal::from(150), Unit::Ml)]);
        let lines = [
            PlannedLine { product_id: latte.id, quantity: 2 },
            PlannedLine { product_id: cappuccino.id, quantity: 4 },
        ];

        // 0.5 l + 0.6 l > 1 l even though each line fits on its own
        let err = plan_stock_deduction(
            &lines,
            &by_id(vec![latte, cappuccino], |p| p.id),
            &by_id(vec![milk], |s| s.id),
        )
        .unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { .. }));
    }

    #[test]
    fn test_dozen_recipe_against_unit_supply() {
        let eggs = supply("Eggs", Decimal::from(30), Decimal::from(6), Unit::Unit);
        let tray = product("Egg tray", &[(&eggs, Decimal::from(1), Unit::Dozen)]);
        let eggs_id = eggs.id;
        let lines = [PlannedLine { product_id: tray.id, quantity: 2 }];

        let plan = plan_stock_deduction(&lines, &by_id(vec![tray], |p| p.id), &by_id(vec![eggs], |s| s.id)).unwrap();
        assert_eq!(plan.required_for(eggs_id), Decimal::from(24));
    }

    /// Sub-gram recipes against a kg supply keep every digit of the deduction
    #[test]
    fn test_gram_recipe_against_kg_supply_keeps_precision() {
        let sugar = supply("Sugar", Decimal::from(3), Decimal::ONE, Unit::Kg);
        let sugar_id = sugar.id;
        let sweet = product("Sweet tea", &[(&sugar, Decimal::new(25, 1), Unit::G)]);
        let lines = [PlannedLine { product_id: sweet.id, quantity: 1 }];

        let plan = plan_stock_deduction(&lines, &by_id(vec![sweet], |p| p.id), &by_id(vec![sugar], |s| s.id)).unwrap();
        let deduction = &plan.deductions[0];
        assert_eq!(plan.required_for(sugar_id), Decimal::new(25, 4));
        assert_eq!(deduction.remaining, Decimal::new(29975, 4));
        assert!(fits_scale(deduction.required, STOCK_QUANTITY_SCALE));
        assert!(fits_scale(deduction.remaining, STOCK_QUANTITY_SCALE));
    }

    #[test]
    fn test_half_gram_recipe_moves_kg_stock() {
        let sugar = supply("Sugar", Decimal::ONE, Decimal::ZERO, Unit::Kg);
        let pinch = product("Pinch", &[(&sugar, Decimal::new(5, 1), Unit::G)]);
        let lines = [PlannedLine { product_id: pinch.id, quantity: 1 }];

        let plan = plan_stock_deduction(&lines, &by_id(vec![pinch], |p| p.id), &by_id(vec![sugar], |s| s.id)).unwrap();
        assert_eq!(plan.deductions[0].remaining, Decimal::new(9995, 4));
    }

    #[test]
    fn test_recipe_finer_than_stock_precision_is_rejected() {
        assert!(validate_recipe_item(Decimal::new(5, 1), Unit::G, Unit::Kg).is_ok());
        assert!(validate_recipe_item(Decimal::new(5, 4), Unit::G, Unit::Kg).is_err());
    }

    #[test]
    fn test_product_without_recipe_deducts_nothing() {
        let water = product("Bottled water", &[]);
        let lines = [PlannedLine { product_id: water.id, quantity: 3 }];

        let plan = plan_stock_deduction(&lines, &by_id(vec![water], |p| p.id), &HashMap::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_inactive_product_is_rejected() {
        let mut retired = product("Retired", &[]);
        retired.is_active = false;
        let lines = [PlannedLine { product_id: retired.id, quantity: 1 }];

        let err = plan_stock_deduction(&lines, &by_id(vec![retired], |p| p.id), &HashMap::new()).unwrap_err();
        assert!(matches!(err, StockError::InactiveProduct { .. }));
        assert_eq!(AppError::from(err).status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unknown_product_maps_to_not_found() {
        let lines = [PlannedLine { product_id: Uuid::new_v4(), quantity: 1 }];
        let err = plan_stock_deduction(&lines, &HashMap::new(), &HashMap::new()).unwrap_err();
        assert_eq!(AppError::from(err).status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_empty_sale_is_a_validation_error() {
        let err = plan_stock_deduction(&[], &HashMap::new(), &HashMap::new()).unwrap_err();
        assert_eq!(err, StockError::EmptySale);
        assert_eq!(AppError::from(err).status(), axum::http::StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Stock between 0 and 5000 grams
    fn stock_strategy() -> impl Strategy<Value = i64> {
        0i64..=5000i64
    }

    /// Consumption per unit sold, 1 to 50 grams
    fn per_unit_strategy() -> impl Strategy<Value = i64> {
        1i64..=50i64
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A plan exists exactly when the whole sale fits in stock, and then
        /// the deduction equals quantity times consumption
        #[test]
        fn prop_plan_matches_recipe_consumption(
            stock in stock_strategy(),
            per_unit in per_unit_strategy(),
            quantities in prop::collection::vec(1i32..=20i32, 1..5)
        ) {
            let beans = supply("Coffee beans", Decimal::from(stock), Decimal::ZERO, Unit::G);
            let beans_id = beans.id;
            let espresso = product("Espresso", &[(&beans, Decimal::from(per_unit), Unit::G)]);
            let lines: Vec<PlannedLine> = quantities
                .iter()
                .map(|q| PlannedLine { product_id: espresso.id, quantity: *q })
                .collect();
            let expected: i64 = quantities.iter().map(|q| i64::from(*q) * per_unit).sum();

            let result = plan_stock_deduction(
                &lines,
                &by_id(vec![espresso], |p| p.id),
                &by_id(vec![beans], |s| s.id),
            );

            if expected > stock {
                let is_insufficient = matches!(result, Err(StockError::InsufficientStock { .. }));
                prop_assert!(is_insufficient);
            } else {
                let plan = result.unwrap();
                prop_assert_eq!(plan.required_for(beans_id), Decimal::from(expected));
                prop_assert_eq!(plan.total_required(), Decimal::from(expected));
                prop_assert_eq!(plan.deductions[0].remaining, Decimal::from(stock - expected));
            }
        }

        /// Remaining stock is never negative in an accepted plan
        #[test]
        fn prop_accepted_plans_never_overdraw(
            stocks in prop::collection::vec(stock_strategy(), 1..4),
            per_unit in per_unit_strategy(),
            quantity in 1i32..=100i32
        ) {
            let supplies: Vec<SupplyLevel> = stocks
                .iter()
                .enumerate()
                .map(|(i, s)| supply(&format!("Supply {}", i), Decimal::from(*s), Decimal::ZERO, Unit::G))
                .collect();
            let recipe: Vec<(&SupplyLevel, Decimal, Unit)> =
                supplies.iter().map(|s| (s, Decimal::from(per_unit), Unit::G)).collect();
            let item = product("Item", &recipe);
            let lines = [PlannedLine { product_id: item.id, quantity }];

            if let Ok(plan) = plan_stock_deduction(
                &lines,
                &by_id(vec![item.clone()], |p| p.id),
                &by_id(supplies.clone(), |s| s.id),
            ) {
                for deduction in &plan.deductions {
                    prop_assert!(deduction.remaining >= Decimal::ZERO);
                }
            }
        }

        /// Gram recipes with up to 3 decimals deducted from a kg supply stay
        /// within stock precision, so the stored decrease equals the plan
        #[test]
        fn prop_converted_deductions_fit_stock_precision(
            milligrams in 1i64..=50_000i64,
            stock_grams in 0i64..=100_000i64,
            quantity in 1i32..=100i32
        ) {
            let flour = supply("Flour", Decimal::new(stock_grams, 3), Decimal::ZERO, Unit::Kg);
            let flour_id = flour.id;
            let per_unit = Decimal::new(milligrams, 3);
            prop_assert!(validate_recipe_item(per_unit, Unit::G, Unit::Kg).is_ok());
            let bread = product("Bread", &[(&flour, per_unit, Unit::G)]);
            let lines = [PlannedLine { product_id: bread.id, quantity }];

            if let Ok(plan) = plan_stock_deduction(
                &lines,
                &by_id(vec![bread], |p| p.id),
                &by_id(vec![flour], |s| s.id),
            ) {
                let deduction = &plan.deductions[0];
                prop_assert!(fits_scale(deduction.required, STOCK_QUANTITY_SCALE));
                prop_assert!(fits_scale(deduction.remaining, STOCK_QUANTITY_SCALE));
                prop_assert_eq!(
                    plan.required_for(flour_id),
                    per_unit * Decimal::from(quantity) / Decimal::from(1000)
                );
            }
        }
    }
}
