//! Loyalty points tests
//!
//! - points after a sale of total T equal floor(T × rate)
//! - repeating a sale adds the same increment again
//! - redemption is opt-in and never charges below zero

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{accrue_points, settle_sale, line_total, sale_subtotal};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_default_rate_gives_one_point_per_ten() {
        let rate = dec("0.1");
        assert_eq!(accrue_points(dec("99.99"), rate), 9);
        assert_eq!(accrue_points(dec("100.00"), rate), 10);
        assert_eq!(accrue_points(dec("9.99"), rate), 0);
    }

    #[test]
    fn test_anonymous_sale_earns_nothing() {
        let settlement = settle_sale(dec("45.00"), None, true, dec("0.1"));
        assert_eq!(settlement.total, dec("45.00"));
        assert_eq!(settlement.points_redeemed, 0);
        assert_eq!(settlement.points_awarded, 0);
    }

    #[test]
    fn test_redemption_is_opt_in() {
        let without = settle_sale(dec("45.00"), Some(30), false, dec("0.1"));
        assert_eq!(without.total, dec("45.00"));
        assert_eq!(without.points_awarded, 4);
        assert_eq!(without.balance_after(30), 34);

        let with = settle_sale(dec("45.00"), Some(30), true, dec("0.1"));
        assert_eq!(with.points_redeemed, 30);
        assert_eq!(with.total, dec("15.00"));
        assert_eq!(with.points_awarded, 1);
        assert_eq!(with.balance_after(30), 1);
    }

    #[test]
    fn test_redemption_limited_to_whole_subtotal() {
        let settlement = settle_sale(dec("7.50"), Some(100), true, dec("0.1"));
        assert_eq!(settlement.points_redeemed, 7);
        assert_eq!(settlement.total, dec("0.50"));
        assert_eq!(settlement.balance_after(100), 93);
    }

    #[test]
    fn test_sale_totals() {
        let lines = [(dec("3.50"), 2), (dec("5.50"), 1)];
        assert_eq!(sale_subtotal(lines), dec("12.50"));
        assert_eq!(line_total(dec("3.50"), 2), dec("7.00"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Money amounts 0.00 to 5000.00
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=500_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Rates 0.00 to 1.00
    fn rate_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Without redemption, a sale of total T awards floor(T × rate)
        #[test]
        fn prop_points_are_truncated_product(
            total in amount_strategy(),
            rate in rate_strategy(),
            balance in 0i64..10_000i64
        ) {
            let settlement = settle_sale(total, Some(balance), false, rate);
            prop_assert_eq!(settlement.total, total);
            prop_assert_eq!(Decimal::from(settlement.points_awarded), (total * rate).floor());
            prop_assert_eq!(settlement.balance_after(balance), balance + settlement.points_awarded);
        }

        /// Two identical sales add the same increment twice
        #[test]
        fn prop_repeated_sale_adds_same_increment(
            total in amount_strategy(),
            rate in rate_strategy(),
            balance in 0i64..10_000i64
        ) {
            let first = settle_sale(total, Some(balance), false, rate);
            let after_first = first.balance_after(balance);
            let second = settle_sale(total, Some(after_first), false, rate);
            let after_second = second.balance_after(after_first);

            prop_assert_eq!(first.points_awarded, second.points_awarded);
            prop_assert_eq!(after_second - balance, 2 * first.points_awarded);
        }

        /// Redemption never makes the total or the balance negative
        #[test]
        fn prop_redemption_stays_non_negative(
            subtotal in amount_strategy(),
            rate in rate_strategy(),
            balance in 0i64..10_000i64
        ) {
            let settlement = settle_sale(subtotal, Some(balance), true, rate);
            prop_assert!(settlement.total >= Decimal::ZERO);
            prop_assert!(settlement.points_redeemed <= balance);
            prop_assert!(settlement.balance_after(balance) >= 0);
            prop_assert_eq!(settlement.total, subtotal - Decimal::from(settlement.points_redeemed));
        }
    }
}
