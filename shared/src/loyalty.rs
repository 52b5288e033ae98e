//! Loyalty points

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Points earned for a sale of `total`: `floor(total * rate)`, never negative
pub fn accrue_points(total: Decimal, rate: Decimal) -> i64 {
    if total <= Decimal::ZERO || rate <= Decimal::ZERO {
        return 0;
    }
    (total * rate).floor().to_i64().unwrap_or(0)
}

/// Points that can be spent on a sale: one point buys one currency unit, and
/// only whole units of the subtotal can be paid with points
pub fn redeemable_points(balance: i64, subtotal: Decimal) -> i64 {
    let whole_units = subtotal.floor().to_i64().unwrap_or(0).max(0);
    balance.max(0).min(whole_units)
}

/// Money and points outcome of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleSettlement {
    pub subtotal: Decimal,
    pub points_redeemed: i64,
    pub total: Decimal,
    pub points_awarded: i64,
}

impl SaleSettlement {
    /// Customer balance after the sale
    pub fn balance_after(&self, balance_before: i64) -> i64 {
        (balance_before - self.points_redeemed).max(0) + self.points_awarded
    }
}

/// Settle a sale.
///
/// `customer_balance` is `None` for anonymous sales, which neither redeem nor
/// earn points. Accrual applies to the amount actually charged.
pub fn settle_sale(
    subtotal: Decimal,
    customer_balance: Option<i64>,
    redeem: bool,
    rate: Decimal,
) -> SaleSettlement {
    let Some(balance) = customer_balance else {
        return SaleSettlement {
            subtotal,
            points_redeemed: 0,
            total: subtotal,
            points_awarded: 0,
        };
    };

    let points_redeemed = if redeem {
        redeemable_points(balance, subtotal)
    } else {
        0
    };
    let total = (subtotal - Decimal::from(points_redeemed)).max(Decimal::ZERO);

    SaleSettlement {
        subtotal,
        points_redeemed,
        total,
        points_awarded: accrue_points(total, rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate() -> Decimal {
        Decimal::new(1, 1)
    }

    #[test]
    fn test_accrual_truncates() {
        assert_eq!(accrue_points(Decimal::new(1999, 2), rate()), 1);
        assert_eq!(accrue_points(Decimal::from(20), rate()), 2);
        assert_eq!(accrue_points(Decimal::new(999, 2), rate()), 0);
        assert_eq!(accrue_points(Decimal::ZERO, rate()), 0);
        assert_eq!(accrue_points(Decimal::from(-5), rate()), 0);
    }

    #[test]
    fn test_redeemable_is_capped_by_whole_subtotal() {
        assert_eq!(redeemable_points(50, Decimal::new(1275, 2)), 12);
        assert_eq!(redeemable_points(5, Decimal::new(1275, 2)), 5);
        assert_eq!(redeemable_points(-3, Decimal::from(10)), 0);
    }

    #[test]
    fn test_anonymous_sale_earns_nothing() {
        let s = settle_sale(Decimal::from(40), None, true, rate());
        assert_eq!(s.total, Decimal::from(40));
        assert_eq!(s.points_awarded, 0);
        assert_eq!(s.points_redeemed, 0);
    }

    #[test]
    fn test_sale_without_redemption() {
        let s = settle_sale(Decimal::new(4550, 2), Some(100), false, rate());
        assert_eq!(s.total, Decimal::new(4550, 2));
        assert_eq!(s.points_awarded, 4);
        assert_eq!(s.balance_after(100), 104);
    }

    #[test]
    fn test_sale_with_redemption() {
        let s = settle_sale(Decimal::new(4550, 2), Some(30), true, rate());
        assert_eq!(s.points_redeemed, 30);
        assert_eq!(s.total, Decimal::new(1550, 2));
        assert_eq!(s.points_awarded, 1);
        assert_eq!(s.balance_after(30), 1);
    }
}
