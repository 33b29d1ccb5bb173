use rust_decimal::Decimal;

use super::targets_model::TargetMetrics;
use crate::aggregation::SalesTotals;
use crate::utils::{per_month, percent_of};

/// Derives target metrics from base sales and an effective quantity delta.
///
/// A delta on a class with no price history adds quantity but no money.
pub fn derive_metrics(base: SalesTotals, delta_qty: Decimal) -> TargetMetrics {
    let avg_price = base.avg_price();
    let delta_money = avg_price
        .and_then(|price| delta_qty.checked_mul(price))
        .unwrap_or(Decimal::ZERO);
    let target_money = base.sales_money + delta_money;
    let target_qty = base.sales_qty + delta_qty;

    TargetMetrics {
        sales_money: base.sales_money,
        sales_qty: base.sales_qty,
        avg_price,
        delta_qty,
        delta_money,
        target_money,
        target_qty,
        monthly_avg_2025_qty: per_month(base.sales_qty),
        monthly_add_qty: per_month(delta_qty),
        monthly_target_qty: per_month(target_qty),
        variance_qty: target_qty - base.sales_qty,
        attainment_pct: percent_of(base.sales_money, target_money),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn totals(money: Decimal, qty: Decimal) -> SalesTotals {
        SalesTotals {
            sales_money: money,
            sales_qty: qty,
        }
    }

    #[test]
    fn test_priced_class_gains_money() {
        let m = derive_metrics(totals(dec!(1000), dec!(10)), dec!(2));
        assert_eq!(m.avg_price, Some(dec!(100)));
        assert_eq!(m.delta_money, dec!(200));
        assert_eq!(m.target_money, dec!(1200));
        assert_eq!(m.target_qty, dec!(12));
        assert_eq!(m.variance_qty, dec!(2));
        assert_eq!(m.monthly_target_qty, dec!(1));
        assert_eq!(m.monthly_add_qty, dec!(2) / dec!(12));
    }

    #[test]
    fn test_unpriced_class_gains_no_money() {
        let m = derive_metrics(totals(dec!(0), dec!(0)), dec!(5));
        assert_eq!(m.avg_price, None);
        assert_eq!(m.delta_money, Decimal::ZERO);
        assert_eq!(m.target_money, Decimal::ZERO);
        assert_eq!(m.target_qty, dec!(5));
        assert_eq!(m.attainment_pct, None);
    }

    #[test]
    fn test_attainment_is_sales_over_target() {
        let m = derive_metrics(totals(dec!(1000), dec!(10)), dec!(10));
        assert_eq!(m.target_money, dec!(2000));
        assert_eq!(m.attainment_pct, Some(dec!(50)));
    }

    #[test]
    fn test_negative_delta_reduces_target() {
        let m = derive_metrics(totals(dec!(1000), dec!(10)), dec!(-4));
        assert_eq!(m.delta_money, dec!(-400));
        assert_eq!(m.target_money, dec!(600));
        assert_eq!(m.target_qty, dec!(6));
    }
}
