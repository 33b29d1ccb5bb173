use rust_decimal::Decimal;

use crate::constants::{MONTHS_PER_YEAR, PERCENT_SCALE};

/// Divides `numerator` by `denominator`, returning `None` when the
/// denominator is zero or missing, or when the division overflows.
///
/// `None` is the "undefined" marker used throughout the engine. Callers must
/// never substitute zero for it.
pub fn safe_div(numerator: Decimal, denominator: Option<Decimal>) -> Option<Decimal> {
    match denominator {
        Some(d) if !d.is_zero() => numerator.checked_div(d),
        _ => None,
    }
}

/// `part / whole * 100`, undefined unless `whole` is strictly positive.
pub fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole <= Decimal::ZERO {
        return None;
    }
    safe_div(part, Some(whole)).and_then(|ratio| ratio.checked_mul(Decimal::from(PERCENT_SCALE)))
}

/// Linear monthly projection of a yearly quantity.
pub fn per_month(yearly: Decimal) -> Decimal {
    yearly / Decimal::from(MONTHS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_safe_div_zero_denominator_is_undefined() {
        assert_eq!(safe_div(dec!(10), Some(Decimal::ZERO)), None);
        assert_eq!(safe_div(dec!(10), None), None);
    }

    #[test]
    fn test_safe_div_regular() {
        assert_eq!(safe_div(dec!(1000), Some(dec!(10))), Some(dec!(100)));
    }

    #[test]
    fn test_percent_of_requires_positive_whole() {
        assert_eq!(percent_of(dec!(1), dec!(0)), None);
        assert_eq!(percent_of(dec!(1), dec!(-4)), None);
        assert_eq!(percent_of(dec!(1000), dec!(4000)), Some(dec!(25)));
    }

    #[test]
    fn test_per_month() {
        assert_eq!(per_month(dec!(24)), dec!(2));
    }
}
