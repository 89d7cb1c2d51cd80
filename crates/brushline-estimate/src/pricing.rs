//! Price adjustments and discounting
//!
//! All adjustments are deltas against the same subtotal, applied
//! additively. None of them compounds on another, so reordering the
//! adjustment lines can never change the total. The discount comes off
//! last, against the adjusted total.

use crate::input::{Season, Urgency};
use crate::rates::RateTable;
use brushline_core::NumericContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The pricing waterfall from subtotal to final total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    /// Materials plus labor, before adjustments
    pub subtotal: Decimal,
    pub complexity_adjustment: Decimal,
    pub urgency_adjustment: Decimal,
    pub seasonal_adjustment: Decimal,
    pub adjusted_total: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

/// Apply adjustments and discount to a materials-plus-labor subtotal
#[allow(clippy::too_many_arguments)]
pub fn price_estimate(
    numeric: &NumericContext,
    rates: &RateTable,
    subtotal: Decimal,
    average_complexity: Decimal,
    urgency: Urgency,
    season: Season,
    discount_percent: Decimal,
) -> PricingBreakdown {
    let complexity_rate = numeric.mul(
        numeric.sub(average_complexity, Decimal::ONE).max(Decimal::ZERO),
        rates.complexity_rate_step,
    );

    let complexity_adjustment = numeric.round(numeric.mul(subtotal, complexity_rate), 2);
    let urgency_adjustment = numeric.round(numeric.mul(subtotal, rates.urgency_rate(urgency)), 2);
    let seasonal_adjustment = numeric.round(numeric.mul(subtotal, rates.season_rate(season)), 2);

    let adjusted_total = numeric.add(
        numeric.add(subtotal, complexity_adjustment),
        numeric.add(urgency_adjustment, seasonal_adjustment),
    );

    // Percent divisor is the constant 100.
    let discount_amount = numeric.round(
        numeric.mul(
            adjusted_total,
            numeric
                .div(discount_percent, Decimal::ONE_HUNDRED)
                .unwrap_or(Decimal::ZERO),
        ),
        2,
    );
    let total = numeric.sub(adjusted_total, discount_amount);

    PricingBreakdown {
        subtotal,
        complexity_adjustment,
        urgency_adjustment,
        seasonal_adjustment,
        adjusted_total,
        discount_percent,
        discount_amount,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn no_modifiers_means_no_change() {
        let p = price_estimate(
            &NumericContext::standard(),
            &RateTable::standard(),
            d("1000"),
            Decimal::ONE,
            Urgency::Standard,
            Season::Standard,
            Decimal::ZERO,
        );
        assert_eq!(p.complexity_adjustment, Decimal::ZERO);
        assert_eq!(p.urgency_adjustment, Decimal::ZERO);
        assert_eq!(p.seasonal_adjustment, Decimal::ZERO);
        assert_eq!(p.total, d("1000"));
    }

    #[test]
    fn adjustments_are_additive_not_compounded() {
        let p = price_estimate(
            &NumericContext::standard(),
            &RateTable::standard(),
            d("1000"),
            d("3"), // (3-1) * 5% = 10%
            Urgency::Rush,
            Season::Peak,
            Decimal::ZERO,
        );
        // Each delta is measured against the 1000 subtotal, never the
        // running total: 100 + 150 + 100.
        assert_eq!(p.complexity_adjustment, d("100"));
        assert_eq!(p.urgency_adjustment, d("150"));
        assert_eq!(p.seasonal_adjustment, d("100"));
        assert_eq!(p.adjusted_total, d("1350"));
        assert_eq!(p.total, d("1350"));
    }

    #[test]
    fn off_season_reduces_the_total() {
        let p = price_estimate(
            &NumericContext::standard(),
            &RateTable::standard(),
            d("1000"),
            Decimal::ONE,
            Urgency::Standard,
            Season::Off,
            Decimal::ZERO,
        );
        assert_eq!(p.seasonal_adjustment, d("-50"));
        assert_eq!(p.total, d("950"));
    }

    #[test]
    fn discount_applies_to_adjusted_total() {
        let p = price_estimate(
            &NumericContext::standard(),
            &RateTable::standard(),
            d("1000"),
            Decimal::ONE,
            Urgency::Rush,
            Season::Standard,
            d("10"),
        );
        assert_eq!(p.adjusted_total, d("1150"));
        assert_eq!(p.discount_amount, d("115"));
        assert_eq!(p.total, d("1035"));
    }

    #[test]
    fn money_rounds_to_cents() {
        let p = price_estimate(
            &NumericContext::standard(),
            &RateTable::standard(),
            d("333.33"),
            d("2"), // 5%
            Urgency::Standard,
            Season::Standard,
            Decimal::ZERO,
        );
        // 333.33 * 0.05 = 16.6665, rounds half up to 16.67
        assert_eq!(p.complexity_adjustment, d("16.67"));
        assert_eq!(p.total, d("350.00"));
    }
}
