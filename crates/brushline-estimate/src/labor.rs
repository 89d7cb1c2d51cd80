//! Labor hours and cost
//!
//! Hours come from dividing painted area by per-phase production rates.
//! Painting repeats per coat; prep and cleanup happen once. Productive
//! phases scale by the complexity multiplier, while the travel
//! allowance is a fixed block of time that does not.

use crate::input::Room;
use crate::measure::AreaBreakdown;
use crate::rates::RateTable;
use brushline_core::NumericContext;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Labor hours and cost for one estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborBreakdown {
    pub prep_hours: Decimal,
    pub painting_hours: Decimal,
    pub cleanup_hours: Decimal,
    pub travel_hours: Decimal,
    pub total_hours: Decimal,
    pub complexity_multiplier: Decimal,
    pub hourly_rate: Decimal,
    pub total_cost: Decimal,
}

/// Mean complexity rating across rooms, unrounded
pub fn average_complexity(numeric: &NumericContext, rooms: &[Room]) -> Decimal {
    if rooms.is_empty() {
        return Decimal::ONE;
    }
    let sum: Decimal = rooms
        .iter()
        .map(|r| Decimal::from(r.complexity))
        .sum();
    numeric
        .div(sum, Decimal::from(rooms.len() as u64))
        .unwrap_or(Decimal::ONE)
}

/// Estimate labor for the measured areas
pub fn price_labor(
    numeric: &NumericContext,
    rates: &RateTable,
    areas: &AreaBreakdown,
    rooms: &[Room],
    coats: u32,
) -> LaborBreakdown {
    let avg = average_complexity(numeric, rooms);
    let rounded = numeric.round(avg, 0).to_u8().unwrap_or(1);
    let multiplier = rates.complexity_multiplier(rounded);

    // Production-rate divisors are strictly positive constants.
    let base_prep = numeric
        .div(areas.total_area, rates.prep_rate)
        .unwrap_or(Decimal::ZERO);
    let base_painting = numeric.mul(
        numeric
            .div(areas.total_area, rates.painting_rate)
            .unwrap_or(Decimal::ZERO),
        Decimal::from(coats),
    );
    let base_cleanup = numeric
        .div(areas.total_area, rates.cleanup_rate)
        .unwrap_or(Decimal::ZERO);

    let prep_hours = numeric.round(numeric.mul(base_prep, multiplier), 2);
    let painting_hours = numeric.round(numeric.mul(base_painting, multiplier), 2);
    let cleanup_hours = numeric.round(numeric.mul(base_cleanup, multiplier), 2);
    let travel_hours = rates.travel_hours;

    let total_hours = numeric.add(
        numeric.add(prep_hours, painting_hours),
        numeric.add(cleanup_hours, travel_hours),
    );
    let total_cost = numeric.round(numeric.mul(total_hours, rates.hourly_rate), 2);

    LaborBreakdown {
        prep_hours,
        painting_hours,
        cleanup_hours,
        travel_hours,
        total_hours,
        complexity_multiplier: multiplier,
        hourly_rate: rates.hourly_rate,
        total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Surface;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn areas(total: &str) -> AreaBreakdown {
        AreaBreakdown {
            wall_area: d(total),
            ceiling_area: Decimal::ZERO,
            trim_length: Decimal::ZERO,
            total_area: d(total),
        }
    }

    fn room(complexity: u8) -> Room {
        Room {
            name: "Test".into(),
            length: d("10"),
            width: d("10"),
            height: d("8"),
            doors: 0,
            windows: 0,
            complexity,
            surfaces: vec![Surface::Walls],
        }
    }

    #[test]
    fn phase_hours_from_production_rates() {
        let numeric = NumericContext::standard();
        let rates = RateTable::standard();

        let labor = price_labor(&numeric, &rates, &areas("600"), &[room(1)], 1);
        assert_eq!(labor.prep_hours, d("3"));      // 600 / 200
        assert_eq!(labor.painting_hours, d("4"));  // 600 / 150
        assert_eq!(labor.cleanup_hours, d("1.5")); // 600 / 400
        assert_eq!(labor.travel_hours, d("1.5"));
        assert_eq!(labor.total_hours, d("10"));
        assert_eq!(labor.total_cost, d("550"));
    }

    #[test]
    fn coats_multiply_painting_only() {
        let numeric = NumericContext::standard();
        let rates = RateTable::standard();

        let one = price_labor(&numeric, &rates, &areas("600"), &[room(1)], 1);
        let two = price_labor(&numeric, &rates, &areas("600"), &[room(1)], 2);
        assert_eq!(two.painting_hours, one.painting_hours * d("2"));
        assert_eq!(two.prep_hours, one.prep_hours);
        assert_eq!(two.cleanup_hours, one.cleanup_hours);
    }

    #[test]
    fn complexity_scales_work_but_not_travel() {
        let numeric = NumericContext::standard();
        let rates = RateTable::standard();

        let hard = price_labor(&numeric, &rates, &areas("600"), &[room(5)], 1);
        assert_eq!(hard.complexity_multiplier, d("1.60"));
        assert_eq!(hard.prep_hours, d("4.8"));
        assert_eq!(hard.travel_hours, d("1.5"));
    }

    #[test]
    fn average_complexity_rounds_half_up() {
        let numeric = NumericContext::standard();
        // (2 + 3) / 2 = 2.5 rounds to 3
        let labor = price_labor(
            &NumericContext::standard(),
            &RateTable::standard(),
            &areas("100"),
            &[room(2), room(3)],
            1,
        );
        assert_eq!(labor.complexity_multiplier, d("1.25"));
        assert_eq!(
            average_complexity(&numeric, &[room(2), room(3)]),
            d("2.5")
        );
    }
}
