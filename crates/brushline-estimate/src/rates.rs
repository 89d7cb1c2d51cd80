//! Rate tables
//!
//! Every fixed constant the estimate pipeline uses lives here, in one
//! place, so the measurement, material, labor, and pricing stages can
//! never drift apart. Values mirror the production pricing workbook.

use crate::input::{MaterialGrade, Season, Urgency};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

/// Process-wide rate table
pub static RATES: Lazy<RateTable> = Lazy::new(RateTable::standard);

/// A supply item consumed proportionally to painted area
#[derive(Debug, Clone)]
pub struct SupplyRate {
    pub name: &'static str,
    /// Square feet covered per unit
    pub area_per_unit: Decimal,
    /// Price per unit
    pub unit_price: Decimal,
}

/// All fixed constants for the estimate pipeline
#[derive(Debug, Clone)]
pub struct RateTable {
    /// Square feet deducted per door opening
    pub door_area: Decimal,
    /// Square feet deducted per window opening
    pub window_area: Decimal,
    /// Trim linear feet per door
    pub door_trim_lf: Decimal,
    /// Trim linear feet per window
    pub window_trim_lf: Decimal,
    /// Painted square feet per linear foot of trim
    pub trim_width: Decimal,

    /// Square feet covered per gallon of paint or primer
    pub coverage_per_gallon: Decimal,
    /// Overage factor applied to paint area before gallon rounding
    pub wastage: Decimal,
    /// Primer price per gallon
    pub primer_price: Decimal,

    pub supplies: Vec<SupplyRate>,

    /// Square feet per hour, by phase
    pub prep_rate: Decimal,
    pub painting_rate: Decimal,
    pub cleanup_rate: Decimal,
    /// Fixed travel allowance in hours
    pub travel_hours: Decimal,
    /// Labor price per hour
    pub hourly_rate: Decimal,

    /// Labor multiplier indexed by rounded average complexity (1..=5)
    pub complexity_multipliers: [Decimal; 5],
    /// Pricing delta rate per complexity point above 1
    pub complexity_rate_step: Decimal,
}

impl RateTable {
    pub fn standard() -> Self {
        Self {
            door_area: Decimal::new(21, 0),
            window_area: Decimal::new(15, 0),
            door_trim_lf: Decimal::new(17, 0),
            window_trim_lf: Decimal::new(16, 0),
            trim_width: Decimal::new(5, 1), // 0.5 sqft per linear foot

            coverage_per_gallon: Decimal::new(350, 0),
            wastage: Decimal::new(10, 2), // 10%
            primer_price: Decimal::new(20, 0),

            supplies: vec![
                SupplyRate {
                    name: "brush",
                    area_per_unit: Decimal::new(400, 0),
                    unit_price: Decimal::new(12, 0),
                },
                SupplyRate {
                    name: "roller",
                    area_per_unit: Decimal::new(300, 0),
                    unit_price: Decimal::new(8, 0),
                },
                SupplyRate {
                    name: "drop cloth",
                    area_per_unit: Decimal::new(500, 0),
                    unit_price: Decimal::new(15, 0),
                },
                SupplyRate {
                    name: "tape roll",
                    area_per_unit: Decimal::new(200, 0),
                    unit_price: Decimal::new(6, 0),
                },
                SupplyRate {
                    name: "sandpaper pack",
                    area_per_unit: Decimal::new(600, 0),
                    unit_price: Decimal::new(9, 0),
                },
            ],

            prep_rate: Decimal::new(200, 0),
            painting_rate: Decimal::new(150, 0),
            cleanup_rate: Decimal::new(400, 0),
            travel_hours: Decimal::new(15, 1), // 1.5
            hourly_rate: Decimal::new(55, 0),

            complexity_multipliers: [
                Decimal::new(100, 2), // 1.00
                Decimal::new(110, 2), // 1.10
                Decimal::new(125, 2), // 1.25
                Decimal::new(140, 2), // 1.40
                Decimal::new(160, 2), // 1.60
            ],
            complexity_rate_step: Decimal::new(5, 2), // 5% per point above 1
        }
    }

    /// Paint price per gallon for a material grade
    pub fn paint_price(&self, grade: MaterialGrade) -> Decimal {
        match grade {
            MaterialGrade::Basic => Decimal::new(25, 0),
            MaterialGrade::Premium => Decimal::new(45, 0),
            MaterialGrade::Luxury => Decimal::new(70, 0),
        }
    }

    /// Pricing delta rate for urgency
    pub fn urgency_rate(&self, urgency: Urgency) -> Decimal {
        match urgency {
            Urgency::Standard => Decimal::ZERO,
            Urgency::Rush => Decimal::new(15, 2),      // 15%
            Urgency::Emergency => Decimal::new(30, 2), // 30%
        }
    }

    /// Pricing delta rate for season
    pub fn season_rate(&self, season: Season) -> Decimal {
        match season {
            Season::Standard => Decimal::ZERO,
            Season::Peak => Decimal::new(10, 2), // 10%
            Season::Off => Decimal::new(-5, 2),  // -5%
        }
    }

    /// Labor multiplier for a rounded average complexity rating
    pub fn complexity_multiplier(&self, rounded_avg: u8) -> Decimal {
        let idx = rounded_avg.clamp(1, 5) as usize - 1;
        self.complexity_multipliers[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_prices_increase_by_grade() {
        let rates = RateTable::standard();
        assert!(rates.paint_price(MaterialGrade::Basic) < rates.paint_price(MaterialGrade::Premium));
        assert!(
            rates.paint_price(MaterialGrade::Premium) < rates.paint_price(MaterialGrade::Luxury)
        );
    }

    #[test]
    fn complexity_multiplier_clamps() {
        let rates = RateTable::standard();
        assert_eq!(rates.complexity_multiplier(0), rates.complexity_multipliers[0]);
        assert_eq!(rates.complexity_multiplier(9), rates.complexity_multipliers[4]);
    }
}
