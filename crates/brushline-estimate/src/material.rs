//! Material quantities and costs
//!
//! Paint and primer are purchased by the whole gallon, so coverage math
//! rounds up after applying the wastage factor. Supplies scale with the
//! total painted area at fixed area-per-unit ratios.

use crate::input::MaterialGrade;
use crate::measure::AreaBreakdown;
use crate::rates::RateTable;
use brushline_core::NumericContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One consumable line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyLine {
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cost: Decimal,
}

/// Material quantities and costs for one estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialBreakdown {
    pub primer_gallons: Decimal,
    pub primer_cost: Decimal,
    pub paint_gallons: Decimal,
    pub paint_cost: Decimal,
    pub supplies: Vec<SupplyLine>,
    pub supplies_cost: Decimal,
    pub total_cost: Decimal,
}

/// Price materials for the measured areas, grade, and coat count
pub fn price_materials(
    numeric: &NumericContext,
    rates: &RateTable,
    areas: &AreaBreakdown,
    grade: MaterialGrade,
    coats: u32,
) -> MaterialBreakdown {
    // Primer always goes on as a single coat; paint repeats per coat.
    let primer_gallons = gallons_for(numeric, rates, areas.total_area);
    let paint_area = numeric.mul(areas.total_area, Decimal::from(coats));
    let paint_gallons = gallons_for(numeric, rates, paint_area);

    let primer_cost = numeric.round(numeric.mul(primer_gallons, rates.primer_price), 2);
    let paint_cost = numeric.round(numeric.mul(paint_gallons, rates.paint_price(grade)), 2);

    let mut supplies = Vec::with_capacity(rates.supplies.len());
    let mut supplies_cost = Decimal::ZERO;
    for supply in &rates.supplies {
        // Rate-table ratios are strictly positive, so division cannot fail.
        let quantity = numeric.ceil(
            numeric
                .div(areas.total_area, supply.area_per_unit)
                .unwrap_or(Decimal::ZERO),
        );
        let cost = numeric.round(numeric.mul(quantity, supply.unit_price), 2);
        supplies_cost = numeric.add(supplies_cost, cost);
        supplies.push(SupplyLine {
            name: supply.name.to_string(),
            quantity,
            unit_price: supply.unit_price,
            cost,
        });
    }

    let total_cost = numeric.add(numeric.add(primer_cost, paint_cost), supplies_cost);

    MaterialBreakdown {
        primer_gallons,
        primer_cost,
        paint_gallons,
        paint_cost,
        supplies,
        supplies_cost,
        total_cost,
    }
}

/// Whole gallons needed for `area`, with wastage applied before rounding
fn gallons_for(numeric: &NumericContext, rates: &RateTable, area: Decimal) -> Decimal {
    if area <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let padded = numeric.mul(area, numeric.add(Decimal::ONE, rates.wastage));
    numeric.ceil(
        numeric
            .div(padded, rates.coverage_per_gallon)
            .unwrap_or(Decimal::ZERO),
    )
}
