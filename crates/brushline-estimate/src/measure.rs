//! Surface measurement
//!
//! Converts room geometry into paintable areas. Wall area is the
//! perimeter times height minus standard opening deductions, floored at
//! zero so a closet full of doors never produces a negative area. Trim
//! is measured in linear feet and contributes painted area at a fixed
//! width per foot.

use crate::input::{Room, Surface};
use crate::rates::RateTable;
use brushline_core::NumericContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated paintable areas across all rooms, in square feet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaBreakdown {
    pub wall_area: Decimal,
    pub ceiling_area: Decimal,
    /// Trim measured in linear feet
    pub trim_length: Decimal,
    /// Total painted square feet, including the trim contribution
    pub total_area: Decimal,
}

/// Measure every room and sum the selected surfaces
pub fn measure_rooms(numeric: &NumericContext, rates: &RateTable, rooms: &[Room]) -> AreaBreakdown {
    let mut wall_area = Decimal::ZERO;
    let mut ceiling_area = Decimal::ZERO;
    let mut trim_length = Decimal::ZERO;

    for room in rooms {
        if room.surfaces.contains(&Surface::Walls) {
            wall_area = numeric.add(wall_area, wall_area_for(numeric, rates, room));
        }
        if room.surfaces.contains(&Surface::Ceiling) {
            ceiling_area = numeric.add(ceiling_area, numeric.mul(room.length, room.width));
        }
        if room.surfaces.contains(&Surface::Trim) {
            trim_length = numeric.add(trim_length, trim_length_for(numeric, rates, room));
        }
    }

    let trim_area = numeric.mul(trim_length, rates.trim_width);
    let total_area = numeric.add(numeric.add(wall_area, ceiling_area), trim_area);

    AreaBreakdown {
        wall_area,
        ceiling_area,
        trim_length,
        total_area,
    }
}

fn wall_area_for(numeric: &NumericContext, rates: &RateTable, room: &Room) -> Decimal {
    let perimeter = numeric.mul(Decimal::TWO, numeric.add(room.length, room.width));
    let gross = numeric.mul(perimeter, room.height);
    let deductions = numeric.add(
        numeric.mul(Decimal::from(room.doors), rates.door_area),
        numeric.mul(Decimal::from(room.windows), rates.window_area),
    );
    numeric.sub(gross, deductions).max(Decimal::ZERO)
}

fn trim_length_for(numeric: &NumericContext, rates: &RateTable, room: &Room) -> Decimal {
    numeric.add(
        numeric.mul(Decimal::from(room.doors), rates.door_trim_lf),
        numeric.mul(Decimal::from(room.windows), rates.window_trim_lf),
    )
}
