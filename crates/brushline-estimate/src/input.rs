//! Calculation input
//!
//! A normalized, serializable description of everything a pricing run
//! needs. Inputs are validated before any calculation begins and
//! canonicalized before hashing, so semantically identical inputs that
//! differ only in collection order produce the same cache key.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input validation failures; detected before any calculation starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("estimate requires at least one room")]
    NoRooms,

    #[error("room '{room}' has a non-positive {dimension}")]
    NonPositiveDimension { room: String, dimension: &'static str },

    #[error("room '{room}' complexity must be between 1 and 5, got {value}")]
    ComplexityOutOfRange { room: String, value: u8 },

    #[error("coat count must be between 1 and 4, got {0}")]
    CoatsOutOfRange(u32),

    #[error("discount percent must be between 0 and 100, got {0}")]
    DiscountOutOfRange(Decimal),
}

/// Paintable surface categories within a room
///
/// Variant order is the canonical sort order for hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Surface {
    Walls,
    Ceiling,
    Trim,
}

/// Paint quality grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialGrade {
    Basic,
    Premium,
    Luxury,
}

/// Project urgency modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Standard,
    Rush,
    Emergency,
}

/// Seasonal demand modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Standard,
    Peak,
    Off,
}

/// A single room's geometry and selections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    /// Length in feet
    pub length: Decimal,
    /// Width in feet
    pub width: Decimal,
    /// Ceiling height in feet
    pub height: Decimal,
    pub doors: u32,
    pub windows: u32,
    /// Prep difficulty rating, 1 (simple) to 5 (intricate)
    pub complexity: u8,
    /// Surfaces to paint; unselected surfaces contribute nothing
    pub surfaces: Vec<Surface>,
}

/// Full input to a pricing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub rooms: Vec<Room>,
    pub material: MaterialGrade,
    pub coats: u32,
    pub urgency: Urgency,
    pub season: Season,
    pub discount_percent: Decimal,
}

impl CalculationInput {
    /// Validate required fields and numeric ranges
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rooms.is_empty() {
            return Err(ValidationError::NoRooms);
        }

        for room in &self.rooms {
            for (dimension, value) in [
                ("length", room.length),
                ("width", room.width),
                ("height", room.height),
            ] {
                if value <= Decimal::ZERO {
                    return Err(ValidationError::NonPositiveDimension {
                        room: room.name.clone(),
                        dimension,
                    });
                }
            }

            if !(1..=5).contains(&room.complexity) {
                return Err(ValidationError::ComplexityOutOfRange {
                    room: room.name.clone(),
                    value: room.complexity,
                });
            }
        }

        if !(1..=4).contains(&self.coats) {
            return Err(ValidationError::CoatsOutOfRange(self.coats));
        }

        if self.discount_percent < Decimal::ZERO
            || self.discount_percent > Decimal::ONE_HUNDRED
        {
            return Err(ValidationError::DiscountOutOfRange(self.discount_percent));
        }

        Ok(())
    }

    /// Produce the canonical form used for hashing
    ///
    /// Rooms sort by name, surfaces by variant order with duplicates
    /// removed. The result is semantically identical to the original.
    pub fn canonicalize(&self) -> CalculationInput {
        let mut canonical = self.clone();
        canonical.rooms.sort_by(|a, b| a.name.cmp(&b.name));
        for room in &mut canonical.rooms {
            room.surfaces.sort();
            room.surfaces.dedup();
        }
        canonical
    }
}
