//! Calculation results
//!
//! The full output of one pricing run, serializable as-is for the
//! persisted cache tier and for API responses.

use crate::input::MaterialGrade;
use crate::labor::LaborBreakdown;
use crate::material::MaterialBreakdown;
use crate::measure::AreaBreakdown;
use crate::pricing::PricingBreakdown;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Good / Better / Best comparison tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierLevel {
    Good,
    Better,
    Best,
}

impl TierLevel {
    pub const ALL: [TierLevel; 3] = [TierLevel::Good, TierLevel::Better, TierLevel::Best];

    /// The material grade and coat count this tier is quoted at
    pub fn preset(&self) -> (MaterialGrade, u32) {
        match self {
            TierLevel::Good => (MaterialGrade::Basic, 1),
            TierLevel::Better => (MaterialGrade::Premium, 2),
            TierLevel::Best => (MaterialGrade::Luxury, 3),
        }
    }
}

/// One fully recomputed tier quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierQuote {
    pub tier: TierLevel,
    pub grade: MaterialGrade,
    pub coats: u32,
    pub materials: MaterialBreakdown,
    pub labor: LaborBreakdown,
    pub total: Decimal,
}

/// Everything one pricing run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub areas: AreaBreakdown,
    pub materials: MaterialBreakdown,
    pub labor: LaborBreakdown,
    pub pricing: PricingBreakdown,
    pub tiers: Vec<TierQuote>,
    /// Content hash of the canonicalized input this result was computed from
    pub cache_key: String,
    pub calculated_at: DateTime<Utc>,
}

impl CalculationResult {
    /// Look up a tier quote by level
    pub fn tier(&self, level: TierLevel) -> Option<&TierQuote> {
        self.tiers.iter().find(|t| t.tier == level)
    }
}
