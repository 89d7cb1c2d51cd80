//! # brushline-estimate
//!
//! The measurement and pricing calculator: turns validated room and
//! surface measurements into a full painting estimate with material,
//! labor, and tiered pricing breakdowns.
//!
//! The pipeline runs entirely on the shared fixed-precision decimal
//! layer. Given identical input the output is deterministic, which is
//! what makes results safe to cache by content hash.

pub mod calculator;
pub mod input;
pub mod labor;
pub mod material;
pub mod measure;
pub mod pricing;
pub mod rates;
pub mod result;

pub use calculator::Estimator;
pub use input::{
    CalculationInput, MaterialGrade, Room, Season, Surface, Urgency, ValidationError,
};
pub use labor::LaborBreakdown;
pub use material::{MaterialBreakdown, SupplyLine};
pub use measure::AreaBreakdown;
pub use pricing::PricingBreakdown;
pub use result::{CalculationResult, TierLevel, TierQuote};
