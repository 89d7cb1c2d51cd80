//! # brushline
//!
//! A spreadsheet-compatible calculation engine for painting estimates.
//!
//! Brushline reproduces the numbers a legacy estimating workbook
//! produces, to the cent, without the workbook: fixed-precision decimal
//! arithmetic, a formula evaluator with spreadsheet semantics, a
//! measurement and pricing pipeline, and a multi-tier result cache
//! keyed by content hash.
//!
//! ## Example
//!
//! ```rust
//! use brushline::prelude::*;
//! use rust_decimal::Decimal;
//!
//! let engine = EstimateEngine::new();
//!
//! let input = CalculationInput {
//!     rooms: vec![Room {
//!         name: "Living Room".into(),
//!         length: Decimal::new(245, 1),
//!         width: Decimal::new(1225, 2),
//!         height: Decimal::from(9),
//!         doors: 1,
//!         windows: 2,
//!         complexity: 2,
//!         surfaces: vec![Surface::Walls, Surface::Ceiling, Surface::Trim],
//!     }],
//!     material: MaterialGrade::Premium,
//!     coats: 2,
//!     urgency: Urgency::Standard,
//!     season: Season::Standard,
//!     discount_percent: Decimal::ZERO,
//! };
//!
//! let quote = engine.calculate(&input).unwrap();
//! assert!(quote.pricing.total > Decimal::ZERO);
//!
//! // Same input, same key: the second call is a cache hit.
//! let again = engine.calculate(&input).unwrap();
//! assert_eq!(quote.pricing, again.pricing);
//! ```

pub mod engine;
pub mod prelude;

pub use engine::{EngineError, EstimateEngine};

// Re-export decimal and cell primitives
pub use brushline_core::{
    CellAddress, CellError, CellRange, CellValue, NumericContext, Sheet, Workbook,
};

// Re-export formula types
pub use brushline_formula::{
    evaluate, parse_formula, DependencyGraph, EvaluationContext, FormulaError, FormulaExpr,
    FormulaResult, FormulaValue, RecalcStats, Recalculator,
};

// Re-export estimate types
pub use brushline_estimate::{
    AreaBreakdown, CalculationInput, CalculationResult, Estimator, LaborBreakdown,
    MaterialBreakdown, MaterialGrade, PricingBreakdown, Room, Season, Surface, SupplyLine,
    TierLevel, TierQuote, Urgency, ValidationError,
};

// Re-export cache types
pub use brushline_cache::{
    BatchScheduler, CacheConfig, CacheError, CacheKey, CacheStats, CalculationCache, SqliteTier,
};
