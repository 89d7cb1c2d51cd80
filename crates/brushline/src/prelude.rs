//! Prelude module - common imports for brushline users
//!
//! ```rust
//! use brushline::prelude::*;
//! ```

pub use crate::{
    // Measurement and pricing types
    AreaBreakdown,
    // Cache types
    BatchScheduler,
    CacheConfig,
    CacheKey,
    CacheStats,
    // Input types
    CalculationInput,
    CalculationResult,

    // Cell types
    CellAddress,
    CellError,
    CellRange,
    CellValue,

    // Error types
    EngineError,
    // Main types
    EstimateEngine,
    Estimator,

    // Formula types
    FormulaError,
    FormulaValue,
    LaborBreakdown,

    MaterialBreakdown,
    MaterialGrade,
    NumericContext,
    PricingBreakdown,
    Recalculator,
    Room,
    Season,
    Sheet,
    SqliteTier,
    Surface,
    TierLevel,
    TierQuote,
    Urgency,
    ValidationError,
    Workbook,
};
