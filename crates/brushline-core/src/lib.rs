//! # brushline-core
//!
//! Core data structures for the brushline calculation engine.
//!
//! This crate provides the fundamental types used throughout brushline:
//! - [`NumericContext`] - Fixed-precision decimal arithmetic with the legacy
//!   workbook's rounding semantics
//! - [`CellValue`] and [`CellError`] - Typed cell values and formula error codes
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`Workbook`], [`Sheet`] - The sheet/cell model evaluated by the formula engine
//!
//! ## Example
//!
//! ```rust
//! use brushline_core::{Workbook, CellValue, NumericContext};
//! use rust_decimal::Decimal;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.sheet_mut(0).unwrap();
//! sheet.set_value("A1", CellValue::Number(Decimal::from(42))).unwrap();
//! sheet.set_formula("A2", "=A1*2").unwrap();
//!
//! let numeric = NumericContext::standard();
//! assert_eq!(numeric.add(Decimal::from(1), Decimal::from(2)), Decimal::from(3));
//! ```

pub mod cell;
pub mod error;
pub mod numeric;
pub mod sheet;
pub mod workbook;

// Re-exports for convenience
pub use cell::{Cell, CellAddress, CellError, CellRange, CellValue};
pub use error::{Error, Result};
pub use numeric::NumericContext;
pub use sheet::Sheet;
pub use workbook::Workbook;

/// Maximum number of rows in a sheet (legacy workbook limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a sheet (legacy workbook limit, XFD)
pub const MAX_COLS: u16 = 16_384;
