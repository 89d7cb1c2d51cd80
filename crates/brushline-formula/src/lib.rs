//! # brushline-formula
//!
//! Formula parser and evaluator for brushline.
//!
//! This crate provides:
//! - Formula parsing (text → AST), with numeric literals parsed directly
//!   into fixed-precision decimals
//! - Formula evaluation (AST → value) through the shared [`NumericContext`]
//! - Built-in spreadsheet functions (math, logical, text, date, lookup)
//! - A dependency graph resolver with cycle containment
//! - A workbook recalculation pass that evaluates cells in dependency order
//!
//! ## Example
//!
//! ```rust,ignore
//! use brushline_formula::{parse_formula, evaluate, EvaluationContext};
//!
//! let ast = parse_formula("=SUM(A1:A10)")?;
//! let result = evaluate(&ast, &context)?;
//! ```
//!
//! [`NumericContext`]: brushline_core::NumericContext

pub mod ast;
pub mod cache;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod recalc;

pub use ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
pub use cache::ParseCache;
pub use dependency::{CellKey, DependencyGraph, EvaluationPlan};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext, FormulaValue};
pub use parser::parse_formula;
pub use recalc::{RecalcOptions, RecalcStats, Recalculator};
