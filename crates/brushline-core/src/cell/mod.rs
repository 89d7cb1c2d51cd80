//! Cell types: values, errors, addressing

pub mod address;
pub mod value;

pub use address::{CellAddress, CellRange};
pub use value::{CellError, CellValue};

use chrono::{DateTime, Utc};

/// A single cell: its content plus evaluation bookkeeping
///
/// The content is either a literal value or a formula; the formula's resolved
/// value is written back by the recalculation engine, which also stamps
/// `last_evaluated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Literal value or formula (with cached result)
    pub value: CellValue,
    /// When the recalculation engine last resolved this cell
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

impl Cell {
    /// Create a cell holding a literal value
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            last_evaluated_at: None,
        }
    }

    /// Create a cell holding a formula
    pub fn formula<S: Into<String>>(text: S) -> Self {
        Self {
            value: CellValue::formula(text),
            last_evaluated_at: None,
        }
    }

    /// The cell's current resolved value
    ///
    /// For formula cells this is the cached result of the last evaluation
    /// pass, or `Empty` if the cell has not been evaluated yet.
    pub fn resolved(&self) -> CellValue {
        match &self.value {
            CellValue::Formula { cached_value, .. } => cached_value
                .as_deref()
                .cloned()
                .unwrap_or(CellValue::Empty),
            other => other.clone(),
        }
    }
}
