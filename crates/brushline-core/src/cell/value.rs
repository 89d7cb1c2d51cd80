//! Cell value and formula error types

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Represents the value stored in a cell
///
/// Numbers are fixed-precision decimals, never binary floats: the legacy
/// workbook's financial results depend on exact decimal arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell (no value)
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value (fixed-precision decimal, including date serials)
    Number(Decimal),

    /// Text value
    Text(String),

    /// Error value (#VALUE!, #DIV/0!, etc.)
    Error(CellError),

    /// Formula with cached result
    Formula {
        /// Original formula text (e.g., "=SUM(A1:A10)")
        text: String,
        /// Last calculated value (if any)
        cached_value: Option<Box<CellValue>>,
    },
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Create a new formula value
    pub fn formula<S: Into<String>>(text: S) -> Self {
        CellValue::Formula {
            text: text.into(),
            cached_value: None,
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula { .. })
    }

    /// Check if the cell contains an error
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(Decimal::ONE),
            CellValue::Boolean(false) => Some(Decimal::ZERO),
            CellValue::Formula {
                cached_value: Some(v),
                ..
            } => v.as_number(),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Number(n) => Some(!n.is_zero()),
            CellValue::Formula {
                cached_value: Some(v),
                ..
            } => v.as_bool(),
            _ => None,
        }
    }

    /// Try to get the value as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Formula {
                cached_value: Some(v),
                ..
            } => v.as_text(),
            _ => None,
        }
    }

    /// Get the formula text if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(true) => write!(f, "TRUE"),
            CellValue::Boolean(false) => write!(f, "FALSE"),
            CellValue::Number(n) => write!(f, "{}", n.normalize()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e.as_str()),
            CellValue::Formula { text, .. } => write!(f, "{}", text),
        }
    }
}

impl From<Decimal> for CellValue {
    fn from(n: Decimal) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(Decimal::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Formula-level error codes
///
/// These are values, not exceptions: they flow through the evaluation
/// pipeline and propagate to dependent cells, never aborting a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #DIV/0! - Division by zero
    Div0,
    /// #NUM! - Invalid numeric value (e.g., sqrt of a negative)
    Num,
    /// #N/A - Lookup value not found
    Na,
    /// #NAME? - Unknown function or name
    Name,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #CIRC! - Cell participates in a circular reference
    Circular,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Div0 => "#DIV/0!",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::Name => "#NAME?",
            CellError::Value => "#VALUE!",
            CellError::Circular => "#CIRC!",
        }
    }

    /// Parse an error string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#DIV/0!" => Some(CellError::Div0),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            "#NAME?" => Some(CellError::Name),
            "#VALUE!" => Some(CellError::Value),
            "#CIRC!" => Some(CellError::Circular),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CellError {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CellError::parse(s).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn number_coercions() {
        assert_eq!(
            CellValue::Boolean(true).as_number(),
            Some(Decimal::ONE)
        );
        assert_eq!(CellValue::text("x").as_number(), None);
        assert_eq!(CellValue::from(7i64).as_bool(), Some(true));
    }

    #[test]
    fn formula_cached_value_passthrough() {
        let v = CellValue::Formula {
            text: "=1+1".into(),
            cached_value: Some(Box::new(CellValue::from(2i64))),
        };
        assert_eq!(v.as_number(), Some(Decimal::from(2)));
        assert_eq!(v.formula_text(), Some("=1+1"));
    }

    #[test]
    fn error_round_trip() {
        for e in [
            CellError::Div0,
            CellError::Num,
            CellError::Na,
            CellError::Name,
            CellError::Value,
            CellError::Circular,
        ] {
            assert_eq!(CellError::parse(e.as_str()), Some(e));
        }
        assert_eq!(CellError::parse("#BOGUS!"), None);
    }
}
