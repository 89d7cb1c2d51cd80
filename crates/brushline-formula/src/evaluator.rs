//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. All arithmetic runs on
//! fixed-precision decimals through the shared [`NumericContext`], so
//! evaluation is deterministic and free of binary float artifacts.
//! Evaluation-time failures (division by zero, lookup misses) surface
//! as error *values*, not `Err` returns; `Err` is reserved for
//! structural problems like unknown functions or bad argument counts.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use brushline_core::{CellAddress, CellError, CellValue, NumericContext, Workbook};
use rust_decimal::{Decimal, MathematicalOps};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(Decimal),
    Text(String),
    Boolean(bool),
    Error(CellError),
    Array(Vec<Vec<FormulaValue>>),
    Empty,
}

impl FormulaValue {
    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(Decimal::ONE),
            FormulaValue::Boolean(false) => Some(Decimal::ZERO),
            FormulaValue::Text(s) => Decimal::from_str(s.trim()).ok(),
            FormulaValue::Empty => Some(Decimal::ZERO),
            _ => None,
        }
    }

    /// Force conversion to number for arithmetic
    pub fn to_number(&self) -> FormulaResult<Decimal> {
        self.as_number()
            .ok_or_else(|| FormulaError::Evaluation(format!("Cannot convert {:?} to number", self)))
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(!n.is_zero()),
            FormulaValue::Text(s) => {
                let upper = s.to_uppercase();
                if upper == "TRUE" {
                    Some(true)
                } else if upper == "FALSE" {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Convert to string (display form)
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => n.normalize().to_string(),
            FormulaValue::Text(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Array(_) => "#VALUE!".to_string(),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }
}

impl From<CellValue> for FormulaValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(n),
            CellValue::Text(s) => FormulaValue::Text(s),
            CellValue::Boolean(b) => FormulaValue::Boolean(b),
            CellValue::Error(e) => FormulaValue::Error(e),
            CellValue::Formula { cached_value, .. } => cached_value
                .map(|v| (*v).into())
                .unwrap_or(FormulaValue::Empty),
        }
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Empty => CellValue::Empty,
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::Text(s) => CellValue::Text(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            FormulaValue::Array(_) => CellValue::Error(CellError::Value),
        }
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Reference to the workbook for cell lookups
    pub workbook: Option<&'a Workbook>,
    /// Current sheet index (for unqualified references)
    pub current_sheet: usize,
    /// Shared numeric behavior for every arithmetic step
    pub numeric: NumericContext,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(workbook: Option<&'a Workbook>, sheet: usize) -> Self {
        Self {
            workbook,
            current_sheet: sheet,
            numeric: NumericContext::standard(),
        }
    }

    /// Create a simple context without workbook (for testing)
    pub fn simple() -> Self {
        Self::new(None, 0)
    }

    /// Get a cell value from the workbook
    pub fn get_cell_value(&self, sheet: Option<&str>, row: u32, col: u16) -> FormulaValue {
        let workbook = match self.workbook {
            Some(wb) => wb,
            None => return FormulaValue::Empty,
        };

        let sheet_idx = match sheet {
            Some(name) => match workbook.sheet_index(name) {
                Some(idx) => idx,
                None => return FormulaValue::Error(CellError::Name),
            },
            None => self.current_sheet,
        };

        let sheet = match workbook.sheet(sheet_idx) {
            Some(s) => s,
            None => return FormulaValue::Error(CellError::Name),
        };

        sheet.value_at(CellAddress::new(row, col)).into()
    }

    /// Get a range of cell values as an array
    pub fn get_range_values(
        &self,
        sheet: Option<&str>,
        start_row: u32,
        start_col: u16,
        end_row: u32,
        end_col: u16,
    ) -> FormulaValue {
        let workbook = match self.workbook {
            Some(wb) => wb,
            None => return FormulaValue::Array(vec![]),
        };

        let sheet_idx = match sheet {
            Some(name) => match workbook.sheet_index(name) {
                Some(idx) => idx,
                None => return FormulaValue::Error(CellError::Name),
            },
            None => self.current_sheet,
        };

        let sheet = match workbook.sheet(sheet_idx) {
            Some(s) => s,
            None => return FormulaValue::Error(CellError::Name),
        };

        let mut rows = Vec::new();
        for row in start_row..=end_row {
            let mut cols = Vec::new();
            for col in start_col..=end_col {
                cols.push(sheet.value_at(CellAddress::new(row, col)).into());
            }
            rows.push(cols);
        }

        FormulaValue::Array(rows)
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::Text(s) => Ok(FormulaValue::Text(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        FormulaExpr::Error(e) => Ok(FormulaValue::Error(*e)),

        // === References ===
        FormulaExpr::CellRef(cell_ref) => Ok(ctx.get_cell_value(
            cell_ref.sheet.as_deref(),
            cell_ref.address.row,
            cell_ref.address.col,
        )),

        FormulaExpr::RangeRef(range_ref) => Ok(ctx.get_range_values(
            range_ref.sheet.as_deref(),
            range_ref.range.start.row,
            range_ref.range.start.col,
            range_ref.range.end.row,
            range_ref.range.end.col,
        )),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    // Propagate errors
    if let Some(e) = left_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }
    if let Some(e) = right_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    match op {
        // Arithmetic operators
        BinaryOperator::Add => {
            let (l, r) = arithmetic_operands(&left_val, &right_val)?;
            Ok(FormulaValue::Number(ctx.numeric.add(l, r)))
        }
        BinaryOperator::Subtract => {
            let (l, r) = arithmetic_operands(&left_val, &right_val)?;
            Ok(FormulaValue::Number(ctx.numeric.sub(l, r)))
        }
        BinaryOperator::Multiply => {
            let (l, r) = arithmetic_operands(&left_val, &right_val)?;
            Ok(FormulaValue::Number(ctx.numeric.mul(l, r)))
        }
        BinaryOperator::Divide => {
            let (l, r) = arithmetic_operands(&left_val, &right_val)?;
            match ctx.numeric.div(l, r) {
                Ok(n) => Ok(FormulaValue::Number(n)),
                Err(e) => Ok(FormulaValue::Error(e)),
            }
        }
        BinaryOperator::Power => {
            let (l, r) = arithmetic_operands(&left_val, &right_val)?;
            match l.checked_powd(r) {
                Some(n) => Ok(FormulaValue::Number(n)),
                None => Ok(FormulaValue::Error(CellError::Num)),
            }
        }

        // Comparison operators
        BinaryOperator::Equal => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Equal,
        )),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Equal,
        )),
        BinaryOperator::LessThan => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Less,
        )),
        BinaryOperator::LessEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Greater,
        )),
        BinaryOperator::GreaterThan => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Greater,
        )),
        BinaryOperator::GreaterEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Less,
        )),

        // Concatenation
        BinaryOperator::Concat => {
            let l = left_val.as_string();
            let r = right_val.as_string();
            Ok(FormulaValue::Text(l + &r))
        }
    }
}

fn arithmetic_operands(
    left: &FormulaValue,
    right: &FormulaValue,
) -> FormulaResult<(Decimal, Decimal)> {
    let l = left
        .as_number()
        .ok_or_else(|| FormulaError::Evaluation("Expected number".into()))?;
    let r = right
        .as_number()
        .ok_or_else(|| FormulaError::Evaluation("Expected number".into()))?;
    Ok((l, r))
}

/// Compare two values for ordering
///
/// Numbers compare numerically, text case-insensitively, and mixed
/// types order as number < text < boolean.
pub(crate) fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    // Empty coerces to zero
    let zero = FormulaValue::Number(Decimal::ZERO);
    let left = match left {
        FormulaValue::Empty => &zero,
        v => v,
    };
    let right = match right {
        FormulaValue::Empty => &zero,
        v => v,
    };

    match (left, right) {
        (FormulaValue::Number(l), FormulaValue::Number(r)) => l.cmp(r),

        (FormulaValue::Text(l), FormulaValue::Text(r)) => l.to_lowercase().cmp(&r.to_lowercase()),

        // FALSE < TRUE
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),

        // Mixed types: number < text < boolean
        (FormulaValue::Number(_), FormulaValue::Text(_)) => Ordering::Less,
        (FormulaValue::Text(_), FormulaValue::Number(_)) => Ordering::Greater,
        (FormulaValue::Number(_), FormulaValue::Boolean(_)) => Ordering::Less,
        (FormulaValue::Boolean(_), FormulaValue::Number(_)) => Ordering::Greater,
        (FormulaValue::Text(_), FormulaValue::Boolean(_)) => Ordering::Less,
        (FormulaValue::Boolean(_), FormulaValue::Text(_)) => Ordering::Greater,

        (FormulaValue::Error(l), FormulaValue::Error(r)) => l.as_str().cmp(r.as_str()),

        _ => Ordering::Equal,
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate(operand, ctx)?;

    if let Some(e) = val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    match op {
        UnaryOperator::Negate => {
            let n = val
                .as_number()
                .ok_or_else(|| FormulaError::Evaluation("Expected number".into()))?;
            Ok(FormulaValue::Number(-n))
        }
        UnaryOperator::Percent => {
            let n = val
                .as_number()
                .ok_or_else(|| FormulaError::Evaluation("Expected number".into()))?;
            match ctx.numeric.div(n, Decimal::ONE_HUNDRED) {
                Ok(n) => Ok(FormulaValue::Number(n)),
                Err(e) => Ok(FormulaValue::Error(e)),
            }
        }
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let registry = get_function_registry();

    // An unrecognized name resolves as #NAME?, the same error an unknown
    // sheet reference produces. It is a cell-level error value, not a
    // structural failure of the pass.
    let Some(func) = registry.get(name) else {
        return Ok(FormulaValue::Error(CellError::Name));
    };

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    (func.implementation)(&evaluated_args, ctx)
}
