//! Logical functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use brushline_core::CellError;

/// IF(condition, value_if_true, [value_if_false])
pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let condition = match args.first() {
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(*e)),
        Some(v) => match v.as_bool() {
            Some(b) => b,
            None => return Ok(FormulaValue::Error(CellError::Value)),
        },
        None => return Ok(FormulaValue::Error(CellError::Value)),
    };

    if condition {
        Ok(args.get(1).cloned().unwrap_or(FormulaValue::Empty))
    } else {
        Ok(args.get(2).cloned().unwrap_or(FormulaValue::Boolean(false)))
    }
}

/// AND(value1, [value2], ...)
pub fn fn_and(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut any = false;

    for arg in args {
        match arg {
            FormulaValue::Error(e) => return Ok(FormulaValue::Error(*e)),
            FormulaValue::Array(arr) => {
                for row in arr {
                    for cell in row {
                        if let FormulaValue::Error(e) = cell {
                            return Ok(FormulaValue::Error(*e));
                        }
                        if let Some(b) = cell.as_bool() {
                            any = true;
                            if !b {
                                return Ok(FormulaValue::Boolean(false));
                            }
                        }
                    }
                }
            }
            v => {
                if let Some(b) = v.as_bool() {
                    any = true;
                    if !b {
                        return Ok(FormulaValue::Boolean(false));
                    }
                }
            }
        }
    }

    if any {
        Ok(FormulaValue::Boolean(true))
    } else {
        Ok(FormulaValue::Error(CellError::Value))
    }
}

/// OR(value1, [value2], ...)
pub fn fn_or(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut any = false;

    for arg in args {
        match arg {
            FormulaValue::Error(e) => return Ok(FormulaValue::Error(*e)),
            FormulaValue::Array(arr) => {
                for row in arr {
                    for cell in row {
                        if let FormulaValue::Error(e) = cell {
                            return Ok(FormulaValue::Error(*e));
                        }
                        if let Some(b) = cell.as_bool() {
                            any = true;
                            if b {
                                return Ok(FormulaValue::Boolean(true));
                            }
                        }
                    }
                }
            }
            v => {
                if let Some(b) = v.as_bool() {
                    any = true;
                    if b {
                        return Ok(FormulaValue::Boolean(true));
                    }
                }
            }
        }
    }

    if any {
        Ok(FormulaValue::Boolean(false))
    } else {
        Ok(FormulaValue::Error(CellError::Value))
    }
}

/// NOT(value)
pub fn fn_not(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match args.first() {
        Some(FormulaValue::Error(e)) => Ok(FormulaValue::Error(*e)),
        Some(v) => match v.as_bool() {
            Some(b) => Ok(FormulaValue::Boolean(!b)),
            None => Ok(FormulaValue::Error(CellError::Value)),
        },
        None => Ok(FormulaValue::Error(CellError::Value)),
    }
}

/// IFERROR(value, value_if_error)
pub fn fn_iferror(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match args.first() {
        Some(FormulaValue::Error(_)) => {
            Ok(args.get(1).cloned().unwrap_or(FormulaValue::Empty))
        }
        Some(v) => Ok(v.clone()),
        None => Ok(FormulaValue::Empty),
    }
}

/// TRUE()
pub fn fn_true(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(true))
}

/// FALSE()
pub fn fn_false(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(false))
}
