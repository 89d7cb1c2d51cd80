//! Lookup functions

use crate::error::FormulaResult;
use crate::evaluator::{compare_values, EvaluationContext, FormulaValue};
use brushline_core::CellError;
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;

/// Interpret an argument as a 2-D table
fn table_arg(args: &[FormulaValue], idx: usize) -> Result<Vec<Vec<FormulaValue>>, FormulaValue> {
    match args.get(idx) {
        Some(FormulaValue::Array(arr)) => Ok(arr.clone()),
        Some(FormulaValue::Error(e)) => Err(FormulaValue::Error(*e)),
        // A single value acts as a 1x1 table
        Some(v) => Ok(vec![vec![v.clone()]]),
        None => Err(FormulaValue::Error(CellError::Value)),
    }
}

fn index_arg(args: &[FormulaValue], idx: usize) -> Result<Option<i64>, FormulaValue> {
    match args.get(idx) {
        Some(FormulaValue::Number(n)) => Ok(n.trunc().to_i64()),
        Some(FormulaValue::Error(e)) => Err(FormulaValue::Error(*e)),
        Some(FormulaValue::Empty) | None => Ok(None),
        _ => Err(FormulaValue::Error(CellError::Value)),
    }
}

/// VLOOKUP(lookup_value, table, col_index, [range_lookup])
///
/// Exact match when range_lookup is FALSE; otherwise approximate match
/// returning the last row whose first column is <= the lookup value
/// (the table's first column must be sorted ascending). Misses yield #N/A.
pub fn fn_vlookup(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let lookup = match args.first() {
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(*e)),
        Some(v) => v.clone(),
        None => return Ok(FormulaValue::Error(CellError::Value)),
    };
    let table = match table_arg(args, 1) {
        Ok(t) => t,
        Err(v) => return Ok(v),
    };
    let col = match index_arg(args, 2) {
        Ok(Some(c)) => c,
        Ok(None) => return Ok(FormulaValue::Error(CellError::Value)),
        Err(v) => return Ok(v),
    };
    let exact = match args.get(3) {
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(*e)),
        Some(v) => !v.as_bool().unwrap_or(true),
        None => false,
    };

    if col < 1 {
        return Ok(FormulaValue::Error(CellError::Value));
    }
    let col = (col - 1) as usize;

    let mut best: Option<&Vec<FormulaValue>> = None;
    for row in &table {
        let key = match row.first() {
            Some(k) => k,
            None => continue,
        };

        match compare_values(key, &lookup) {
            Ordering::Equal => {
                best = Some(row);
                break;
            }
            Ordering::Less if !exact => best = Some(row),
            Ordering::Greater if !exact => break,
            _ => {}
        }
    }

    match best {
        Some(row) => match row.get(col) {
            Some(v) => Ok(v.clone()),
            None => Ok(FormulaValue::Error(CellError::Value)),
        },
        None => Ok(FormulaValue::Error(CellError::Na)),
    }
}

/// INDEX(table, row_num, [col_num]) - 1-based indices
pub fn fn_index(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let table = match table_arg(args, 0) {
        Ok(t) => t,
        Err(v) => return Ok(v),
    };
    let row = match index_arg(args, 1) {
        Ok(Some(r)) => r,
        Ok(None) => return Ok(FormulaValue::Error(CellError::Value)),
        Err(v) => return Ok(v),
    };
    let col = match index_arg(args, 2) {
        Ok(opt) => opt.unwrap_or(1),
        Err(v) => return Ok(v),
    };

    if row < 1 || col < 1 {
        return Ok(FormulaValue::Error(CellError::Value));
    }

    match table
        .get((row - 1) as usize)
        .and_then(|r| r.get((col - 1) as usize))
    {
        Some(v) => Ok(v.clone()),
        None => Ok(FormulaValue::Error(CellError::Na)),
    }
}

/// MATCH(lookup_value, array, [match_type])
///
/// match_type 0 is exact; 1 (the default) returns the position of the
/// largest value <= lookup, assuming ascending order. Returns a 1-based
/// position; misses yield #N/A.
pub fn fn_match(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let lookup = match args.first() {
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(*e)),
        Some(v) => v.clone(),
        None => return Ok(FormulaValue::Error(CellError::Value)),
    };
    let table = match table_arg(args, 1) {
        Ok(t) => t,
        Err(v) => return Ok(v),
    };
    let match_type = match index_arg(args, 2) {
        Ok(opt) => opt.unwrap_or(1),
        Err(v) => return Ok(v),
    };

    // Flatten a single row or column into one list
    let values: Vec<&FormulaValue> = table.iter().flat_map(|row| row.iter()).collect();

    let mut best: Option<usize> = None;
    for (i, value) in values.iter().enumerate() {
        match compare_values(value, &lookup) {
            Ordering::Equal => {
                best = Some(i);
                break;
            }
            Ordering::Less if match_type > 0 => best = Some(i),
            Ordering::Greater if match_type > 0 => break,
            _ => {}
        }
    }

    match best {
        Some(i) => Ok(FormulaValue::Number((i as i64 + 1).into())),
        None => Ok(FormulaValue::Error(CellError::Na)),
    }
}
