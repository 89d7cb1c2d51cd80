//! Math functions
//!
//! Aggregates ignore non-numeric values and propagate the first error
//! they encounter. Scalar functions coerce Empty to zero and reject
//! text with #VALUE!.

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use brushline_core::CellError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

/// Extract a required numeric argument, coercing Empty to zero
fn numeric_arg(args: &[FormulaValue], idx: usize) -> Result<Decimal, FormulaValue> {
    match args.get(idx) {
        Some(FormulaValue::Number(n)) => Ok(*n),
        Some(FormulaValue::Boolean(true)) => Ok(Decimal::ONE),
        Some(FormulaValue::Boolean(false)) => Ok(Decimal::ZERO),
        Some(FormulaValue::Error(e)) => Err(FormulaValue::Error(*e)),
        Some(FormulaValue::Empty) | None => Ok(Decimal::ZERO),
        _ => Err(FormulaValue::Error(CellError::Value)),
    }
}

/// Visit every number in the arguments, flattening arrays
///
/// Returns the first error encountered, if any.
fn for_each_number(
    args: &[FormulaValue],
    mut visit: impl FnMut(Decimal),
) -> Result<(), CellError> {
    for arg in args {
        match arg {
            FormulaValue::Number(n) => visit(*n),
            FormulaValue::Error(e) => return Err(*e),
            FormulaValue::Array(arr) => {
                for row in arr {
                    for cell in row {
                        match cell {
                            FormulaValue::Number(n) => visit(*n),
                            FormulaValue::Error(e) => return Err(*e),
                            _ => {}
                        }
                    }
                }
            }
            _ => {} // Ignore non-numeric
        }
    }
    Ok(())
}

/// SUM function
pub fn fn_sum(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut sum = Decimal::ZERO;

    if let Err(e) = for_each_number(args, |n| sum = ctx.numeric.add(sum, n)) {
        return Ok(FormulaValue::Error(e));
    }

    Ok(FormulaValue::Number(sum))
}

/// AVERAGE function
pub fn fn_average(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut sum = Decimal::ZERO;
    let mut count: u32 = 0;

    if let Err(e) = for_each_number(args, |n| {
        sum = ctx.numeric.add(sum, n);
        count += 1;
    }) {
        return Ok(FormulaValue::Error(e));
    }

    match ctx.numeric.div(sum, Decimal::from(count)) {
        Ok(avg) => Ok(FormulaValue::Number(avg)),
        Err(e) => Ok(FormulaValue::Error(e)),
    }
}

/// MIN function
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut min: Option<Decimal> = None;

    if let Err(e) = for_each_number(args, |n| {
        min = Some(min.map_or(n, |m| m.min(n)));
    }) {
        return Ok(FormulaValue::Error(e));
    }

    Ok(FormulaValue::Number(min.unwrap_or(Decimal::ZERO)))
}

/// MAX function
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut max: Option<Decimal> = None;

    if let Err(e) = for_each_number(args, |n| {
        max = Some(max.map_or(n, |m| m.max(n)));
    }) {
        return Ok(FormulaValue::Error(e));
    }

    Ok(FormulaValue::Number(max.unwrap_or(Decimal::ZERO)))
}

/// COUNT function
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut count: i64 = 0;

    for arg in args {
        match arg {
            FormulaValue::Number(_) => count += 1,
            FormulaValue::Array(arr) => {
                for row in arr {
                    for cell in row {
                        if matches!(cell, FormulaValue::Number(_)) {
                            count += 1;
                        }
                    }
                }
            }
            _ => {} // Don't count non-numeric
        }
    }

    Ok(FormulaValue::Number(Decimal::from(count)))
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match numeric_arg(args, 0) {
        Ok(n) => Ok(FormulaValue::Number(n.abs())),
        Err(v) => Ok(v),
    }
}

/// ROUND(number, [num_digits])
///
/// Rounds half away from zero: ROUND(2.5,0)=3, ROUND(-2.5,0)=-3.
/// Negative digits round to the left of the decimal point.
pub fn fn_round(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = match numeric_arg(args, 0) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };
    let digits = match digits_arg(args, 1) {
        Ok(d) => d,
        Err(v) => return Ok(v),
    };

    Ok(FormulaValue::Number(ctx.numeric.round(number, digits)))
}

/// ROUNDUP(number, [num_digits]) - rounds away from zero
pub fn fn_roundup(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    round_with_strategy(args, RoundingStrategy::AwayFromZero)
}

/// ROUNDDOWN(number, [num_digits]) - rounds toward zero
pub fn fn_rounddown(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    round_with_strategy(args, RoundingStrategy::ToZero)
}

fn round_with_strategy(
    args: &[FormulaValue],
    strategy: RoundingStrategy,
) -> FormulaResult<FormulaValue> {
    let number = match numeric_arg(args, 0) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };
    let digits = match digits_arg(args, 1) {
        Ok(d) => d,
        Err(v) => return Ok(v),
    };

    let result = if digits >= 0 {
        number.round_dp_with_strategy(digits as u32, strategy)
    } else {
        let factor = Decimal::from(10_i64.pow(digits.unsigned_abs().min(18)));
        let shifted = (number / factor).round_dp_with_strategy(0, strategy);
        shifted * factor
    };

    Ok(FormulaValue::Number(result))
}

/// CEILING(number, [significance])
///
/// Rounds up to the nearest multiple of significance (default 1).
pub fn fn_ceiling(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    round_to_multiple(args, ctx, true)
}

/// FLOOR(number, [significance])
///
/// Rounds down to the nearest multiple of significance (default 1).
pub fn fn_floor(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    round_to_multiple(args, ctx, false)
}

fn round_to_multiple(
    args: &[FormulaValue],
    ctx: &EvaluationContext,
    up: bool,
) -> FormulaResult<FormulaValue> {
    let number = match numeric_arg(args, 0) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };
    let significance = match args.get(1) {
        Some(FormulaValue::Number(n)) => *n,
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(*e)),
        Some(FormulaValue::Empty) | None => Decimal::ONE,
        _ => return Ok(FormulaValue::Error(CellError::Value)),
    };

    if significance.is_zero() {
        return Ok(FormulaValue::Number(Decimal::ZERO));
    }

    // Mixed signs are undefined
    if number.is_sign_positive() != significance.is_sign_positive()
        && !number.is_zero()
    {
        return Ok(FormulaValue::Error(CellError::Num));
    }

    let quotient = match ctx.numeric.div(number, significance) {
        Ok(q) => q,
        Err(e) => return Ok(FormulaValue::Error(e)),
    };
    let steps = if up { quotient.ceil() } else { quotient.floor() };

    Ok(FormulaValue::Number(steps * significance))
}

/// INT(number) - floors toward negative infinity
pub fn fn_int(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match numeric_arg(args, 0) {
        Ok(n) => Ok(FormulaValue::Number(n.floor())),
        Err(v) => Ok(v),
    }
}

/// SQRT(number)
pub fn fn_sqrt(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = match numeric_arg(args, 0) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };

    match n.sqrt() {
        Some(root) => Ok(FormulaValue::Number(root)),
        None => Ok(FormulaValue::Error(CellError::Num)),
    }
}

/// MOD(number, divisor)
///
/// Result has the same sign as the divisor (unlike Rust's % operator):
/// number - divisor * floor(number/divisor).
pub fn fn_mod(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = match numeric_arg(args, 0) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };
    let divisor = match numeric_arg(args, 1) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };

    let quotient = match ctx.numeric.div(number, divisor) {
        Ok(q) => q,
        Err(e) => return Ok(FormulaValue::Error(e)),
    };

    let result = number - divisor * quotient.floor();
    Ok(FormulaValue::Number(result))
}

/// Extract an optional digits argument (defaults to 0)
fn digits_arg(args: &[FormulaValue], idx: usize) -> Result<i32, FormulaValue> {
    match args.get(idx) {
        Some(FormulaValue::Number(n)) => n
            .trunc()
            .to_i32()
            .ok_or(FormulaValue::Error(CellError::Num)),
        Some(FormulaValue::Error(e)) => Err(FormulaValue::Error(*e)),
        Some(FormulaValue::Empty) | None => Ok(0),
        _ => Err(FormulaValue::Error(CellError::Value)),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::FormulaResult;
    use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;
    use brushline_core::CellError;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::simple();
        evaluate(&ast, &ctx)
    }

    fn num(s: &str) -> FormulaValue {
        FormulaValue::Number(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_sum() {
        assert_eq!(eval("=SUM(1,2,3)").unwrap(), num("6"));
        assert_eq!(eval("=SUM(0.1,0.2)").unwrap(), num("0.3"));
        // Non-numeric values are ignored
        assert_eq!(eval("=SUM(1,\"a\",2)").unwrap(), num("3"));
    }

    #[test]
    fn test_sum_propagates_errors() {
        assert_eq!(
            eval("=SUM(1,1/0,3)").unwrap(),
            FormulaValue::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_average() {
        assert_eq!(eval("=AVERAGE(2,4,6)").unwrap(), num("4"));
        assert_eq!(
            eval("=AVERAGE(\"a\",\"b\")").unwrap(),
            FormulaValue::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_min_max() {
        assert_eq!(eval("=MIN(5,2,8,1)").unwrap(), num("1"));
        assert_eq!(eval("=MAX(5,2,8,1)").unwrap(), num("8"));
    }

    #[test]
    fn test_count() {
        assert_eq!(eval("=COUNT(1,2,\"a\",3)").unwrap(), num("3"));
    }

    #[test]
    fn test_abs() {
        assert_eq!(eval("=ABS(-5)").unwrap(), num("5"));
        assert_eq!(eval("=ABS(5)").unwrap(), num("5"));
        assert_eq!(eval("=ABS(-3.14)").unwrap(), num("3.14"));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(eval("=ROUND(2.5,0)").unwrap(), num("3"));
        assert_eq!(eval("=ROUND(2.4,0)").unwrap(), num("2"));
        assert_eq!(eval("=ROUND(-2.5,0)").unwrap(), num("-3"));
        assert_eq!(eval("=ROUND(12.345,2)").unwrap(), num("12.35"));
        assert_eq!(eval("=ROUND(-12.345,2)").unwrap(), num("-12.35"));
    }

    #[test]
    fn test_round_negative_digits() {
        assert_eq!(eval("=ROUND(1250,-2)").unwrap(), num("1300"));
        assert_eq!(eval("=ROUND(1249,-2)").unwrap(), num("1200"));
    }

    #[test]
    fn test_roundup_rounddown() {
        assert_eq!(eval("=ROUNDUP(3.2,0)").unwrap(), num("4"));
        assert_eq!(eval("=ROUNDUP(-3.2,0)").unwrap(), num("-4"));
        assert_eq!(eval("=ROUNDUP(3.14159,2)").unwrap(), num("3.15"));
        assert_eq!(eval("=ROUNDDOWN(3.9,0)").unwrap(), num("3"));
        assert_eq!(eval("=ROUNDDOWN(-3.9,0)").unwrap(), num("-3"));
        assert_eq!(eval("=ROUNDDOWN(3.14159,2)").unwrap(), num("3.14"));
    }

    #[test]
    fn test_ceiling_floor() {
        assert_eq!(eval("=CEILING(4.3)").unwrap(), num("5"));
        assert_eq!(eval("=CEILING(6.7,2)").unwrap(), num("8"));
        assert_eq!(eval("=CEILING(6,2)").unwrap(), num("6"));
        assert_eq!(eval("=FLOOR(4.7)").unwrap(), num("4"));
        assert_eq!(eval("=FLOOR(7.3,2)").unwrap(), num("6"));
        // Mixed signs are undefined
        assert_eq!(
            eval("=CEILING(-2.5,2)").unwrap(),
            FormulaValue::Error(CellError::Num)
        );
    }

    #[test]
    fn test_int() {
        assert_eq!(eval("=INT(3.7)").unwrap(), num("3"));
        assert_eq!(eval("=INT(-3.2)").unwrap(), num("-4"));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(eval("=SQRT(4)").unwrap(), num("2"));
        assert_eq!(eval("=SQRT(9)").unwrap(), num("3"));
        assert_eq!(
            eval("=SQRT(-1)").unwrap(),
            FormulaValue::Error(CellError::Num)
        );
    }

    #[test]
    fn test_mod() {
        assert_eq!(eval("=MOD(10,3)").unwrap(), num("1"));
        // Result takes the divisor's sign
        assert_eq!(eval("=MOD(-3,2)").unwrap(), num("1"));
        assert_eq!(eval("=MOD(3,-2)").unwrap(), num("-1"));
        assert_eq!(
            eval("=MOD(5,0)").unwrap(),
            FormulaValue::Error(CellError::Div0)
        );
    }
}
