//! Date functions
//!
//! Dates are stored as serial numbers in the 1900 system, where
//! 1900-01-01 is serial 1. The system includes the historical
//! "1900 leap year" quirk: the non-existent day 1900-02-29 occupies
//! serial 60, and every later date is shifted by one relative to the
//! real calendar. Serial arithmetic must reproduce this to stay
//! compatible with workbook-authored formulas.

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use brushline_core::CellError;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

fn is_leap_gregorian(year: i32) -> bool {
    (year % 4 == 0) && ((year % 100 != 0) || (year % 400 == 0))
}

fn days_in_year(year: i32) -> i64 {
    // 1900 counts as a leap year in this serial system
    if year == 1900 || is_leap_gregorian(year) {
        366
    } else {
        365
    }
}

fn days_in_month(year: i32, month: u32) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        2 => {
            if year == 1900 || is_leap_gregorian(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// Serial for the first day of the given month (1900-01-01 == 1)
fn serial_month_start(year: i32, month: u32) -> i64 {
    let mut days: i64 = 0;
    for y in 1900..year {
        days += days_in_year(y);
    }
    for m in 1..month {
        days += days_in_month(year, m);
    }
    1 + days
}

fn serial_from_ymd(year: i32, month: u32, day: i32) -> i64 {
    serial_month_start(year, month) + (day as i64) - 1
}

fn ymd_from_serial(serial: i64) -> Option<(i32, u32, u32)> {
    if serial < 1 {
        return None;
    }
    // Serial 60 is the fictional 1900-02-29
    if serial == 60 {
        return Some((1900, 2, 29));
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 31)?;
    let adjusted = if serial > 60 { serial - 1 } else { serial };
    let date = base.checked_add_signed(Duration::days(adjusted))?;
    Some((date.year(), date.month(), date.day()))
}

fn scalar_number(args: &[FormulaValue], idx: usize) -> Result<Decimal, FormulaValue> {
    match args.get(idx) {
        Some(FormulaValue::Error(e)) => Err(FormulaValue::Error(*e)),
        Some(FormulaValue::Array(_)) => Err(FormulaValue::Error(CellError::Value)),
        Some(v) => v
            .as_number()
            .ok_or(FormulaValue::Error(CellError::Value)),
        None => Err(FormulaValue::Error(CellError::Value)),
    }
}

fn serial_arg(args: &[FormulaValue]) -> Result<(i32, u32, u32), FormulaValue> {
    let n = scalar_number(args, 0)?;
    let serial = n
        .floor()
        .to_i64()
        .ok_or(FormulaValue::Error(CellError::Num))?;
    ymd_from_serial(serial).ok_or(FormulaValue::Error(CellError::Num))
}

/// DATE(year, month, day)
///
/// Years 0..=1899 are interpreted as 1900..=3799. Month overflow and
/// underflow normalize into adjacent years; out-of-range day values
/// roll through the serial arithmetic.
pub fn fn_date(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut parts = [0_i64; 3];
    for (i, part) in parts.iter_mut().enumerate() {
        let n = match scalar_number(args, i) {
            Ok(n) => n,
            Err(v) => return Ok(v),
        };
        *part = match n.trunc().to_i64() {
            Some(v) => v,
            None => return Ok(FormulaValue::Error(CellError::Num)),
        };
    }
    let (mut year, month, day) = (parts[0], parts[1], parts[2]);

    if (0..1900).contains(&year) {
        year += 1900;
    }
    if !(1900..=9999).contains(&year) {
        return Ok(FormulaValue::Error(CellError::Num));
    }

    // Normalize month overflow/underflow using a 0-based month index
    let total_months = year * 12 + (month - 1);
    let norm_year = total_months.div_euclid(12) as i32;
    let norm_month = total_months.rem_euclid(12) as u32 + 1;

    if norm_year < 1900 {
        return Ok(FormulaValue::Error(CellError::Num));
    }

    let serial = serial_from_ymd(norm_year, norm_month, day as i32);
    if serial < 1 {
        return Ok(FormulaValue::Error(CellError::Num));
    }

    Ok(FormulaValue::Number(Decimal::from(serial)))
}

/// YEAR(serial)
pub fn fn_year(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match serial_arg(args) {
        Ok((y, _m, _d)) => Ok(FormulaValue::Number(Decimal::from(y))),
        Err(v) => Ok(v),
    }
}

/// MONTH(serial)
pub fn fn_month(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match serial_arg(args) {
        Ok((_y, m, _d)) => Ok(FormulaValue::Number(Decimal::from(m))),
        Err(v) => Ok(v),
    }
}

/// DAY(serial)
pub fn fn_day(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match serial_arg(args) {
        Ok((_y, _m, d)) => Ok(FormulaValue::Number(Decimal::from(d))),
        Err(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::FormulaResult;
    use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;
    use brushline_core::CellError;
    use rust_decimal::Decimal;

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::simple();
        evaluate(&ast, &ctx)
    }

    fn num(n: i64) -> FormulaValue {
        FormulaValue::Number(Decimal::from(n))
    }

    #[test]
    fn test_epoch() {
        assert_eq!(eval("=DATE(1900,1,1)").unwrap(), num(1));
        assert_eq!(eval("=DATE(1900,1,31)").unwrap(), num(31));
    }

    #[test]
    fn test_1900_leap_quirk() {
        // The non-existent 1900-02-29 occupies serial 60
        assert_eq!(eval("=DATE(1900,2,28)").unwrap(), num(59));
        assert_eq!(eval("=DATE(1900,2,29)").unwrap(), num(60));
        assert_eq!(eval("=DATE(1900,3,1)").unwrap(), num(61));

        assert_eq!(eval("=YEAR(60)").unwrap(), num(1900));
        assert_eq!(eval("=MONTH(60)").unwrap(), num(2));
        assert_eq!(eval("=DAY(60)").unwrap(), num(29));
    }

    #[test]
    fn test_round_trip_modern_date() {
        // 2024-03-15 is serial 45366 in the 1900 system
        assert_eq!(eval("=DATE(2024,3,15)").unwrap(), num(45366));
        assert_eq!(eval("=YEAR(45366)").unwrap(), num(2024));
        assert_eq!(eval("=MONTH(45366)").unwrap(), num(3));
        assert_eq!(eval("=DAY(45366)").unwrap(), num(15));
    }

    #[test]
    fn test_two_digit_year_adjustment() {
        assert_eq!(eval("=YEAR(DATE(108,1,2))").unwrap(), num(2008));
    }

    #[test]
    fn test_month_normalization() {
        // Month 13 rolls into the next year
        assert_eq!(
            eval("=DATE(2023,13,1)").unwrap(),
            eval("=DATE(2024,1,1)").unwrap()
        );
        // Day 0 is the last day of the previous month
        assert_eq!(
            eval("=DATE(1900,3,0)").unwrap(),
            eval("=DATE(1900,2,29)").unwrap()
        );
    }

    #[test]
    fn test_invalid_serial() {
        assert_eq!(
            eval("=YEAR(0)").unwrap(),
            FormulaValue::Error(CellError::Num)
        );
        assert_eq!(
            eval("=YEAR(-5)").unwrap(),
            FormulaValue::Error(CellError::Num)
        );
    }
}
