//! Text functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use brushline_core::CellError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

fn text_arg(args: &[FormulaValue], idx: usize) -> Result<String, FormulaValue> {
    match args.get(idx) {
        Some(FormulaValue::Error(e)) => Err(FormulaValue::Error(*e)),
        Some(v) => Ok(v.as_string()),
        None => Ok(String::new()),
    }
}

fn count_arg(args: &[FormulaValue], idx: usize, default: i64) -> Result<i64, FormulaValue> {
    match args.get(idx) {
        Some(FormulaValue::Number(n)) => n
            .trunc()
            .to_i64()
            .ok_or(FormulaValue::Error(CellError::Value)),
        Some(FormulaValue::Error(e)) => Err(FormulaValue::Error(*e)),
        Some(FormulaValue::Empty) | None => Ok(default),
        _ => Err(FormulaValue::Error(CellError::Value)),
    }
}

/// LEN(text) - character count
pub fn fn_len(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match text_arg(args, 0) {
        Ok(s) => Ok(FormulaValue::Number(Decimal::from(s.chars().count()))),
        Err(v) => Ok(v),
    }
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(v) => return Ok(v),
    };
    let n = match count_arg(args, 1, 1) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };

    if n < 0 {
        return Ok(FormulaValue::Error(CellError::Value));
    }

    Ok(FormulaValue::Text(s.chars().take(n as usize).collect()))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(v) => return Ok(v),
    };
    let n = match count_arg(args, 1, 1) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };

    if n < 0 {
        return Ok(FormulaValue::Error(CellError::Value));
    }

    let chars: Vec<char> = s.chars().collect();
    let start = chars.len().saturating_sub(n as usize);
    Ok(FormulaValue::Text(chars[start..].iter().collect()))
}

/// MID(text, start_num, num_chars) - start_num is 1-based
pub fn fn_mid(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(v) => return Ok(v),
    };
    let start = match count_arg(args, 1, 1) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };
    let len = match count_arg(args, 2, 0) {
        Ok(n) => n,
        Err(v) => return Ok(v),
    };

    if start < 1 || len < 0 {
        return Ok(FormulaValue::Error(CellError::Value));
    }

    let result: String = s
        .chars()
        .skip((start - 1) as usize)
        .take(len as usize)
        .collect();
    Ok(FormulaValue::Text(result))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match text_arg(args, 0) {
        Ok(s) => Ok(FormulaValue::Text(s.to_lowercase())),
        Err(v) => Ok(v),
    }
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match text_arg(args, 0) {
        Ok(s) => Ok(FormulaValue::Text(s.to_uppercase())),
        Err(v) => Ok(v),
    }
}

/// TRIM(text) - strips leading/trailing spaces and collapses runs
pub fn fn_trim(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match text_arg(args, 0) {
        Ok(s) => Ok(FormulaValue::Text(
            s.split_whitespace().collect::<Vec<_>>().join(" "),
        )),
        Err(v) => Ok(v),
    }
}

/// CONCATENATE(text1, [text2], ...)
pub fn fn_concatenate(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let mut result = String::new();

    for arg in args {
        match arg {
            FormulaValue::Error(e) => return Ok(FormulaValue::Error(*e)),
            FormulaValue::Array(arr) => {
                for row in arr {
                    for cell in row {
                        if let FormulaValue::Error(e) = cell {
                            return Ok(FormulaValue::Error(*e));
                        }
                        result.push_str(&cell.as_string());
                    }
                }
            }
            v => result.push_str(&v.as_string()),
        }
    }

    Ok(FormulaValue::Text(result))
}

/// VALUE(text) - parse text as a number
pub fn fn_value(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match args.first() {
        Some(FormulaValue::Number(n)) => Ok(FormulaValue::Number(*n)),
        Some(FormulaValue::Error(e)) => Ok(FormulaValue::Error(*e)),
        Some(FormulaValue::Text(s)) => match Decimal::from_str(s.trim()) {
            Ok(n) => Ok(FormulaValue::Number(n)),
            Err(_) => Ok(FormulaValue::Error(CellError::Value)),
        },
        _ => Ok(FormulaValue::Error(CellError::Value)),
    }
}

/// TEXT(value, format_text)
///
/// Supports the number-format subset that estimate templates actually
/// use: fixed decimal places ("0", "0.00"), a thousands separator
/// ("#,##0.00"), and percent ("0%", "0.0%").
pub fn fn_text(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let value = match args.first() {
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(*e)),
        Some(v) => v.clone(),
        None => return Ok(FormulaValue::Error(CellError::Value)),
    };
    let format = match text_arg(args, 1) {
        Ok(s) => s,
        Err(v) => return Ok(v),
    };

    let n = match value.as_number() {
        Some(n) => n,
        // Non-numeric values pass through unchanged
        None => return Ok(FormulaValue::Text(value.as_string())),
    };

    let percent = format.ends_with('%');
    let n = if percent { n * Decimal::ONE_HUNDRED } else { n };

    let decimals = format
        .trim_end_matches('%')
        .rsplit_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| *c == '0').count() as u32)
        .unwrap_or(0);

    let rounded = n.round_dp_with_strategy(
        decimals,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    );

    let mut formatted = format!("{:.*}", decimals as usize, rounded);
    if format.contains(',') {
        formatted = group_thousands(&formatted);
    }
    if percent {
        formatted.push('%');
    }

    Ok(FormulaValue::Text(formatted))
}

fn group_thousands(s: &str) -> String {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
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

    fn text(s: &str) -> FormulaValue {
        FormulaValue::Text(s.into())
    }

    #[test]
    fn test_len() {
        assert_eq!(
            eval("=LEN(\"abc\")").unwrap(),
            FormulaValue::Number(Decimal::from(3))
        );
    }

    #[test]
    fn test_left_right_mid() {
        assert_eq!(eval("=LEFT(\"abcdef\",2)").unwrap(), text("ab"));
        assert_eq!(eval("=LEFT(\"abcdef\")").unwrap(), text("a"));
        assert_eq!(eval("=RIGHT(\"abcdef\",3)").unwrap(), text("def"));
        assert_eq!(eval("=MID(\"abcdef\",2,3)").unwrap(), text("bcd"));
        assert_eq!(
            eval("=MID(\"abc\",0,1)").unwrap(),
            FormulaValue::Error(CellError::Value)
        );
    }

    #[test]
    fn test_case_and_trim() {
        assert_eq!(eval("=LOWER(\"AbC\")").unwrap(), text("abc"));
        assert_eq!(eval("=UPPER(\"AbC\")").unwrap(), text("ABC"));
        assert_eq!(eval("=TRIM(\"  a   b  \")").unwrap(), text("a b"));
    }

    #[test]
    fn test_concatenate() {
        assert_eq!(
            eval("=CONCATENATE(\"a\",1,TRUE)").unwrap(),
            text("a1TRUE")
        );
    }

    #[test]
    fn test_value() {
        assert_eq!(
            eval("=VALUE(\"3.14\")").unwrap(),
            FormulaValue::Number(Decimal::from_str("3.14").unwrap())
        );
        assert_eq!(
            eval("=VALUE(\"abc\")").unwrap(),
            FormulaValue::Error(CellError::Value)
        );
    }

    #[test]
    fn test_text_format() {
        assert_eq!(eval("=TEXT(1234.5,\"0.00\")").unwrap(), text("1234.50"));
        assert_eq!(
            eval("=TEXT(1234567.891,\"#,##0.00\")").unwrap(),
            text("1,234,567.89")
        );
        assert_eq!(eval("=TEXT(0.125,\"0.0%\")").unwrap(), text("12.5%"));
        assert_eq!(eval("=TEXT(2.5,\"0\")").unwrap(), text("3"));
    }
}
