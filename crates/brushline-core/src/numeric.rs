//! Fixed-precision decimal arithmetic
//!
//! All monetary, area, and rate values in brushline flow through
//! [`NumericContext`] rather than native binary floats. The context pins the
//! rounding mode (round half away from zero, matching the legacy workbook's
//! numeric engine) and the number of fractional digits retained after
//! multiplication and division, so that every component produces
//! bit-identical results for the same inputs.
//!
//! The context is immutable by construction: it is `Copy`, has no setters,
//! and is built once at engine startup and threaded into every call site.
//! Sharing a single context everywhere is what rules out the precision-drift
//! class of bug (one module computing at 10 digits, another at 15).

use crate::cell::CellError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;

/// Fractional digits retained by [`NumericContext::standard`]
pub const STANDARD_PRECISION: u32 = 15;

/// Immutable arithmetic configuration threaded through every numeric call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericContext {
    precision: u32,
}

impl NumericContext {
    /// Create a context retaining `precision` fractional digits after
    /// multiplication and division
    pub const fn new(precision: u32) -> Self {
        Self { precision }
    }

    /// The single process-wide configuration used by the whole engine
    pub const fn standard() -> Self {
        Self::new(STANDARD_PRECISION)
    }

    /// Fractional digits retained after multiply/divide
    pub const fn precision(&self) -> u32 {
        self.precision
    }

    /// Exact addition
    pub fn add(&self, a: Decimal, b: Decimal) -> Decimal {
        a + b
    }

    /// Exact subtraction
    pub fn sub(&self, a: Decimal, b: Decimal) -> Decimal {
        a - b
    }

    /// Multiplication, rescaled to the configured precision
    pub fn mul(&self, a: Decimal, b: Decimal) -> Decimal {
        self.rescale(a * b)
    }

    /// Division, rescaled to the configured precision
    ///
    /// A zero divisor yields `CellError::Div0` as a value rather than
    /// panicking; callers surface it as an error-valued result.
    pub fn div(&self, a: Decimal, b: Decimal) -> std::result::Result<Decimal, CellError> {
        match a.checked_div(b) {
            Some(q) => Ok(self.rescale(q)),
            None => Err(CellError::Div0),
        }
    }

    /// Round half away from zero to `places` decimal places
    ///
    /// Negative `places` rounds to the left of the decimal point, so
    /// `round(1234.5, 0) == 1235` and `round(1250, -2) == 1300`.
    pub fn round(&self, value: Decimal, places: i32) -> Decimal {
        if places >= 0 {
            value.round_dp_with_strategy(places as u32, RoundingStrategy::MidpointAwayFromZero)
        } else {
            let factor = Decimal::from(10u64.pow(places.unsigned_abs().min(18)));
            let shifted = value
                .checked_div(factor)
                .unwrap_or(value)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            shifted * factor
        }
    }

    /// Smallest integer greater than or equal to `value`
    pub fn ceil(&self, value: Decimal) -> Decimal {
        value.ceil()
    }

    /// Total ordering on decimals
    pub fn cmp(&self, a: Decimal, b: Decimal) -> Ordering {
        a.cmp(&b)
    }

    fn rescale(&self, value: Decimal) -> Decimal {
        if value.scale() > self.precision {
            value.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero)
        } else {
            value
        }
    }
}

impl Default for NumericContext {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn round_half_up_parity() {
        let ctx = NumericContext::standard();
        assert_eq!(ctx.round(d("12.345"), 2), d("12.35"));
        assert_eq!(ctx.round(d("12.344"), 2), d("12.34"));
        assert_eq!(ctx.round(d("-12.345"), 2), d("-12.35"));
        assert_eq!(ctx.round(d("1234.5"), 0), d("1235"));
    }

    #[test]
    fn round_negative_places() {
        let ctx = NumericContext::standard();
        assert_eq!(ctx.round(d("1250"), -2), d("1300"));
        assert_eq!(ctx.round(d("1249"), -2), d("1200"));
    }

    #[test]
    fn float_hazards_are_exact() {
        let ctx = NumericContext::standard();
        assert_eq!(ctx.add(d("0.1"), d("0.2")), d("0.3"));
        assert_eq!(ctx.sub(d("0.3"), d("0.1")), d("0.2"));
    }

    #[test]
    fn divide_by_zero_is_typed() {
        let ctx = NumericContext::standard();
        assert_eq!(ctx.div(d("1"), Decimal::ZERO), Err(CellError::Div0));
        assert_eq!(ctx.div(d("10"), d("4")), Ok(d("2.5")));
    }

    #[test]
    fn mul_rescales_to_precision() {
        let ctx = NumericContext::new(4);
        assert_eq!(ctx.mul(d("0.12345"), d("1")), d("0.1235"));
        // Scales below the limit are left untouched
        assert_eq!(ctx.mul(d("0.12"), d("1")), d("0.12"));
    }

    #[test]
    fn ceil_rounds_up() {
        let ctx = NumericContext::standard();
        assert_eq!(ctx.ceil(d("2.01")), d("3"));
        assert_eq!(ctx.ceil(d("2")), d("2"));
    }

    #[test]
    fn shared_configuration_is_identical() {
        // Any two components asking for the standard context observe the
        // same configuration value.
        assert_eq!(NumericContext::standard(), NumericContext::default());
        assert_eq!(
            NumericContext::standard().precision(),
            STANDARD_PRECISION
        );
    }
}
