//! Formula evaluation through the public API, exercising the same
//! shapes the legacy estimating workbook uses.

use brushline::prelude::*;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::str::FromStr;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn number_at(workbook: &Workbook, sheet: usize, addr: &str) -> Decimal {
    let address = CellAddress::parse(addr).unwrap();
    match workbook.sheet(sheet).unwrap().value_at(address) {
        CellValue::Number(n) => n,
        other => panic!("expected number at {addr}, got {other:?}"),
    }
}

#[test]
fn measurement_sheet_evaluates_like_the_workbook() {
    let mut workbook = Workbook::new();
    let sheet = workbook.sheet_mut(0).unwrap();

    // Room dimensions
    sheet.set_value("B2", d("24.5")).unwrap();  // length
    sheet.set_value("B3", d("12.25")).unwrap(); // width
    sheet.set_value("B4", d("9")).unwrap();     // height
    sheet.set_value("B5", d("1")).unwrap();     // doors
    sheet.set_value("B6", d("2")).unwrap();     // windows

    // Wall area with opening deductions, floored at zero
    sheet
        .set_formula("C2", "=MAX(0, 2*(B2+B3)*B4 - B5*21 - B6*15)")
        .unwrap();
    // Gallons, whole units after 10% wastage
    sheet
        .set_formula("C3", "=CEILING(C2*1.1/350, 1)")
        .unwrap();

    let mut recalc = Recalculator::new();
    recalc.recalculate(&mut workbook).unwrap();

    assert_eq!(number_at(&workbook, 0, "C2"), d("610.5"));
    assert_eq!(number_at(&workbook, 0, "C3"), d("2"));
}

#[test]
fn cross_sheet_lookups_resolve() {
    let mut workbook = Workbook::new();
    workbook.add_sheet("Rates").unwrap();

    let rates_idx = workbook.sheet_index("Rates").unwrap();
    let rates = workbook.sheet_mut(rates_idx).unwrap();
    rates.set_value("A1", d("1")).unwrap();
    rates.set_value("B1", d("25")).unwrap();
    rates.set_value("A2", d("2")).unwrap();
    rates.set_value("B2", d("45")).unwrap();
    rates.set_value("A3", d("3")).unwrap();
    rates.set_value("B3", d("70")).unwrap();

    let sheet = workbook.sheet_mut(0).unwrap();
    sheet.set_value("A1", d("2")).unwrap();
    sheet
        .set_formula("B1", "=VLOOKUP(A1, Rates!A1:B3, 2, FALSE)")
        .unwrap();

    let mut recalc = Recalculator::new();
    recalc.recalculate(&mut workbook).unwrap();

    assert_eq!(number_at(&workbook, 0, "B1"), d("45"));
}

#[test]
fn circular_cells_are_contained() {
    let mut workbook = Workbook::new();
    let sheet = workbook.sheet_mut(0).unwrap();
    sheet.set_formula("A1", "=B1+1").unwrap();
    sheet.set_formula("B1", "=A1+1").unwrap();
    sheet.set_formula("C1", "=2+3").unwrap();

    let mut recalc = Recalculator::new();
    let stats = recalc.recalculate(&mut workbook).unwrap();

    assert_eq!(stats.circular_references, 2);
    let sheet = workbook.sheet(0).unwrap();
    assert_eq!(
        sheet.value_at(CellAddress::parse("A1").unwrap()),
        CellValue::Error(CellError::Circular)
    );
    assert_eq!(
        sheet.value_at(CellAddress::parse("C1").unwrap()),
        CellValue::Number(d("5"))
    );
}

#[test]
fn decimal_arithmetic_has_no_float_drift() {
    let mut workbook = Workbook::new();
    let sheet = workbook.sheet_mut(0).unwrap();
    sheet.set_formula("A1", "=0.1+0.2").unwrap();
    sheet.set_formula("A2", "=ROUND(2.675, 2)").unwrap();

    let mut recalc = Recalculator::new();
    recalc.recalculate(&mut workbook).unwrap();

    assert_eq!(number_at(&workbook, 0, "A1"), d("0.3"));
    // Half away from zero, where binary floats round 2.675 down
    assert_eq!(number_at(&workbook, 0, "A2"), d("2.68"));
}
