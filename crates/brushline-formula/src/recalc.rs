//! Workbook recalculation
//!
//! A full recalculation pass runs in phases: collect and parse every
//! formula cell, build the dependency graph, plan an evaluation order,
//! then evaluate cells precedents-first and write results back with an
//! evaluation timestamp. Cells on a reference cycle are not evaluated;
//! they receive the cycle error directly, and their dependents pick it
//! up through normal error propagation.

use crate::ast::FormulaExpr;
use crate::cache::ParseCache;
use crate::dependency::{CellKey, DependencyGraph};
use crate::error::FormulaResult;
use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
use ahash::AHashMap;
use brushline_core::{CellAddress, CellError, CellValue, Workbook};
use chrono::Utc;
use log::warn;
use std::sync::Arc;

/// Statistics from a recalculation run
#[derive(Debug, Clone, Default)]
pub struct RecalcStats {
    /// Total number of formula cells found
    pub formula_count: usize,
    /// Number of cells evaluated
    pub cells_evaluated: usize,
    /// Number of cells on a reference cycle
    pub circular_references: usize,
    /// Number of parse or evaluation failures
    pub errors: usize,
}

/// Tuning for a recalculation pass
#[derive(Debug, Clone)]
pub struct RecalcOptions {
    /// Maximum number of distinct formula strings kept in the parse cache
    pub parse_cache_capacity: usize,
}

impl Default for RecalcOptions {
    fn default() -> Self {
        Self {
            parse_cache_capacity: 1024,
        }
    }
}

/// Recalculates every formula cell in a workbook
#[derive(Debug, Default)]
pub struct Recalculator {
    parse_cache: ParseCache,
}

impl Recalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RecalcOptions) -> Self {
        Self::with_cache_capacity(options.parse_cache_capacity)
    }

    /// Create with a bounded parse cache
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            parse_cache: ParseCache::new(capacity),
        }
    }

    /// Recalculate all formulas in the workbook
    pub fn recalculate(&mut self, workbook: &mut Workbook) -> FormulaResult<RecalcStats> {
        let mut stats = RecalcStats::default();
        let evaluated_at = Utc::now();

        // Phase 1: collect and parse formulas, build the dependency graph
        let mut graph = DependencyGraph::new();
        let mut parsed: AHashMap<CellKey, Arc<FormulaExpr>> = AHashMap::new();
        let mut unparseable: Vec<CellKey> = Vec::new();
        let mut keys: Vec<CellKey> = Vec::new();

        let formulas: Vec<(CellKey, String)> = workbook
            .sheets()
            .enumerate()
            .flat_map(|(sheet_idx, sheet)| {
                sheet
                    .formula_cells()
                    .map(move |(addr, text)| {
                        (CellKey::from_address(sheet_idx, &addr), text.to_string())
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        stats.formula_count = formulas.len();

        for (key, text) in &formulas {
            match self.parse_cache.get_or_parse(text) {
                Ok(ast) => {
                    for reference in extract_references(&ast, key.sheet, workbook) {
                        graph.add_dependency(reference, *key);
                    }
                    parsed.insert(*key, ast);
                    keys.push(*key);
                }
                Err(e) => {
                    warn!(
                        "failed to parse formula at sheet {} cell {}: {}",
                        key.sheet,
                        key.address(),
                        e
                    );
                    unparseable.push(*key);
                    stats.errors += 1;
                }
            }
        }

        // Unparseable formulas surface as #VALUE! rather than stale results
        for key in &unparseable {
            write_result(workbook, *key, CellValue::Error(CellError::Value), evaluated_at);
        }

        // Sort for a deterministic plan regardless of map iteration order
        keys.sort_by_key(|k| (k.sheet, k.row, k.col));

        // Phase 2: plan evaluation order and find cycles
        let plan = graph.evaluation_plan(&keys);
        stats.circular_references = plan.cyclic.len();

        // Cycle members never evaluate; they get the cycle error directly
        for key in &plan.cyclic {
            write_result(
                workbook,
                *key,
                CellValue::Error(CellError::Circular),
                evaluated_at,
            );
        }

        // Phase 3: evaluate in dependency order
        for key in &plan.order {
            let ast = match parsed.get(key) {
                Some(ast) => Arc::clone(ast),
                None => continue,
            };

            let result = {
                let ctx = EvaluationContext::new(Some(workbook), key.sheet);
                match evaluate(&ast, &ctx) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(
                            "evaluation error at sheet {} cell {}: {}",
                            key.sheet,
                            key.address(),
                            e
                        );
                        stats.errors += 1;
                        FormulaValue::Error(CellError::Value)
                    }
                }
            };

            write_result(workbook, *key, result.into(), evaluated_at);
            stats.cells_evaluated += 1;
        }

        Ok(stats)
    }

    /// Parse cache hit count across all runs
    pub fn parse_cache_hits(&self) -> u64 {
        self.parse_cache.hits()
    }
}

fn write_result(
    workbook: &mut Workbook,
    key: CellKey,
    result: CellValue,
    evaluated_at: chrono::DateTime<Utc>,
) {
    if let Some(sheet) = workbook.sheet_mut(key.sheet) {
        sheet.set_formula_result(key.address(), result, evaluated_at);
    }
}

/// Extract every cell reference in a formula AST
fn extract_references(expr: &FormulaExpr, current_sheet: usize, workbook: &Workbook) -> Vec<CellKey> {
    let mut refs = Vec::new();
    collect_references(expr, current_sheet, workbook, &mut refs);
    refs
}

fn collect_references(
    expr: &FormulaExpr,
    current_sheet: usize,
    workbook: &Workbook,
    refs: &mut Vec<CellKey>,
) {
    match expr {
        FormulaExpr::CellRef(cell_ref) => {
            let sheet_idx = cell_ref
                .sheet
                .as_ref()
                .and_then(|name| workbook.sheet_index(name))
                .unwrap_or(current_sheet);
            refs.push(CellKey::new(
                sheet_idx,
                cell_ref.address.row,
                cell_ref.address.col,
            ));
        }
        FormulaExpr::RangeRef(range_ref) => {
            let sheet_idx = range_ref
                .sheet
                .as_ref()
                .and_then(|name| workbook.sheet_index(name))
                .unwrap_or(current_sheet);
            for addr in range_ref.range.iter() {
                refs.push(CellKey::from_address(sheet_idx, &addr));
            }
        }
        FormulaExpr::BinaryOp { left, right, .. } => {
            collect_references(left, current_sheet, workbook, refs);
            collect_references(right, current_sheet, workbook, refs);
        }
        FormulaExpr::UnaryOp { operand, .. } => {
            collect_references(operand, current_sheet, workbook, refs);
        }
        FormulaExpr::Function { args, .. } => {
            for arg in args {
                collect_references(arg, current_sheet, workbook, refs);
            }
        }
        FormulaExpr::Number(_)
        | FormulaExpr::Text(_)
        | FormulaExpr::Boolean(_)
        | FormulaExpr::Error(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn value(workbook: &Workbook, addr: &str) -> CellValue {
        let addr = CellAddress::parse(addr).unwrap();
        workbook.sheet(0).unwrap().value_at(addr)
    }

    fn number(workbook: &Workbook, addr: &str) -> Decimal {
        match value(workbook, addr) {
            CellValue::Number(n) => n,
            other => panic!("expected number at {}, got {:?}", addr, other),
        }
    }

    #[test]
    fn test_chain_evaluates_in_dependency_order() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_formula("A3", "=A2*2").unwrap();
        sheet.set_formula("A2", "=A1+1").unwrap();
        sheet.set_value("A1", CellValue::from(10i64)).unwrap();

        let stats = Recalculator::new().recalculate(&mut wb).unwrap();

        assert_eq!(stats.formula_count, 2);
        assert_eq!(stats.cells_evaluated, 2);
        assert_eq!(stats.errors, 0);
        assert_eq!(number(&wb, "A2"), Decimal::from(11));
        assert_eq!(number(&wb, "A3"), Decimal::from(22));
    }

    #[test]
    fn test_range_sum_matches_discrete_sum() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();

        // Literals in P138:Q142
        let mut expected = Decimal::ZERO;
        for row in 138..=142 {
            for col in ["P", "Q"] {
                let addr = format!("{}{}", col, row);
                let v = Decimal::from(row as i64 % 7 + 1);
                sheet.set_value(&addr, CellValue::Number(v)).unwrap();
                expected += v;
            }
        }
        sheet.set_formula("A1", "=SUM(P138:Q142)").unwrap();
        sheet
            .set_formula(
                "A2",
                "=SUM(P138,P139,P140,P141,P142,Q138,Q139,Q140,Q141,Q142)",
            )
            .unwrap();

        Recalculator::new().recalculate(&mut wb).unwrap();

        assert_eq!(number(&wb, "A1"), expected);
        assert_eq!(number(&wb, "A2"), expected);
    }

    #[test]
    fn test_cycle_is_contained() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_formula("A1", "=B1+1").unwrap();
        sheet.set_formula("B1", "=C1+1").unwrap();
        sheet.set_formula("C1", "=A1+1").unwrap();
        // D1 is independent and must still evaluate
        sheet.set_formula("D1", "=2+3").unwrap();

        let stats = Recalculator::new().recalculate(&mut wb).unwrap();

        assert_eq!(stats.circular_references, 3);
        assert_eq!(value(&wb, "A1"), CellValue::Error(CellError::Circular));
        assert_eq!(value(&wb, "B1"), CellValue::Error(CellError::Circular));
        assert_eq!(value(&wb, "C1"), CellValue::Error(CellError::Circular));
        assert_eq!(number(&wb, "D1"), Decimal::from(5));
    }

    #[test]
    fn test_dependent_of_cycle_propagates_error() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_formula("A1", "=B1").unwrap();
        sheet.set_formula("B1", "=A1").unwrap();
        sheet.set_formula("C1", "=A1+1").unwrap();

        Recalculator::new().recalculate(&mut wb).unwrap();

        assert_eq!(value(&wb, "A1"), CellValue::Error(CellError::Circular));
        // C1 is not on the cycle but reads a cyclic cell
        assert_eq!(value(&wb, "C1"), CellValue::Error(CellError::Circular));
    }

    #[test]
    fn test_unparseable_formula_becomes_value_error() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_formula("A1", "=SUM(").unwrap();
        sheet.set_formula("A2", "=1+1").unwrap();

        let stats = Recalculator::new().recalculate(&mut wb).unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(value(&wb, "A1"), CellValue::Error(CellError::Value));
        assert_eq!(number(&wb, "A2"), Decimal::from(2));
    }

    #[test]
    fn test_unknown_function_becomes_name_error() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_formula("A1", "=NOSUCHFN(1)").unwrap();
        sheet.set_formula("A2", "=A1*2").unwrap();

        Recalculator::new().recalculate(&mut wb).unwrap();

        assert_eq!(value(&wb, "A1"), CellValue::Error(CellError::Name));
        assert_eq!(value(&wb, "A2"), CellValue::Error(CellError::Name));
    }

    #[test]
    fn test_division_by_zero_flows_through_chain() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_value("A1", CellValue::from(1i64)).unwrap();
        sheet.set_value("A2", CellValue::from(0i64)).unwrap();
        sheet.set_formula("A3", "=A1/A2").unwrap();
        sheet.set_formula("A4", "=A3*100").unwrap();

        Recalculator::new().recalculate(&mut wb).unwrap();

        assert_eq!(value(&wb, "A3"), CellValue::Error(CellError::Div0));
        assert_eq!(value(&wb, "A4"), CellValue::Error(CellError::Div0));
    }

    #[test]
    fn test_recalculation_is_deterministic() {
        let build = || {
            let mut wb = Workbook::new();
            let sheet = wb.sheet_mut(0).unwrap();
            sheet
                .set_value("A1", CellValue::Number(Decimal::from_str("24.5").unwrap()))
                .unwrap();
            sheet
                .set_value("A2", CellValue::Number(Decimal::from_str("12.25").unwrap()))
                .unwrap();
            sheet.set_formula("B1", "=A1*A2").unwrap();
            sheet.set_formula("B2", "=ROUND(B1/350,2)").unwrap();
            sheet.set_formula("B3", "=B1+B2*0.1").unwrap();
            wb
        };

        let mut first = build();
        let mut second = build();
        Recalculator::new().recalculate(&mut first).unwrap();
        Recalculator::new().recalculate(&mut second).unwrap();

        for addr in ["B1", "B2", "B3"] {
            assert_eq!(value(&first, addr), value(&second, addr));
        }
    }

    #[test]
    fn test_cross_sheet_reference() {
        let mut wb = Workbook::new();
        wb.add_sheet("Pricing").unwrap();
        let pricing_idx = wb.sheet_index("Pricing").unwrap();
        wb.sheet_mut(pricing_idx)
            .unwrap()
            .set_value("C7", CellValue::from(45i64))
            .unwrap();
        wb.sheet_mut(0)
            .unwrap()
            .set_formula("A1", "=Pricing!C7*2")
            .unwrap();

        Recalculator::new().recalculate(&mut wb).unwrap();

        assert_eq!(number(&wb, "A1"), Decimal::from(90));
    }

    #[test]
    fn test_parse_cache_reused_across_runs() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_value("A1", CellValue::from(3i64)).unwrap();
        sheet.set_formula("B1", "=A1*2").unwrap();

        let mut recalc = Recalculator::new();
        recalc.recalculate(&mut wb).unwrap();
        recalc.recalculate(&mut wb).unwrap();

        assert!(recalc.parse_cache_hits() >= 1);
    }
}
