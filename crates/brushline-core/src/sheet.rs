//! Sheet: a named, sparse grid of cells

use crate::cell::{Cell, CellAddress, CellValue};
use crate::error::Result;
use ahash::AHashMap;
use chrono::{DateTime, Utc};

/// A single sheet of cells
///
/// Cells are stored sparsely; unset addresses read as `CellValue::Empty`.
/// Sheets are loaded once from a template definition and act as static
/// formula definitions for the process lifetime; only the recalculation
/// engine mutates resolved values.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    cells: AHashMap<CellAddress, Cell>,
}

impl Sheet {
    /// Create an empty sheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: AHashMap::new(),
        }
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Set a literal value at an A1-style address
    pub fn set_value<V: Into<CellValue>>(&mut self, addr: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(addr)?;
        self.set_value_at(addr, value.into());
        Ok(())
    }

    /// Set a literal value at a parsed address
    pub fn set_value_at(&mut self, addr: CellAddress, value: CellValue) {
        self.cells.insert(addr, Cell::new(value));
    }

    /// Set a formula at an A1-style address
    pub fn set_formula<S: Into<String>>(&mut self, addr: &str, text: S) -> Result<()> {
        let addr = CellAddress::parse(addr)?;
        self.cells.insert(addr, Cell::formula(text));
        Ok(())
    }

    /// Borrow the cell at an address, if occupied
    pub fn cell(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(&addr)
    }

    /// Mutably borrow the cell at an address, if occupied
    pub fn cell_mut(&mut self, addr: CellAddress) -> Option<&mut Cell> {
        self.cells.get_mut(&addr)
    }

    /// The resolved value at an address (formula cells yield their cached
    /// result); unset addresses read as `Empty`
    pub fn value_at(&self, addr: CellAddress) -> CellValue {
        self.cells
            .get(&addr)
            .map(|c| c.resolved())
            .unwrap_or(CellValue::Empty)
    }

    /// Iterate over all formula cells as `(address, formula_text)`
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> + '_ {
        self.cells.iter().filter_map(|(addr, cell)| {
            cell.value.formula_text().map(|text| (*addr, text))
        })
    }

    /// Store an evaluation result into a formula cell and stamp it
    ///
    /// Non-formula cells are left untouched (the evaluator never overwrites
    /// literals).
    pub fn set_formula_result(
        &mut self,
        addr: CellAddress,
        result: CellValue,
        evaluated_at: DateTime<Utc>,
    ) {
        if let Some(cell) = self.cells.get_mut(&addr) {
            if let CellValue::Formula { cached_value, .. } = &mut cell.value {
                *cached_value = Some(Box::new(result));
                cell.last_evaluated_at = Some(evaluated_at);
            }
        }
    }
}
