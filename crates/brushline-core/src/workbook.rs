//! Workbook: an ordered collection of sheets

use crate::error::{Error, Result};
use crate::sheet::Sheet;

/// An ordered collection of named sheets
///
/// A new workbook starts with one sheet ("Sheet1"), matching the legacy
/// template layout convention.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Create a workbook with a single empty sheet
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new("Sheet1")],
        }
    }

    /// Create a workbook with no sheets
    pub fn empty() -> Self {
        Self { sheets: Vec::new() }
    }

    /// Number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Add a sheet with the given name, returning its index
    pub fn add_sheet<S: Into<String>>(&mut self, name: S) -> Result<usize> {
        let name = name.into();
        if self.sheet_index(&name).is_some() {
            return Err(Error::DuplicateSheetName(name));
        }
        self.sheets.push(Sheet::new(name));
        Ok(self.sheets.len() - 1)
    }

    /// Find a sheet index by name (case-insensitive, as the legacy workbook
    /// resolves sheet references)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Borrow a sheet by index
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Mutably borrow a sheet by index
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// Iterate over sheets in order
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_lookup_is_case_insensitive() {
        let mut wb = Workbook::new();
        wb.add_sheet("Pricing").unwrap();

        assert_eq!(wb.sheet_index("pricing"), Some(1));
        assert_eq!(wb.sheet_index("Sheet1"), Some(0));
        assert_eq!(wb.sheet_index("Missing"), None);
    }

    #[test]
    fn duplicate_sheet_names_rejected() {
        let mut wb = Workbook::new();
        wb.add_sheet("Rates").unwrap();
        assert!(matches!(
            wb.add_sheet("rates"),
            Err(Error::DuplicateSheetName(_))
        ));
    }
}
