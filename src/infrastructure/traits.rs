//! I/O boundary traits for testability
//!
//! Services read workbooks through [`SheetSource`] and open workbook files
//! through [`WorkbookOpener`], so they can be driven by in-memory workbooks
//! in tests.

use std::fmt::Debug;
use std::path::Path;

use crate::application::ApplicationResult;
use crate::domain::Row;

/// A workbook whose sheets can be read as header-keyed rows.
pub trait SheetSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Rows of the sheet with exactly this name, `None` if there is no such sheet.
    fn read_sheet(&mut self, name: &str) -> ApplicationResult<Option<Vec<Row>>>;
}

/// Opens a workbook file as a [`SheetSource`].
pub trait WorkbookOpener: Send + Sync + Debug {
    fn open(&self, path: &Path) -> ApplicationResult<Box<dyn SheetSource>>;
}

// ============================================================
// IN-MEMORY IMPLEMENTATION
// ============================================================

/// Workbook held in memory, sheets kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Vec<Row>)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sheet.
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        let name = name.into();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = rows,
            None => self.sheets.push((name, rows)),
        }
        self
    }
}

impl SheetSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> ApplicationResult<Option<Vec<Row>>> {
        Ok(self
            .sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rows)| rows.clone()))
    }
}
