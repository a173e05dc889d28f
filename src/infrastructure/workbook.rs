//! Workbook decoding with calamine.
//!
//! Rows are decoded the way spreadsheet-to-JSON exporters do it: the first
//! non-blank row is the header, every following row becomes a map from
//! header text to cell value, empty cells are left out and blank rows are
//! skipped.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{CellValue, Row};
use crate::infrastructure::traits::{SheetSource, WorkbookOpener};

/// A workbook file opened with calamine (xlsx, xlsm, xlsb, xls, ods).
pub struct CalamineWorkbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl std::fmt::Debug for CalamineWorkbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalamineWorkbook")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CalamineWorkbook {
    /// Open a workbook. Known extensions pick the decoder directly; other
    /// files are tried against each supported format in turn.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> ApplicationResult<Self> {
        let sheets = open_workbook_auto(path).map_err(|e| ApplicationError::UnsupportedWorkbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// [`WorkbookOpener`] for files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineOpener;

impl WorkbookOpener for CalamineOpener {
    fn open(&self, path: &Path) -> ApplicationResult<Box<dyn SheetSource>> {
        Ok(Box::new(CalamineWorkbook::open(path)?))
    }
}

impl SheetSource for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> ApplicationResult<Option<Vec<Row>>> {
        if !self.sheets.sheet_names().iter().any(|s| s == name) {
            return Ok(None);
        }
        let range =
            self.sheets
                .worksheet_range(name)
                .map_err(|e| ApplicationError::UnsupportedWorkbook {
                    path: self.path.clone(),
                    message: format!("sheet '{}': {}", name, e),
                })?;
        let rows = decode_rows(&range);
        debug!("read_sheet: '{}' -> {} rows", name, rows.len());
        Ok(Some(rows))
    }
}

/// Decode a cell range into header-keyed rows.
pub fn decode_rows(range: &Range<Data>) -> Vec<Row> {
    let mut lines = range
        .rows()
        .skip_while(|line| line.iter().all(|cell| cell_value(cell).is_none()));

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let header = header_names(header_line);

    lines
        .map(|line| {
            header
                .iter()
                .zip(line.iter())
                .filter_map(|(column, cell)| Some((column.clone()?, cell_value(cell)?)))
                .collect::<Row>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// Header text per column. Blank header cells yield `None`; repeated names
/// get a `_1`, `_2`, ... suffix so the first column keeps the plain name.
fn header_names(line: &[Data]) -> Vec<Option<String>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    line.iter()
        .map(|cell| {
            let name = cell_value(cell)?.as_text();
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}_{}", name, count)
            };
            *count += 1;
            Some(unique)
        })
        .collect()
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(_) | Data::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_of(cells: Vec<Vec<Data>>) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, line) in cells.into_iter().enumerate() {
            for (c, cell) in line.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_decode_rows_uses_first_non_blank_row_as_header() {
        let range = range_of(vec![
            vec![Data::Empty, Data::Empty],
            vec![s("BO_GUID"), s("NAME")],
            vec![s("A"), s("Alpha")],
            vec![Data::Empty, Data::Empty],
            vec![Data::Float(7.0), Data::Empty],
        ]);

        let rows = decode_rows(&range);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("BO_GUID").as_deref(), Some("A"));
        assert_eq!(rows[0].text("NAME").as_deref(), Some("Alpha"));
        assert_eq!(rows[1].text("BO_GUID").as_deref(), Some("7"));
        assert!(rows[1].get("NAME").is_none());
    }

    #[test]
    fn test_decode_rows_suffixes_repeated_headers() {
        let range = range_of(vec![
            vec![s("NAME"), s("NAME"), Data::Empty],
            vec![s("first"), s("second"), s("ignored")],
        ]);

        let rows = decode_rows(&range);

        assert_eq!(rows[0].text("NAME").as_deref(), Some("first"));
        assert_eq!(rows[0].text("NAME_1").as_deref(), Some("second"));
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_decode_rows_of_header_only_sheet_is_empty() {
        let range = range_of(vec![vec![s("BO_GUID"), s("REF_BO_GUID")]]);
        assert!(decode_rows(&range).is_empty());
    }
}
