//! Typed access to decoded spreadsheet rows.
//!
//! A decoded sheet is a list of [`Row`]s keyed by header text. Each row kind
//! declares its required and optional columns once in a [`RowSchema`]; the
//! `ingest_*` functions turn dynamic rows into [`ObjectRow`] / [`RelationRow`]
//! and are the only place where column names are looked up.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, instrument};

/// Sheet holding one business object per row.
pub const OBJECT_SHEET: &str = "Bo List";
/// Sheet holding one parent -> child edge per row.
pub const RELATION_SHEET: &str = "Relations";

pub const BO_GUID: &str = "BO_GUID";
pub const REF_BO_GUID: &str = "REF_BO_GUID";
pub const DESCRIPTION: &str = "DESCRIPTION";
pub const NAME: &str = "NAME";

/// Scalar value of a single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Render the cell the way it is used as an identifier or label.
    ///
    /// Whole numbers drop the fractional part so that a GUID column typed as
    /// numbers (`1.0`) matches the same id written as text (`"1"`).
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// One spreadsheet row: header text -> cell value. Empty cells are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and in-memory workbooks.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Text of a column, `None` when the column is absent or renders empty.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column)
            .map(CellValue::as_text)
            .filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Column contract of one row kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSchema {
    pub sheet: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

pub const OBJECT_SCHEMA: RowSchema = RowSchema {
    sheet: OBJECT_SHEET,
    required: &[BO_GUID],
    optional: &[DESCRIPTION, NAME],
};

pub const RELATION_SCHEMA: RowSchema = RowSchema {
    sheet: RELATION_SHEET,
    required: &[BO_GUID, REF_BO_GUID],
    optional: &[],
};

impl RowSchema {
    /// Required columns that are absent (or empty) in `row`.
    pub fn missing_fields(&self, row: &Row) -> Vec<&'static str> {
        self.required
            .iter()
            .copied()
            .filter(|column| row.text(column).is_none())
            .collect()
    }
}

/// A row of the object sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRow {
    pub id: String,
    pub description: Option<String>,
    pub name: Option<String>,
}

impl ObjectRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            name: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// `None` when the row carries no `BO_GUID`.
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            id: row.text(BO_GUID)?,
            description: row.text(DESCRIPTION),
            name: row.text(NAME),
        })
    }

    /// Display label: `DESCRIPTION`, then `NAME`, then the id.
    pub fn display_name(&self) -> &str {
        self.description
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.id)
    }
}

/// A row of the relation sheet.
///
/// Both ends are optional: a row without a parent still names its child,
/// and that child must not be reported as a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRow {
    pub parent: Option<String>,
    pub child: Option<String>,
}

impl RelationRow {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            child: Some(child.into()),
        }
    }

    pub fn from_row(row: &Row) -> Self {
        Self {
            parent: row.text(BO_GUID),
            child: row.text(REF_BO_GUID),
        }
    }
}

/// Typed object rows; rows without an id are dropped.
#[instrument(level = "debug", skip(rows), fields(rows = rows.len()))]
pub fn ingest_objects(rows: &[Row]) -> Vec<ObjectRow> {
    let mut skipped = 0usize;
    let objects: Vec<ObjectRow> = rows
        .iter()
        .filter_map(|row| {
            let object = ObjectRow::from_row(row);
            if object.is_none() {
                skipped += 1;
                debug!(
                    "skipping {} row, missing {:?}",
                    OBJECT_SCHEMA.sheet,
                    OBJECT_SCHEMA.missing_fields(row)
                );
            }
            object
        })
        .collect();
    if skipped > 0 {
        debug!("ingest_objects: kept={}, skipped={}", objects.len(), skipped);
    }
    objects
}

/// Typed relation rows; incomplete rows are kept (see [`RelationRow`]).
#[instrument(level = "debug", skip(rows), fields(rows = rows.len()))]
pub fn ingest_relations(rows: &[Row]) -> Vec<RelationRow> {
    rows.iter()
        .map(|row| {
            let missing = RELATION_SCHEMA.missing_fields(row);
            if !missing.is_empty() {
                debug!(
                    "incomplete {} row, missing {:?}",
                    RELATION_SCHEMA.sheet, missing
                );
            }
            RelationRow::from_row(row)
        })
        .collect()
}
