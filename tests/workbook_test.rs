//! Tests for CalamineWorkbook decoding of real xlsx files

mod common;

use tempfile::TempDir;

use bograph::domain::CellValue;
use bograph::infrastructure::traits::SheetSource;
use bograph::infrastructure::workbook::CalamineWorkbook;

use common::{workbook_in, Blank, N, T};

#[test]
fn given_workbook_when_listing_sheets_then_keeps_workbook_order() {
    let temp = TempDir::new().unwrap();
    let path = workbook_in(
        &temp,
        "sheets.xlsx",
        &[
            ("Relations", vec![vec![T("BO_GUID")]]),
            ("Bo List", vec![vec![T("BO_GUID")]]),
        ],
    );

    let workbook = CalamineWorkbook::open(&path).unwrap();

    assert_eq!(workbook.sheet_names(), vec!["Relations", "Bo List"]);
}

#[test]
fn given_sheet_with_blanks_when_reading_then_rows_are_header_keyed() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = workbook_in(
        &temp,
        "rows.xlsx",
        &[(
            "Bo List",
            vec![
                vec![T("BO_GUID"), T("DESCRIPTION"), T("NAME")],
                vec![T("A"), Blank, T("Alpha")],
                vec![Blank, Blank, Blank],
                vec![N(42.0), T("The answer"), Blank],
            ],
        )],
    );
    let mut workbook = CalamineWorkbook::open(&path).unwrap();

    // Act
    let rows = workbook.read_sheet("Bo List").unwrap().unwrap();

    // Assert
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].text("BO_GUID").as_deref(), Some("A"));
    assert!(rows[0].get("DESCRIPTION").is_none());
    assert_eq!(rows[0].text("NAME").as_deref(), Some("Alpha"));
    assert_eq!(rows[1].get("BO_GUID"), Some(&CellValue::Number(42.0)));
    assert_eq!(rows[1].text("BO_GUID").as_deref(), Some("42"));
    assert_eq!(rows[1].text("DESCRIPTION").as_deref(), Some("The answer"));
}

#[test]
fn given_absent_sheet_when_reading_then_returns_none() {
    let temp = TempDir::new().unwrap();
    let path = workbook_in(&temp, "one.xlsx", &[("Bo List", vec![vec![T("BO_GUID")]])]);
    let mut workbook = CalamineWorkbook::open(&path).unwrap();

    assert!(workbook.read_sheet("Relations").unwrap().is_none());
}

#[test]
fn given_header_only_sheet_when_reading_then_returns_no_rows() {
    let temp = TempDir::new().unwrap();
    let path = workbook_in(
        &temp,
        "header.xlsx",
        &[("Relations", vec![vec![T("BO_GUID"), T("REF_BO_GUID")]])],
    );
    let mut workbook = CalamineWorkbook::open(&path).unwrap();

    let rows = workbook.read_sheet("Relations").unwrap().unwrap();

    assert!(rows.is_empty());
}

#[test]
fn given_missing_file_when_opening_then_errors() {
    let temp = TempDir::new().unwrap();

    let result = CalamineWorkbook::open(&temp.path().join("nope.xlsx"));

    assert!(result.is_err());
}
