//! Shared fixtures: real workbooks written with rust_xlsxwriter.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

/// One cell of a fixture sheet.
#[derive(Debug, Clone, Copy)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
    Blank,
}

pub use Cell::{Blank, Number as N, Text as T};

pub type Sheet = (&'static str, Vec<Vec<Cell>>);

/// Write `sheets` (first row = header) to `path`.
pub fn write_workbook(path: &Path, sheets: &[Sheet]) {
    let mut workbook = Workbook::new();
    for (name, lines) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("sheet name");
        for (r, line) in lines.iter().enumerate() {
            for (c, cell) in line.iter().enumerate() {
                let (row, col) = (r as u32, c as u16);
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(row, col, *s).expect("write string");
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row, col, *n).expect("write number");
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    workbook.save(path).expect("save workbook");
}

/// Write a workbook into `dir` and return its path.
pub fn workbook_in(dir: &TempDir, file_name: &str, sheets: &[Sheet]) -> PathBuf {
    let path = dir.path().join(file_name);
    write_workbook(&path, sheets);
    path
}

/// `Bo List` of the Alpha/Beta/Gamma example.
pub fn example_objects() -> Sheet {
    (
        "Bo List",
        vec![
            vec![T("BO_GUID"), T("NAME")],
            vec![T("A"), T("Alpha")],
            vec![T("B"), T("Beta")],
            vec![T("C"), T("Gamma")],
        ],
    )
}

/// `Relations` of the Alpha/Beta/Gamma example: A -> B.
pub fn example_relations() -> Sheet {
    (
        "Relations",
        vec![vec![T("BO_GUID"), T("REF_BO_GUID")], vec![T("A"), T("B")]],
    )
}

/// Workbook with a single chain `N0 -> N1 -> ... -> N<len-1>`.
pub fn chain_workbook_in(dir: &TempDir, file_name: &str, len: u32) -> PathBuf {
    let path = dir.path().join(file_name);
    let mut workbook = Workbook::new();

    let objects = workbook.add_worksheet();
    objects.set_name("Bo List").expect("sheet name");
    objects.write_string(0, 0, "BO_GUID").expect("write header");
    for i in 0..len {
        objects
            .write_string(i + 1, 0, format!("N{}", i))
            .expect("write id");
    }

    let relations = workbook.add_worksheet();
    relations.set_name("Relations").expect("sheet name");
    relations.write_string(0, 0, "BO_GUID").expect("write header");
    relations.write_string(0, 1, "REF_BO_GUID").expect("write header");
    for i in 1..len {
        relations
            .write_string(i, 0, format!("N{}", i - 1))
            .expect("write parent");
        relations
            .write_string(i, 1, format!("N{}", i))
            .expect("write child");
    }

    workbook.save(&path).expect("save workbook");
    path
}
