//! Tests for ForestService over in-memory and on-disk workbooks

mod common;

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use bograph::application::{ApplicationError, ApplicationResult, ForestService};
use bograph::domain::{DomainError, ForestNode, RenderLimits, Row};
use bograph::infrastructure::traits::{MemoryWorkbook, SheetSource, WorkbookOpener};
use bograph::infrastructure::workbook::CalamineOpener;
use bograph::util::testing;

use common::{example_objects, example_relations, workbook_in, T};

fn service() -> ForestService {
    ForestService::new(Arc::new(CalamineOpener))
}

/// Hands out a copy of one in-memory workbook for any path.
#[derive(Debug)]
struct FixedOpener(MemoryWorkbook);

impl WorkbookOpener for FixedOpener {
    fn open(&self, _path: &Path) -> ApplicationResult<Box<dyn SheetSource>> {
        Ok(Box::new(self.0.clone()))
    }
}

fn example_memory_workbook() -> MemoryWorkbook {
    MemoryWorkbook::new()
        .with_sheet(
            "Bo List",
            vec![
                Row::new().with("BO_GUID", "A").with("NAME", "Alpha"),
                Row::new().with("BO_GUID", "B").with("NAME", "Beta"),
                Row::new().with("BO_GUID", "C").with("NAME", "Gamma"),
            ],
        )
        .with_sheet(
            "Relations",
            vec![Row::new().with("BO_GUID", "A").with("REF_BO_GUID", "B")],
        )
}

fn expected_example() -> Vec<ForestNode> {
    vec![
        ForestNode::leaf("A", "Alpha").with_children(vec![ForestNode::leaf("B", "Beta")]),
        ForestNode::leaf("C", "Gamma"),
    ]
}

#[test]
fn given_both_sheets_when_building_then_returns_forest() {
    testing::init_test_setup();
    // Arrange
    let mut workbook = example_memory_workbook();

    // Act
    let forest = service().build(&mut workbook).unwrap();

    // Assert
    assert_eq!(forest.to_nodes(), expected_example());
}

#[test]
fn given_missing_relations_sheet_when_building_then_fails_with_missing_sheet() {
    // Arrange
    let mut workbook = MemoryWorkbook::new().with_sheet(
        "Bo List",
        vec![Row::new().with("BO_GUID", "A")],
    );

    // Act
    let result = service().build(&mut workbook);

    // Assert
    match result {
        Err(ApplicationError::Domain(DomainError::MissingSheet { sheet, available })) => {
            assert_eq!(sheet, "Relations");
            assert_eq!(available, vec!["Bo List".to_string()]);
        }
        other => panic!("expected MissingSheet, got {:?}", other.map(|f| f.to_nodes())),
    }
}

#[test]
fn given_missing_object_sheet_when_building_then_fails_with_missing_sheet() {
    let mut workbook = MemoryWorkbook::new().with_sheet("Relations", vec![]);

    let err = service().build(&mut workbook).unwrap_err();

    assert!(err.is_missing_sheet());
    assert!(err.to_string().contains("'Bo List'"));
}

#[test]
fn given_sheet_names_differing_in_case_or_whitespace_when_building_then_they_do_not_match() {
    let mut workbook = MemoryWorkbook::new()
        .with_sheet("bo list", vec![])
        .with_sheet("Relations ", vec![]);

    let err = service().build(&mut workbook).unwrap_err();

    assert!(err.is_missing_sheet());
}

#[test]
fn given_empty_sheets_when_building_then_forest_is_empty() {
    let mut workbook = MemoryWorkbook::new()
        .with_sheet("Bo List", vec![])
        .with_sheet("Relations", vec![]);

    let forest = service().build(&mut workbook).unwrap();

    assert!(forest.is_empty());
}

#[test]
fn given_xlsx_file_when_building_from_path_then_returns_forest() {
    testing::init_test_setup();
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = workbook_in(
        &temp,
        "example.xlsx",
        &[("Notes", vec![vec![T("ignored")]]), example_objects(), example_relations()],
    );

    // Act
    let forest = service().build_from_path(&path).unwrap();

    // Assert
    assert_eq!(forest.to_nodes(), expected_example());
}

#[test]
fn given_xlsx_without_relations_when_building_from_path_then_fails() {
    let temp = TempDir::new().unwrap();
    let path = workbook_in(&temp, "only-objects.xlsx", &[example_objects()]);

    let err = service().build_from_path(&path).unwrap_err();

    assert!(err.is_missing_sheet());
}

#[test]
fn given_non_workbook_file_when_building_from_path_then_fails_as_unsupported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("notes.txt");
    std::fs::write(&path, "BO_GUID,NAME\nA,Alpha\n").unwrap();

    let err = service().build_from_path(&path).unwrap_err();

    assert!(matches!(err, ApplicationError::UnsupportedWorkbook { .. }));
}

#[test]
fn given_injected_opener_when_building_from_path_then_it_is_used() {
    let service = ForestService::new(Arc::new(FixedOpener(example_memory_workbook())));

    let forest = service.build_from_path(Path::new("not-on-disk.xlsx")).unwrap();

    assert_eq!(forest.to_nodes(), expected_example());
}

#[test]
fn given_forest_deeper_than_limit_when_building_then_fails_as_domain_error() {
    // Arrange: A -> B -> C is three levels deep
    let mut workbook = MemoryWorkbook::new()
        .with_sheet(
            "Bo List",
            ["A", "B", "C"]
                .iter()
                .map(|id| Row::new().with("BO_GUID", *id))
                .collect(),
        )
        .with_sheet(
            "Relations",
            vec![
                Row::new().with("BO_GUID", "A").with("REF_BO_GUID", "B"),
                Row::new().with("BO_GUID", "B").with("REF_BO_GUID", "C"),
            ],
        );
    let service = service().with_limits(RenderLimits {
        max_depth: 2,
        ..RenderLimits::default()
    });

    // Act
    let err = service.build(&mut workbook).unwrap_err();

    // Assert
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::TooDeep { depth: 3, max: 2 })
    ));
    assert!(!err.is_missing_sheet());
}
