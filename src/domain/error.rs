//! Domain-level errors (no external dependencies)

use itertools::Itertools;
use thiserror::Error;

/// Domain errors represent violations of the workbook contract.
/// Everything else the builder absorbs into the shape of the forest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("required sheet not found: '{sheet}' (workbook has: {})", format_sheets(.available))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    #[error("hierarchy too deep: {depth} levels (limit {max})")]
    TooDeep { depth: usize, max: usize },

    #[error("hierarchy too large: more than {max} rendered nodes")]
    TooManyNodes { max: usize },
}

fn format_sheets(sheets: &[String]) -> String {
    if sheets.is_empty() {
        "no sheets".to_string()
    } else {
        sheets.iter().map(|s| format!("'{}'", s)).join(", ")
    }
}
