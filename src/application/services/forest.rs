//! Forest service
//!
//! Pulls the object and relation sheets out of a workbook and builds the
//! business object hierarchy from them.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::ApplicationResult;
use crate::domain::{
    DomainError, Forest, GraphBuilder, RenderLimits, Row, OBJECT_SHEET, RELATION_SHEET,
};
use crate::infrastructure::traits::{SheetSource, WorkbookOpener};

/// Service turning workbooks into forests.
#[derive(Debug, Clone)]
pub struct ForestService {
    opener: Arc<dyn WorkbookOpener>,
    builder: GraphBuilder,
    limits: RenderLimits,
}

impl ForestService {
    /// Create a service with default render limits.
    pub fn new(opener: Arc<dyn WorkbookOpener>) -> Self {
        Self {
            opener,
            builder: GraphBuilder::new(),
            limits: RenderLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: RenderLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> RenderLimits {
        self.limits
    }

    /// Build the forest from a workbook file on disk.
    #[instrument(level = "debug", skip(self))]
    pub fn build_from_path(&self, path: &Path) -> ApplicationResult<Forest> {
        let mut workbook = self.opener.open(path)?;
        self.build(workbook.as_mut())
    }

    /// Build the forest from any sheet source.
    ///
    /// Both sheets are fetched before anything is built, so a workbook missing
    /// either one fails without a partial result. A forest whose rendering
    /// would exceed the configured limits is rejected.
    pub fn build(&self, source: &mut dyn SheetSource) -> ApplicationResult<Forest> {
        let object_rows = required_sheet(source, OBJECT_SHEET)?;
        let relation_rows = required_sheet(source, RELATION_SHEET)?;
        debug!(
            "build: {} object rows, {} relation rows",
            object_rows.len(),
            relation_rows.len()
        );

        let forest = self.builder.build_from_rows(&object_rows, &relation_rows);
        let extent = forest.check(self.limits)?;
        info!(
            "built forest: roots={}, objects={}, rendered={}, depth={}",
            forest.roots().len(),
            forest.node_count(),
            extent.nodes,
            extent.depth
        );
        Ok(forest)
    }
}

fn required_sheet(source: &mut dyn SheetSource, sheet: &str) -> ApplicationResult<Vec<Row>> {
    match source.read_sheet(sheet)? {
        Some(rows) => Ok(rows),
        None => Err(DomainError::MissingSheet {
            sheet: sheet.to_string(),
            available: source.sheet_names(),
        }
        .into()),
    }
}
