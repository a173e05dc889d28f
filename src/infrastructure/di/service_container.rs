//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::ForestService;
use crate::config::Settings;
use crate::infrastructure::uploads::UploadStore;
use crate::infrastructure::workbook::CalamineOpener;

/// Container holding all application services.
///
/// Shared by the HTTP handlers as router state.
#[derive(Debug, Clone)]
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Workbook -> forest service
    pub forest: ForestService,

    /// Temporary storage for uploaded workbooks
    pub uploads: UploadStore,
}

impl ServiceContainer {
    /// Create a new service container from settings.
    pub fn new(settings: Settings) -> Self {
        let uploads = UploadStore::new(settings.upload.dir.clone(), settings.upload.keep_files);
        let forest =
            ForestService::new(Arc::new(CalamineOpener)).with_limits(settings.forest.limits());
        Self::with_deps(settings, forest, uploads)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, forest: ForestService, uploads: UploadStore) -> Self {
        Self {
            settings: Arc::new(settings),
            forest,
            uploads,
        }
    }
}
