//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::HierarchyService;
use crate::config::Settings;
use crate::infrastructure::tabular::CsvRowSource;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, RowSource};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub hierarchy: HierarchyService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(CsvRowSource))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        rows: Arc<dyn RowSource>,
    ) -> Self {
        let settings = Arc::new(settings);
        let hierarchy = HierarchyService::new(fs, rows, settings.clone());

        Self {
            settings,
            hierarchy,
        }
    }
}
