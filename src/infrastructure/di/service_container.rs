//! Service container for dependency injection
//!
//! Wires up the tree service with its storage.

use std::sync::Arc;

use crate::application::services::TreeService;
use crate::application::{ApplicationResult, ForestRepository, LoadOutcome};
use crate::config::Settings;
use crate::domain::IdSource;
use crate::infrastructure::store::FileKeyValueStore;
use crate::infrastructure::traits::{FileSystem, KeyValueStore, RealFileSystem};

/// Container holding settings and I/O dependencies.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Store the forest is persisted in
    pub store: Arc<dyn KeyValueStore>,
}

impl ServiceContainer {
    /// Create a container with a file-backed store in `settings.data_dir`.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(FileKeyValueStore::new(fs.clone(), settings.data_dir.clone()));
        Self::with_deps(settings, fs, store)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, store }
    }

    pub fn repository(&self) -> ForestRepository {
        ForestRepository::new(self.store.clone(), self.settings.storage_key.clone())
    }

    /// Open the tree service, loading the stored forest.
    pub fn tree_service(&self) -> ApplicationResult<(TreeService, LoadOutcome)> {
        let (service, outcome) = TreeService::open(self.repository(), self.settings.layout)?;
        Ok((service.with_max_children(self.settings.max_children), outcome))
    }

    /// Open the tree service with a specific id source.
    pub fn tree_service_with_ids(
        &self,
        ids: Box<dyn IdSource>,
    ) -> ApplicationResult<(TreeService, LoadOutcome)> {
        let (service, outcome) =
            TreeService::open_with_ids(self.repository(), self.settings.layout, ids)?;
        Ok((service.with_max_children(self.settings.max_children), outcome))
    }
}
