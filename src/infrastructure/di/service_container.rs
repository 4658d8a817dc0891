//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{StoreSyncService, WorkspaceService};
use crate::config::Settings;
use crate::infrastructure::store::FileBookmarkStore;
use crate::infrastructure::traits::{
    AssumeYes, BookmarkStore, Confirmer, FileStateStore, FileSystem, RealFileSystem, Selector,
    SkimSelector, StateStore, TerminalConfirmer,
};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Saved workspace blob
    pub state: Arc<dyn StateStore>,

    /// Confirmation step before destructive actions
    pub confirmer: Arc<dyn Confirmer>,

    /// Interactive picker
    pub selector: Arc<dyn Selector>,

    store: Option<Arc<dyn BookmarkStore>>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// `assume_yes` replaces the terminal prompt with an automatic yes.
    pub fn new(settings: Settings, assume_yes: bool) -> Self {
        let confirmer: Arc<dyn Confirmer> = if assume_yes {
            Arc::new(AssumeYes)
        } else {
            Arc::new(TerminalConfirmer)
        };
        let state = Arc::new(FileStateStore::new(settings.data_dir.clone()));
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            state,
            confirmer,
            Arc::new(SkimSelector),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    ///
    /// The bookmark store is opened from `settings.store_path` on first use
    /// unless one is injected with [`ServiceContainer::with_store`].
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        state: Arc<dyn StateStore>,
        confirmer: Arc<dyn Confirmer>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            state,
            confirmer,
            selector,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn BookmarkStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn workspace(&self) -> WorkspaceService {
        WorkspaceService::new(
            Arc::clone(&self.fs),
            Arc::clone(&self.state),
            Arc::clone(&self.confirmer),
            Arc::clone(&self.settings),
        )
    }

    /// Sync service over the injected store, or the file store at `store_path`.
    pub fn store_sync(&self) -> InfraResult<StoreSyncService> {
        let store: Arc<dyn BookmarkStore> = match &self.store {
            Some(store) => Arc::clone(store),
            None => {
                let path = &self.settings.store_path;
                let store = FileBookmarkStore::open(path).map_err(|e| {
                    InfraError::io(format!("open bookmark store {}", path.display()), e)
                })?;
                Arc::new(store)
            }
        };
        Ok(StoreSyncService::new(
            store,
            Arc::clone(&self.fs),
            Arc::clone(&self.confirmer),
            Arc::clone(&self.settings),
        ))
    }
}
