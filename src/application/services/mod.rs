//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, StateStore,
//! BookmarkStore, Confirmer) but are themselves concrete structs, not traits.

mod sync;
mod workspace;

pub use sync::{StoreSyncService, SyncReport, CONFIRM_STORE_CLEAR, CONFIRM_STORE_IMPORT};
pub use workspace::{
    dated_file_name, WorkspaceService, CONFIRM_CLEAR_WORKSPACE, CONFIRM_DELETE_FOLDER,
    CONFIRM_REPLACE_WORKSPACE,
};
