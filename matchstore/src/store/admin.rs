use crate::errors::StoreResult;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Document count per collection, sorted by collection name.
pub type StoreStats = BTreeMap<String, usize>;

/// Administrative operations offered by backends that own their storage.
///
/// Only the local store implements this. Callers check for it through
/// [DocumentStore::supports_administration](crate::store::DocumentStore::supports_administration)
/// or [DocumentStore::admin](crate::store::DocumentStore::admin) instead of
/// branching on the backend kind.
pub trait StoreAdministration: Send + Sync {
    /// Returns the number of documents in every loaded collection.
    fn stats(&self) -> StoreResult<StoreStats>;

    /// Scans every collection for structural problems.
    ///
    /// Returns one human-readable line per problem, an empty list when the
    /// data is sound. Problems are reported, never raised.
    fn validate_database(&self) -> Vec<String>;

    /// Writes every collection to one timestamped snapshot file and returns
    /// its path.
    fn create_full_backup(&self) -> StoreResult<PathBuf>;

    /// Replaces the collections present in the snapshot at `path` with its
    /// content, after taking a safety backup of the current state.
    ///
    /// Fails with `DestructiveOperationForbidden` in production mode.
    fn restore_from_backup(&self, path: &Path) -> StoreResult<()>;

    /// Empties every collection, after taking a snapshot.
    ///
    /// Fails with `DestructiveOperationForbidden` in production mode.
    fn clear_all_data(&self) -> StoreResult<()>;
}
