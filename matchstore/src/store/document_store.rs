use crate::common::Document;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::query::Query;
use crate::store::{
    CollectionRef, DocumentPath, SetOptions, StoreAdministration, WriteBatch, WriteOperation,
};
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;

/// Which backend serves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Remote,
    Local,
    /// No backend has been selected yet.
    None,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Remote => "remote",
            StoreKind::Local => "local",
            StoreKind::None => "none",
        }
    }
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contract implemented by every storage backend.
///
/// # Implementations
/// - `LocalStore`: one JSON file per collection under a data directory
/// - `RemoteStore`: delegates to a remote document database client
///
/// Both backends expose the same semantics for reads, writes, queries and
/// batches, so code above this trait never needs to know which one is active.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; a store is shared by every caller in
/// the process.
pub trait DocumentStoreProvider: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Reads a document. `Ok(None)` means the document does not exist.
    fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Document>>;

    /// Replaces the document, or shallow-merges into it when `options.merge` is set.
    fn set_document(
        &self,
        path: &DocumentPath,
        data: Document,
        options: SetOptions,
    ) -> StoreResult<()>;

    /// Shallow-merges `data` into the document, creating it if missing.
    fn update_document(&self, path: &DocumentPath, data: Document) -> StoreResult<()>;

    /// Deletes the document. Deleting a missing document is not an error.
    fn delete_document(&self, path: &DocumentPath) -> StoreResult<()>;

    /// Stores `data` under a freshly generated id and returns that id.
    fn add_document(&self, collection: &str, data: Document) -> StoreResult<String>;

    /// Runs a query over one collection.
    fn run_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<(String, Document)>>;

    /// Applies the operations in order, with all-or-nothing visible effect.
    fn commit_batch(&self, operations: Vec<WriteOperation>) -> StoreResult<()>;

    /// Administrative capability, if the backend has one.
    fn administration(&self) -> Option<&dyn StoreAdministration> {
        None
    }
}

/// Shared handle to the active backend.
///
/// Cloning is cheap. Dereferences to the provider; the methods below add the
/// collection / document / batch surface on top of it.
///
/// ```rust
/// use matchstore::doc;
/// use matchstore::store::local::LocalStore;
/// use matchstore::store::DocumentStore;
/// use matchstore::StoreConfig;
///
/// # fn main() -> matchstore::errors::StoreResult<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let store = DocumentStore::new(LocalStore::open(&StoreConfig::with_data_dir(dir.path()))?);
///
/// let alice = store.collection("users").add(doc! { name: "Alice", rank: 3 })?;
/// let snapshot = alice.get()?;
/// assert!(snapshot.exists());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn DocumentStoreProvider>,
}

impl DocumentStore {
    pub fn new<T: DocumentStoreProvider + 'static>(inner: T) -> Self {
        DocumentStore {
            inner: Arc::new(inner),
        }
    }

    pub fn from_arc(inner: Arc<dyn DocumentStoreProvider>) -> Self {
        DocumentStore { inner }
    }

    /// Returns a handle to a collection. Collections exist implicitly; no
    /// storage is touched until an operation runs.
    pub fn collection(&self, name: &str) -> CollectionRef {
        CollectionRef::new(self.clone(), name)
    }

    /// Starts an empty write batch.
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.clone())
    }

    pub fn supports_administration(&self) -> bool {
        self.inner.administration().is_some()
    }

    /// Returns the administrative capability, or `OperationNotSupported` if
    /// the active backend has none.
    pub fn admin(&self) -> StoreResult<&dyn StoreAdministration> {
        self.inner.administration().ok_or_else(|| {
            StoreError::new(
                &format!(
                    "Administrative operations are not supported by the {} store",
                    self.inner.kind()
                ),
                ErrorKind::OperationNotSupported,
            )
        })
    }
}

impl Deref for DocumentStore {
    type Target = Arc<dyn DocumentStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
