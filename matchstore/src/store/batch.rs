use crate::common::Document;
use crate::errors::StoreResult;
use crate::store::{DocumentPath, DocumentStore, SetOptions, WriteOperation};

/// Accumulates writes across documents and collections and applies them
/// together.
///
/// Operations apply in the order they were queued; when two target the same
/// document the later one wins. [WriteBatch::commit] consumes the batch, so a
/// committed batch cannot be reused.
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
/// let entries = store.collection("entries");
///
/// let mut batch = store.batch();
/// batch
///     .set(&entries.doc("e1"), doc! { tournamentId: "t1", discordId: "42" })
///     .update(&entries.doc("e1"), doc! { checkedIn: true })
///     .delete(&entries.doc("e0"));
/// batch.commit()?;
///
/// assert_eq!(entries.get()?.size(), 1);
/// # Ok(())
/// # }
/// ```
pub struct WriteBatch {
    store: DocumentStore,
    operations: Vec<WriteOperation>,
}

impl WriteBatch {
    pub(crate) fn new(store: DocumentStore) -> Self {
        WriteBatch {
            store,
            operations: Vec::new(),
        }
    }

    pub fn set(&mut self, target: impl Into<DocumentPath>, data: Document) -> &mut Self {
        self.set_with_options(target, data, SetOptions::default())
    }

    pub fn set_with_options(
        &mut self,
        target: impl Into<DocumentPath>,
        data: Document,
        options: SetOptions,
    ) -> &mut Self {
        self.operations.push(WriteOperation::Set {
            path: target.into(),
            data,
            options,
        });
        self
    }

    pub fn update(&mut self, target: impl Into<DocumentPath>, data: Document) -> &mut Self {
        self.operations.push(WriteOperation::Update {
            path: target.into(),
            data,
        });
        self
    }

    pub fn delete(&mut self, target: impl Into<DocumentPath>) -> &mut Self {
        self.operations.push(WriteOperation::Delete {
            path: target.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[WriteOperation] {
        &self.operations
    }

    /// Applies every queued operation. An empty batch is a no-op.
    pub fn commit(self) -> StoreResult<()> {
        if self.operations.is_empty() {
            return Ok(());
        }
        log::debug!("Committing batch of {} operations", self.operations.len());
        self.store.commit_batch(self.operations)
    }
}
