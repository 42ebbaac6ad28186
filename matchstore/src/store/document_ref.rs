use crate::common::Document;
use crate::errors::StoreResult;
use crate::store::{DocumentPath, DocumentSnapshot, DocumentStore, SetOptions};

/// Handle to a single document.
#[derive(Clone)]
pub struct DocumentRef {
    store: DocumentStore,
    path: DocumentPath,
}

impl DocumentRef {
    pub(crate) fn new(store: DocumentStore, collection: &str, id: &str) -> Self {
        DocumentRef {
            store,
            path: DocumentPath::new(collection, id),
        }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn collection(&self) -> &str {
        self.path.collection()
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn get(&self) -> StoreResult<DocumentSnapshot> {
        let data = self.store.get_document(&self.path)?;
        Ok(DocumentSnapshot::new(self.path.id(), data))
    }

    /// Replaces the document.
    pub fn set(&self, data: Document) -> StoreResult<()> {
        self.set_with_options(data, SetOptions::default())
    }

    pub fn set_with_options(&self, data: Document, options: SetOptions) -> StoreResult<()> {
        self.store.set_document(&self.path, data, options)
    }

    /// Shallow-merges `data` into the document.
    pub fn update(&self, data: Document) -> StoreResult<()> {
        self.store.update_document(&self.path, data)
    }

    pub fn delete(&self) -> StoreResult<()> {
        self.store.delete_document(&self.path)
    }
}

impl From<&DocumentRef> for DocumentPath {
    fn from(value: &DocumentRef) -> Self {
        value.path.clone()
    }
}

impl From<&DocumentPath> for DocumentPath {
    fn from(value: &DocumentPath) -> Self {
        value.clone()
    }
}
