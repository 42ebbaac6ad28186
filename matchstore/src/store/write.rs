use crate::common::Document;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// In-memory content of one collection, keyed by document id.
pub type DocumentMap = IndexMap<String, Document>;

/// Options for a set write.
///
/// With `merge` the given top-level fields overwrite the existing ones and
/// the other existing fields are kept; without it the document is replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        SetOptions { merge: true }
    }
}

/// Addresses a document by collection and id without holding its data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: String,
    id: String,
}

impl DocumentPath {
    pub fn new(collection: &str, id: &str) -> Self {
        DocumentPath {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn validate(&self) -> StoreResult<()> {
        if self.id.is_empty() {
            return Err(StoreError::new(
                &format!("Empty document id in collection '{}'", self.collection),
                ErrorKind::InvalidDocumentId,
            ));
        }
        if self.id.contains('/') {
            return Err(StoreError::new(
                &format!("Document id '{}' must not contain '/'", self.id),
                ErrorKind::InvalidDocumentId,
            ));
        }
        Ok(())
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A pending write, as queued by a batch or issued by a single call.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    Set {
        path: DocumentPath,
        data: Document,
        options: SetOptions,
    },
    /// Shallow merge into the document; creates it if missing.
    Update { path: DocumentPath, data: Document },
    Delete { path: DocumentPath },
}

impl WriteOperation {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOperation::Set { path, .. } => path,
            WriteOperation::Update { path, .. } => path,
            WriteOperation::Delete { path } => path,
        }
    }

    /// Applies the operation to the in-memory map of its collection.
    pub fn apply(&self, documents: &mut DocumentMap) {
        match self {
            WriteOperation::Set {
                path,
                data,
                options,
            } => {
                if options.merge {
                    merge_into(documents, path.id(), data);
                } else {
                    documents.insert(path.id().to_string(), data.clone());
                }
            }
            WriteOperation::Update { path, data } => merge_into(documents, path.id(), data),
            WriteOperation::Delete { path } => {
                documents.shift_remove(path.id());
            }
        }
    }
}

fn merge_into(documents: &mut DocumentMap, id: &str, data: &Document) {
    documents
        .entry(id.to_string())
        .or_default()
        .merge(data);
}
