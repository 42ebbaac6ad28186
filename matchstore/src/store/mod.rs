//! Store abstraction shared by the local and remote backends.
//!
//! [DocumentStoreProvider] is the backend contract and [DocumentStore] the
//! cheap-clone handle callers hold. On top of it sit the collection,
//! document, query and batch handles, modelled on the usual document
//! database client surface:
//!
//! ```text
//! store.collection("users").doc(id).get()
//! store.collection("users").filter("rank", Operator::GreaterThan, 2).order_by("rank", SortOrder::Descending).get()
//! let mut batch = store.batch(); batch.set(&doc_ref, data); batch.commit()
//! ```

mod admin;
mod batch;
mod collection;
mod document_ref;
mod document_store;
mod event;
pub mod local;
pub mod remote;
mod snapshot;
mod write;

pub use admin::*;
pub use batch::*;
pub use collection::*;
pub use document_ref::*;
pub use document_store::*;
pub use event::*;
pub use snapshot::*;
pub use write::*;

use crate::errors::{ErrorKind, StoreError, StoreResult};

/// Checks that a collection name can be used as a storage unit: not empty,
/// no path separators, no `..` and no leading `.`.
pub(crate) fn validate_collection_name(name: &str) -> StoreResult<()> {
    let reason = if name.is_empty() {
        Some("must not be empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("must not contain path separators")
    } else if name.contains("..") {
        Some("must not contain '..'")
    } else if name.starts_with('.') {
        Some("must not start with '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::new(
            &format!("Invalid collection name '{}': {}", name, reason),
            ErrorKind::InvalidCollectionName,
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names() {
        assert!(validate_collection_name("matchResults").is_ok());
        for bad in ["", "a/b", "a\\b", "..", ".hidden", "x..y"] {
            let err = validate_collection_name(bad).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidCollectionName, "{}", bad);
        }
    }
}
