use crate::common::Document;
use crate::errors::StoreResult;
use crate::query::Query;
use crate::store::{DocumentPath, WriteOperation};

/// Connection to a remote document database.
///
/// [RemoteStore](crate::store::remote::RemoteStore) maps every store
/// operation onto these three calls. Implementations report remote failures
/// as `BackendError` and do not retry.
pub trait RemoteClient: Send + Sync {
    /// Reads a document; `Ok(None)` when it does not exist.
    fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Document>>;

    /// Runs a query over one collection on the server.
    fn run_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<(String, Document)>>;

    /// Applies the writes atomically on the server.
    fn commit(&self, operations: &[WriteOperation]) -> StoreResult<()>;
}
