use super::client::RemoteClient;
use super::credentials::RemoteCredentials;
use super::firestore::FirestoreRestClient;
use crate::common::util::generate_document_id;
use crate::common::Document;
use crate::config::RemoteConfig;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::query::Query;
use crate::store::{
    validate_collection_name, DocumentPath, DocumentStoreProvider, SetOptions, StoreKind,
    WriteOperation,
};
use std::sync::Arc;

/// Backend that forwards every operation to a remote document database.
///
/// Ids for [add_document](DocumentStoreProvider::add_document) are generated
/// client-side so the write can go through a single commit. There is no
/// administrative capability.
#[derive(Clone)]
pub struct RemoteStore {
    client: Arc<dyn RemoteClient>,
}

impl RemoteStore {
    pub fn new<C: RemoteClient + 'static>(client: C) -> Self {
        RemoteStore {
            client: Arc::new(client),
        }
    }

    /// Builds the REST client from configuration.
    ///
    /// Any problem with the credentials, or an access token missing for the
    /// public endpoint, is reported as `BackendConstructionFailed`.
    pub fn connect(config: &RemoteConfig) -> StoreResult<RemoteStore> {
        let path = config.credentials_path.as_ref().ok_or_else(|| {
            StoreError::new(
                "No credentials path configured for the remote store",
                ErrorKind::BackendConstructionFailed,
            )
        })?;

        let credentials = RemoteCredentials::from_file(path).map_err(|e| {
            StoreError::new_with_cause(
                &format!("Failed to read remote credentials from {}", path.display()),
                ErrorKind::BackendConstructionFailed,
                e,
            )
        })?;

        log::info!(
            "Connecting to remote store for project {}",
            credentials.project_id
        );
        let client = FirestoreRestClient::new(&credentials, config.database_url.clone())?;
        Ok(RemoteStore::new(client))
    }

    fn commit_one(&self, operation: WriteOperation) -> StoreResult<()> {
        self.commit_batch(vec![operation])
    }
}

impl DocumentStoreProvider for RemoteStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Remote
    }

    fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        path.validate()?;
        self.client.get_document(path)
    }

    fn set_document(
        &self,
        path: &DocumentPath,
        data: Document,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.commit_one(WriteOperation::Set {
            path: path.clone(),
            data,
            options,
        })
    }

    fn update_document(&self, path: &DocumentPath, data: Document) -> StoreResult<()> {
        self.commit_one(WriteOperation::Update {
            path: path.clone(),
            data,
        })
    }

    fn delete_document(&self, path: &DocumentPath) -> StoreResult<()> {
        self.commit_one(WriteOperation::Delete { path: path.clone() })
    }

    fn add_document(&self, collection: &str, data: Document) -> StoreResult<String> {
        let id = generate_document_id();
        self.set_document(&DocumentPath::new(collection, &id), data, SetOptions::default())?;
        Ok(id)
    }

    fn run_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<(String, Document)>> {
        validate_collection_name(collection)?;
        self.client.run_query(collection, query)
    }

    fn commit_batch(&self, operations: Vec<WriteOperation>) -> StoreResult<()> {
        if operations.is_empty() {
            return Ok(());
        }
        for operation in &operations {
            operation.path().validate()?;
        }
        self.client.commit(&operations)
    }
}
