use super::client::RemoteClient;
use super::credentials::RemoteCredentials;
use super::wire;
use crate::common::{Document, DEFAULT_REMOTE_BASE_URL, DEFAULT_REMOTE_DATABASE};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::query::Query;
use crate::store::{DocumentPath, WriteOperation};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde_json::json;
use std::time::Duration;

/// [RemoteClient] speaking the Firestore v1 REST API.
///
/// Requests carry no client-side timeout; a stalled call fails however the
/// transport fails it.
pub struct FirestoreRestClient {
    client: Client,
    base_url: String,
    documents_root: String,
    access_token: Option<String>,
}

impl FirestoreRestClient {
    /// Creates a client for the project named in `credentials`.
    ///
    /// `base_url` overrides the public endpoint, e.g. to reach an emulator.
    /// The public endpoint rejects anonymous calls, so reaching it without an
    /// `access_token` fails with `BackendConstructionFailed`, as does an
    /// HTTP client that cannot be built.
    pub fn new(credentials: &RemoteCredentials, base_url: Option<String>) -> StoreResult<Self> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_REMOTE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if credentials.access_token.is_none() && requires_token(&base_url) {
            return Err(StoreError::new(
                &format!(
                    "Remote endpoint {} needs an access_token in the credentials file",
                    base_url
                ),
                ErrorKind::BackendConstructionFailed,
            ));
        }

        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| {
                StoreError::new_with_cause(
                    "Failed to build the HTTP client",
                    ErrorKind::BackendConstructionFailed,
                    e.into(),
                )
            })?;

        Ok(FirestoreRestClient {
            client,
            base_url,
            documents_root: format!(
                "projects/{}/databases/{}/documents",
                credentials.project_id, DEFAULT_REMOTE_DATABASE
            ),
            access_token: credentials.access_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base_url, self.documents_root, suffix)
    }

    /// URL of one document, with collection and id percent-encoded as path
    /// segments.
    fn document_url(&self, path: &DocumentPath) -> StoreResult<Url> {
        let mut url = Url::parse(&self.url("")).map_err(|e| {
            StoreError::new(
                &format!("Invalid remote URL {}: {}", self.base_url, e),
                ErrorKind::BackendError,
            )
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::new(
                    &format!("Remote URL {} cannot hold a document path", self.base_url),
                    ErrorKind::BackendError,
                )
            })?
            .push(path.collection())
            .push(path.id());
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn read_json(response: Response, action: &str) -> StoreResult<serde_json::Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::new(
                &format!("Remote {} failed with status {}: {}", action, status, body),
                ErrorKind::BackendError,
            ));
        }
        Ok(response.json()?)
    }
}

fn requires_token(base_url: &str) -> bool {
    base_url.contains("googleapis.com")
}

impl RemoteClient for FirestoreRestClient {
    fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        let url = self.document_url(path)?;
        let response = self.authorize(self.client.get(url)).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let json = Self::read_json(response, "read")?;
        let (_, document) = wire::decode_document(&json)?;
        Ok(Some(document))
    }

    fn run_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<(String, Document)>> {
        let body = wire::encode_query(collection, query);
        let response = self
            .authorize(self.client.post(self.url(":runQuery")))
            .json(&body)
            .send()?;
        let json = Self::read_json(response, "query")?;
        wire::decode_query_response(&json)
    }

    fn commit(&self, operations: &[WriteOperation]) -> StoreResult<()> {
        let writes: Vec<serde_json::Value> = operations
            .iter()
            .map(|operation| wire::encode_write(operation, &self.documents_root))
            .collect();
        let response = self
            .authorize(self.client.post(self.url(":commit")))
            .json(&json!({ "writes": writes }))
            .send()?;
        Self::read_json(response, "commit")?;
        log::debug!("Committed {} writes to the remote store", operations.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> RemoteCredentials {
        RemoteCredentials::parse(
            r#"{ "project_id": "league", "client_email": "bot@league", "access_token": "t" }"#,
        )
        .unwrap()
    }

    fn emulator() -> FirestoreRestClient {
        FirestoreRestClient::new(&credentials(), Some("http://localhost:8080/v1/".to_string()))
            .unwrap()
    }

    #[test]
    fn default_endpoint() {
        let client = FirestoreRestClient::new(&credentials(), None).unwrap();
        assert_eq!(client.base_url(), DEFAULT_REMOTE_BASE_URL);
        assert_eq!(
            client.url("/users/u1"),
            "https://firestore.googleapis.com/v1/projects/league/databases/(default)/documents/users/u1"
        );
    }

    #[test]
    fn custom_endpoint_is_trimmed() {
        assert_eq!(
            emulator().url(":commit"),
            "http://localhost:8080/v1/projects/league/databases/(default)/documents:commit"
        );
    }

    #[test]
    fn document_ids_are_percent_encoded() {
        let client = emulator();
        let url = client
            .document_url(&DocumentPath::new("users", "team#1?x"))
            .unwrap();
        assert_eq!(
            url.path(),
            "/v1/projects/league/databases/(default)/documents/users/team%231%3Fx"
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        let url = client
            .document_url(&DocumentPath::new("users", "50% off"))
            .unwrap();
        assert!(url.path().ends_with("/documents/users/50%25%20off"));
    }

    #[test]
    fn public_endpoint_needs_a_token() {
        let anonymous =
            RemoteCredentials::parse(r#"{ "project_id": "league", "client_email": "bot@league" }"#)
                .unwrap();
        let err = FirestoreRestClient::new(&anonymous, None).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::BackendConstructionFailed);

        let client =
            FirestoreRestClient::new(&anonymous, Some("http://127.0.0.1:8080/v1".to_string()))
                .unwrap();
        assert!(client.access_token.is_none());
    }
}
