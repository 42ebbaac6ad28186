use crate::errors::{ErrorKind, StoreError, StoreResult};
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

/// Credentials of the remote document database.
///
/// Read from a service-account style JSON file. `project_id` and
/// `client_email` are required; `access_token`, when present, is sent as a
/// bearer token. Without a token requests are unauthenticated, which only a
/// local emulator accepts. Every other field of the file is ignored.
#[derive(Clone, Deserialize)]
pub struct RemoteCredentials {
    pub project_id: String,
    pub client_email: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl RemoteCredentials {
    /// Loads and checks the credentials file.
    ///
    /// Fails with `FileNotFound` if the file is missing and with
    /// `EncodingError` if it cannot be parsed or a required field is empty.
    pub fn from_file(path: &Path) -> StoreResult<RemoteCredentials> {
        if !path.exists() {
            return Err(StoreError::new(
                &format!("Credentials file not found at: {}", path.display()),
                ErrorKind::FileNotFound,
            ));
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> StoreResult<RemoteCredentials> {
        let credentials: RemoteCredentials = serde_json::from_str(text).map_err(|e| {
            StoreError::new_with_cause(
                "Malformed credentials file",
                ErrorKind::EncodingError,
                e.into(),
            )
        })?;

        for (field, value) in [
            ("project_id", &credentials.project_id),
            ("client_email", &credentials.client_email),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::new(
                    &format!("Credentials field '{}' is empty", field),
                    ErrorKind::EncodingError,
                ));
            }
        }
        Ok(credentials)
    }
}

impl Debug for RemoteCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
