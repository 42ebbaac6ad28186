//! Store configuration.

use crate::common::{
    DEFAULT_DATA_DIR, ENV_DATA_DIR, ENV_REMOTE_CREDENTIALS, ENV_REMOTE_ENABLED, ENV_REMOTE_URL,
    ENV_RUNTIME_MODE, KNOWN_COLLECTIONS,
};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::validate_collection_name;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Runtime mode of the process. Production forbids destructive
/// administrative operations (restore, clear, import).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Production,
    #[default]
    Development,
}

impl RuntimeMode {
    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeMode::Production)
    }
}

impl FromStr for RuntimeMode {
    type Err = StoreError;

    /// `production` (any case) is production; every other value is development.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("production") {
            Ok(RuntimeMode::Production)
        } else {
            Ok(RuntimeMode::Development)
        }
    }
}

impl Display for RuntimeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeMode::Production => write!(f, "production"),
            RuntimeMode::Development => write!(f, "development"),
        }
    }
}

/// Settings for the remote backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteConfig {
    /// The remote backend is only considered when this is set.
    pub enabled: bool,
    /// Path of the credentials file.
    pub credentials_path: Option<PathBuf>,
    /// Base URL of the remote REST endpoint, e.g. an emulator address.
    pub database_url: Option<String>,
}

/// Configuration shared by store selection and the local backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    data_dir: PathBuf,
    runtime_mode: RuntimeMode,
    remote: RemoteConfig,
    known_collections: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreConfig {
    /// Development mode, `./data`, remote disabled, default collection list.
    pub fn new() -> Self {
        StoreConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            runtime_mode: RuntimeMode::Development,
            remote: RemoteConfig::default(),
            known_collections: KNOWN_COLLECTIONS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        StoreConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::new()
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `MATCHSTORE_DATA_DIR` | data directory |
    /// | `MATCHSTORE_ENV` | `production` or anything else for development |
    /// | `MATCHSTORE_REMOTE_ENABLED` | `true`, `1` or `yes` enables the remote backend |
    /// | `MATCHSTORE_REMOTE_CREDENTIALS` | credentials file path |
    /// | `MATCHSTORE_REMOTE_URL` | remote base URL |
    ///
    /// Missing variables keep their defaults. Unusable values are logged and
    /// ignored; reading the environment never fails.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = StoreConfig::new();

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            if let Err(e) = config.set_data_dir(&dir) {
                log::warn!("Ignoring {}: {}", ENV_DATA_DIR, e);
            }
        }

        if let Some(mode) = lookup(ENV_RUNTIME_MODE) {
            config.runtime_mode = mode.parse().unwrap_or_default();
        }

        if let Some(flag) = lookup(ENV_REMOTE_ENABLED) {
            match parse_flag(&flag) {
                Some(enabled) => config.remote.enabled = enabled,
                None => log::warn!(
                    "Ignoring {}: '{}' is not a boolean, remote backend stays disabled",
                    ENV_REMOTE_ENABLED,
                    flag
                ),
            }
        }

        config.remote.credentials_path = lookup(ENV_REMOTE_CREDENTIALS)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        config.remote.database_url =
            lookup(ENV_REMOTE_URL).filter(|url| !url.trim().is_empty());

        config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(crate::common::BACKUP_DIR_NAME)
    }

    pub fn runtime_mode(&self) -> RuntimeMode {
        self.runtime_mode
    }

    pub fn remote(&self) -> &RemoteConfig {
        &self.remote
    }

    pub fn known_collections(&self) -> &[String] {
        &self.known_collections
    }

    pub fn set_data_dir(&mut self, data_dir: impl AsRef<Path>) -> StoreResult<()> {
        let data_dir = data_dir.as_ref();
        if data_dir.as_os_str().is_empty() {
            return Err(StoreError::new(
                "Data directory must not be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.data_dir = data_dir.to_path_buf();
        Ok(())
    }

    pub fn set_runtime_mode(&mut self, runtime_mode: RuntimeMode) {
        self.runtime_mode = runtime_mode;
    }

    pub fn set_remote(&mut self, remote: RemoteConfig) {
        self.remote = remote;
    }

    /// Replaces the list of collections loaded eagerly on open.
    pub fn set_known_collections<S: AsRef<str>>(&mut self, names: &[S]) -> StoreResult<()> {
        let mut collections = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            validate_collection_name(name)?;
            if !collections.iter().any(|c: &String| c == name) {
                collections.push(name.to_string());
            }
        }
        self.known_collections = collections;
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = StoreConfig::new();
        assert_eq!(config.data_dir(), Path::new("data"));
        assert_eq!(config.backup_dir(), Path::new("data").join("backups"));
        assert_eq!(config.runtime_mode(), RuntimeMode::Development);
        assert!(!config.remote().enabled);
        assert_eq!(config.known_collections().len(), 8);
        assert!(config.known_collections().iter().any(|c| c == "matchResults"));
    }

    #[test]
    fn reads_environment() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("MATCHSTORE_DATA_DIR", "/srv/tournaments"),
            ("MATCHSTORE_ENV", "Production"),
            ("MATCHSTORE_REMOTE_ENABLED", "yes"),
            ("MATCHSTORE_REMOTE_CREDENTIALS", "/etc/creds.json"),
            ("MATCHSTORE_REMOTE_URL", "http://localhost:8080/v1"),
        ]));
        assert_eq!(config.data_dir(), Path::new("/srv/tournaments"));
        assert!(config.runtime_mode().is_production());
        assert!(config.remote().enabled);
        assert_eq!(
            config.remote().credentials_path.as_deref(),
            Some(Path::new("/etc/creds.json"))
        );
        assert_eq!(
            config.remote().database_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("MATCHSTORE_DATA_DIR", ""),
            ("MATCHSTORE_ENV", "staging"),
            ("MATCHSTORE_REMOTE_ENABLED", "maybe"),
            ("MATCHSTORE_REMOTE_CREDENTIALS", "  "),
        ]));
        assert_eq!(config.data_dir(), Path::new("data"));
        assert_eq!(config.runtime_mode(), RuntimeMode::Development);
        assert!(!config.remote().enabled);
        assert!(config.remote().credentials_path.is_none());
    }

    #[test]
    fn known_collections_are_validated_and_deduplicated() {
        let mut config = StoreConfig::new();
        config
            .set_known_collections(&["users", "users", "teams"])
            .unwrap();
        assert_eq!(config.known_collections(), &["users", "teams"]);

        let err = config.set_known_collections(&["../etc"]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidCollectionName);
    }

    #[test]
    fn runtime_mode_parsing() {
        assert_eq!("production".parse::<RuntimeMode>().unwrap(), RuntimeMode::Production);
        assert_eq!("dev".parse::<RuntimeMode>().unwrap(), RuntimeMode::Development);
        assert_eq!(RuntimeMode::Production.to_string(), "production");
    }
}
