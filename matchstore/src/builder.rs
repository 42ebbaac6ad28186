use crate::config::{RemoteConfig, RuntimeMode, StoreConfig};
use crate::errors::{StoreError, StoreResult};
use crate::selector::StoreContext;
use std::path::Path;

/// Fluent builder for a [StoreContext].
///
/// Configuration errors are captured and reported by [open](StoreBuilder::open),
/// so the chain never needs intermediate `?`.
///
/// ```rust
/// use matchstore::{RuntimeMode, StoreBuilder, StoreKind};
///
/// # fn main() -> matchstore::errors::StoreResult<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let context = StoreBuilder::new()
///     .data_dir(dir.path())
///     .runtime_mode(RuntimeMode::Development)
///     .known_collections(&["users", "scores"])
///     .open()?;
/// assert_eq!(context.kind(), StoreKind::Local);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct StoreBuilder {
    error: Option<StoreError>,
    config: StoreConfig,
}

impl StoreBuilder {
    /// Starts from [StoreConfig::new].
    pub fn new() -> Self {
        StoreBuilder {
            error: None,
            config: StoreConfig::new(),
        }
    }

    /// Starts from [StoreConfig::from_env].
    pub fn from_env() -> Self {
        StoreBuilder {
            error: None,
            config: StoreConfig::from_env(),
        }
    }

    pub fn data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_data_dir(data_dir) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn runtime_mode(mut self, runtime_mode: RuntimeMode) -> Self {
        self.config.set_runtime_mode(runtime_mode);
        self
    }

    pub fn remote(mut self, remote: RemoteConfig) -> Self {
        self.config.set_remote(remote);
        self
    }

    /// Collections loaded eagerly when the local store opens.
    pub fn known_collections<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_known_collections(names) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Returns the configuration, or the first captured error.
    pub fn build_config(self) -> StoreResult<StoreConfig> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.config),
        }
    }

    /// Builds the context and selects the backend.
    pub fn open(self) -> StoreResult<StoreContext> {
        let context = StoreContext::new(self.build_config()?);
        context.initialize()?;
        Ok(context)
    }
}
