use crate::config::StoreConfig;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::local::LocalStore;
use crate::store::remote::RemoteStore;
use crate::store::{DocumentStore, StoreKind};
use once_cell::sync::OnceCell;

/// Owns backend selection for one process.
///
/// Construct it once at start-up, call [initialize](StoreContext::initialize)
/// and hand [store](StoreContext::store) to whoever needs the data layer.
/// Selection happens at most once; later calls return the first outcome.
///
/// ```rust
/// use matchstore::{StoreConfig, StoreContext, StoreKind};
///
/// # fn main() -> matchstore::errors::StoreResult<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let context = StoreContext::new(StoreConfig::with_data_dir(dir.path()));
/// assert!(context.store().is_err());
///
/// assert_eq!(context.initialize()?, StoreKind::Local);
/// assert_eq!(context.kind(), StoreKind::Local);
/// # Ok(())
/// # }
/// ```
pub struct StoreContext {
    config: StoreConfig,
    store: OnceCell<DocumentStore>,
}

impl StoreContext {
    pub fn new(config: StoreConfig) -> Self {
        StoreContext {
            config,
            store: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Selects the backend and returns its kind.
    ///
    /// The remote backend is used only when it is enabled, its credentials
    /// file exists and parses, and it carries an access token unless an
    /// emulator URL is configured. Any failure to build it is logged and the
    /// local backend is used instead. Only a failure to open the local store
    /// is returned.
    pub fn initialize(&self) -> StoreResult<StoreKind> {
        let store = self.store.get_or_try_init(|| self.select())?;
        Ok(store.kind())
    }

    /// The selected store, or `NotInitialized` before [initialize](StoreContext::initialize).
    pub fn store(&self) -> StoreResult<&DocumentStore> {
        self.store.get().ok_or_else(|| {
            StoreError::new(
                "Store accessed before backend selection; call initialize() first",
                ErrorKind::NotInitialized,
            )
        })
    }

    /// Kind of the selected backend, `StoreKind::None` before selection.
    pub fn kind(&self) -> StoreKind {
        self.store
            .get()
            .map(|store| store.kind())
            .unwrap_or(StoreKind::None)
    }

    fn select(&self) -> StoreResult<DocumentStore> {
        let remote = self.config.remote();
        if remote.enabled {
            match RemoteStore::connect(remote) {
                Ok(store) => {
                    log::info!("Using remote document store");
                    return Ok(DocumentStore::new(store));
                }
                Err(e) => {
                    log::error!("Failed to initialize remote store: {}", e);
                    log::warn!("Falling back to local JSON storage");
                }
            }
        } else {
            log::info!("Remote store disabled, using local JSON storage");
        }

        let local = LocalStore::open(&self.config)?;
        log::info!(
            "Local store ready at {}",
            self.config.data_dir().display()
        );
        Ok(DocumentStore::new(local))
    }
}
