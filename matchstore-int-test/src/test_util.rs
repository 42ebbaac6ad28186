use matchstore::errors::StoreResult;
use matchstore::store::local::LocalStore;
use matchstore::store::{DocumentStore, StoreEvent, StoreEventListener};
use matchstore::StoreConfig;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Runs `test` against a fresh context from `before`, then `after`.
///
/// `after` also runs when the test returns an error, so the data directory is
/// cleaned up either way.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StoreResult<()>,
    B: Fn() -> StoreResult<TestContext>,
    A: Fn(TestContext) -> StoreResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = test(ctx.clone());
    let after_result = after(ctx);

    if let Err(e) = result {
        panic!("Test failed: {:?}", e);
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// A local store rooted in its own temporary directory.
#[derive(Clone)]
pub struct TestContext {
    dir: Arc<TempDir>,
    config: StoreConfig,
    local: LocalStore,
}

impl TestContext {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The backend, for administration and event subscription.
    pub fn local(&self) -> LocalStore {
        self.local.clone()
    }

    /// The backend behind the uniform store handle.
    pub fn store(&self) -> DocumentStore {
        DocumentStore::new(self.local.clone())
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.config.backup_dir()
    }

    pub fn collection_file(&self, collection: &str) -> PathBuf {
        self.path().join(format!("{}.json", collection))
    }

    /// Opens a second store over the same directory, as a restarted process would.
    pub fn reopen(&self) -> StoreResult<TestContext> {
        Ok(TestContext {
            dir: self.dir.clone(),
            config: self.config.clone(),
            local: LocalStore::open(&self.config)?,
        })
    }
}

pub fn create_test_context() -> StoreResult<TestContext> {
    create_test_context_with(|_| Ok(()))
}

/// Creates a context after letting `configure` adjust the configuration.
pub fn create_test_context_with<F>(configure: F) -> StoreResult<TestContext>
where
    F: FnOnce(&mut StoreConfig) -> StoreResult<()>,
{
    let dir = tempfile::tempdir()?;
    let mut config = StoreConfig::with_data_dir(dir.path());
    configure(&mut config)?;
    let local = LocalStore::open(&config)?;
    Ok(TestContext {
        dir: Arc::new(dir),
        config,
        local,
    })
}

/// Creates an empty directory with seeded collection files and no store yet.
pub fn seeded_dir(files: &[(&str, &str)]) -> StoreResult<TempDir> {
    let dir = tempfile::tempdir()?;
    for (collection, content) in files {
        fs::write(dir.path().join(format!("{}.json", collection)), content)?;
    }
    Ok(dir)
}

pub fn cleanup(ctx: TestContext) -> StoreResult<()> {
    // the directory itself goes away with the last TempDir handle
    let leftovers: Vec<PathBuf> = fs::read_dir(ctx.path())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temporary files left: {:?}", leftovers);
    Ok(())
}

/// Records the collection of every `CollectionPersisted` event.
pub fn record_persists(store: &LocalStore) -> Arc<Mutex<Vec<String>>> {
    let persisted = Arc::new(Mutex::new(Vec::new()));
    let sink = persisted.clone();
    store.subscribe(StoreEventListener::new(move |event: &StoreEvent| {
        if let StoreEvent::CollectionPersisted { collection, .. } = event {
            sink.lock().push(collection.clone());
        }
    }));
    persisted
}

/// Names of the files in `dir`, sorted.
pub fn file_names(dir: &Path) -> StoreResult<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    Ok(names)
}
