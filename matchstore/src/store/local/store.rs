use crate::codec::TimestampFallback;
use crate::common::util::generate_document_id;
use crate::common::Document;
use crate::config::StoreConfig;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::query::Query;
use crate::store::local::persistence::{self, collection_file, encode_collection, StagedFile};
use crate::store::{
    validate_collection_name, DocumentMap, DocumentPath, DocumentStoreProvider, SetOptions,
    StoreAdministration, StoreEvent, StoreEventListener, StoreKind, WriteOperation,
};
use dashmap::DashMap;
use itertools::Itertools;
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use std::fs;
use std::sync::Arc;

pub(crate) type CollectionHandle = Arc<RwLock<DocumentMap>>;

/// New content for a collection, as read from a snapshot or an export.
pub(crate) struct ReplacedCollection {
    pub(crate) name: String,
    pub(crate) documents: DocumentMap,
    pub(crate) fallbacks: Vec<TimestampFallback>,
}

/// Document store persisted as one JSON file per collection.
///
/// # Layout
///
/// ```text
/// <data_dir>/users.json          { "<id>": { "<field>": <value> } }
/// <data_dir>/tournaments.json
/// <data_dir>/backups/            full snapshots and error copies
/// ```
///
/// # Concurrency
///
/// Every collection sits behind its own `RwLock`. Reads take the read lock;
/// a write takes the write locks of every collection it touches, in name
/// order, for the whole stage / persist / publish sequence. Writers on
/// different collections never block each other, and a caller always sees
/// its own completed writes.
///
/// # Durability
///
/// Each mutation rewrites the touched collection files through a temporary
/// file and a rename, so readers of the data directory never see a partial
/// file. Memory is only updated after the files are in place.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<LocalStoreInner>,
}

pub(crate) struct LocalStoreInner {
    pub(crate) config: StoreConfig,
    collections: DashMap<String, CollectionHandle>,
    fallbacks: DashMap<String, Vec<TimestampFallback>>,
    // serializes lazy loads so a collection file is read at most once
    load_lock: Mutex<()>,
    listeners: RwLock<Vec<StoreEventListener>>,
}

impl LocalStore {
    /// Opens the store rooted at `config.data_dir()`.
    ///
    /// Creates the data and backup directories if needed and loads every
    /// known collection. An unreadable collection file is quarantined and
    /// the collection starts empty; it never fails the open.
    pub fn open(config: &StoreConfig) -> StoreResult<LocalStore> {
        for dir in [config.data_dir().to_path_buf(), config.backup_dir()] {
            if !dir.exists() {
                fs::create_dir_all(&dir).map_err(|e| {
                    StoreError::new_with_cause(
                        &format!("Failed to create directory {}", dir.display()),
                        ErrorKind::IOError,
                        e.into(),
                    )
                })?;
                log::info!("Created directory: {}", dir.display());
            }
        }

        let store = LocalStore {
            inner: Arc::new(LocalStoreInner {
                config: config.clone(),
                collections: DashMap::new(),
                fallbacks: DashMap::new(),
                load_lock: Mutex::new(()),
                listeners: RwLock::new(Vec::new()),
            }),
        };

        for name in config.known_collections() {
            store.collection(name)?;
        }
        log::info!(
            "Local store initialization complete ({})",
            config.data_dir().display()
        );
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Registers a listener for store events.
    pub fn subscribe(&self, listener: StoreEventListener) {
        self.inner.listeners.write().push(listener);
    }

    pub(crate) fn emit(&self, event: StoreEvent) {
        let listeners = self.inner.listeners.read().clone();
        for listener in listeners {
            listener.notify(&event);
        }
    }

    /// Returns the in-memory map of a collection, loading it from disk on
    /// first access.
    pub(crate) fn collection(&self, name: &str) -> StoreResult<CollectionHandle> {
        validate_collection_name(name)?;
        if let Some(handle) = self.inner.collections.get(name) {
            return Ok(handle.clone());
        }

        let loaded = {
            let _guard = self.inner.load_lock.lock();
            if let Some(handle) = self.inner.collections.get(name) {
                return Ok(handle.clone());
            }

            let loaded = persistence::load_collection(
                self.inner.config.data_dir(),
                &self.inner.config.backup_dir(),
                name,
            )?;
            let handle: CollectionHandle = Arc::new(RwLock::new(loaded.documents));
            self.inner
                .collections
                .insert(name.to_string(), handle.clone());
            if !loaded.fallbacks.is_empty() {
                self.inner
                    .fallbacks
                    .insert(name.to_string(), loaded.fallbacks);
            }
            (handle, loaded.quarantined)
        };

        let (handle, quarantined) = loaded;
        if let Some(backup) = quarantined {
            self.emit(StoreEvent::CollectionQuarantined {
                collection: name.to_string(),
                backup,
            });
        }
        let documents = handle.read().len();
        self.emit(StoreEvent::CollectionLoaded {
            collection: name.to_string(),
            documents,
        });
        Ok(handle)
    }

    /// Names of every collection in memory, sorted.
    pub(crate) fn loaded_collections(&self) -> Vec<String> {
        self.inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .sorted()
            .collect()
    }

    pub(crate) fn fallbacks_of(&self, collection: &str) -> Vec<TimestampFallback> {
        self.inner
            .fallbacks
            .get(collection)
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// Drops the load-time timestamp substitutions of documents that were
    /// just rewritten or deleted. `previous` is the collection content the
    /// substitutions were recorded against.
    fn forget_fallbacks(&self, collection: &str, previous: &DocumentMap, touched: &[&str]) {
        if let Some(mut fallbacks) = self.inner.fallbacks.get_mut(collection) {
            fallbacks.retain(|fallback| {
                fallback_owner(&fallback.path, previous)
                    .map_or(true, |owner| !touched.contains(&owner))
            });
        }
        self.inner
            .fallbacks
            .remove_if(collection, |_, fallbacks| fallbacks.is_empty());
    }

    /// Applies write operations with all-or-nothing visible effect.
    ///
    /// 1. lock every touched collection, in name order
    /// 2. apply the operations in order to copies of those collections
    /// 3. write a temporary file per touched collection
    /// 4. rename the temporary files over the collection files
    /// 5. publish the copies in memory and forget the timestamp
    ///    substitutions of every touched document
    ///
    /// A failure in steps 2-3 leaves disk and memory untouched. If a rename
    /// fails, the collections already renamed are published so that memory
    /// matches disk, and the error is returned.
    ///
    /// Every touched collection is written exactly once, however many
    /// operations target it.
    pub(crate) fn apply_operations(&self, operations: &[WriteOperation]) -> StoreResult<()> {
        for operation in operations {
            validate_collection_name(operation.path().collection())?;
            operation.path().validate()?;
        }

        let names: Vec<String> = operations
            .iter()
            .map(|op| op.path().collection().to_string())
            .sorted()
            .dedup()
            .collect();
        let handles = names
            .iter()
            .map(|name| self.collection(name))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut guards: Vec<RwLockWriteGuard<DocumentMap>> =
            handles.iter().map(|handle| handle.write()).collect();
        let mut staged: Vec<DocumentMap> = guards.iter().map(|guard| (**guard).clone()).collect();

        for operation in operations {
            let collection = operation.path().collection();
            let index = names
                .iter()
                .position(|name| name == collection)
                .ok_or_else(|| {
                    StoreError::new(
                        &format!("Collection {} was not staged", collection),
                        ErrorKind::InternalError,
                    )
                })?;
            operation.apply(&mut staged[index]);
        }

        let data_dir = self.inner.config.data_dir();
        let mut files: Vec<StagedFile> = Vec::with_capacity(names.len());
        for (name, documents) in names.iter().zip(staged.iter()) {
            match StagedFile::write(collection_file(data_dir, name), &encode_collection(documents))
            {
                Ok(file) => files.push(file),
                Err(e) => {
                    files.iter().for_each(StagedFile::discard);
                    log::warn!("Error saving {}: {}", name, e);
                    return Err(e);
                }
            }
        }

        let mut published = 0;
        let mut failure = None;
        let mut files = files.into_iter();
        for file in files.by_ref() {
            if let Err(e) = file.commit() {
                failure = Some(e);
                break;
            }
            published += 1;
        }
        files.for_each(|file| file.discard());

        let mut persisted = Vec::with_capacity(published);
        for ((guard, documents), name) in guards
            .iter_mut()
            .zip(staged.into_iter())
            .zip(names.iter())
            .take(published)
        {
            let touched: Vec<&str> = operations
                .iter()
                .filter(|op| op.path().collection() == name)
                .map(|op| op.path().id())
                .collect();
            self.forget_fallbacks(name, &**guard, &touched);
            **guard = documents;
            persisted.push((name.clone(), guard.len()));
        }
        drop(guards);

        for (collection, documents) in persisted {
            self.emit(StoreEvent::CollectionPersisted {
                collection,
                documents,
            });
        }

        match failure {
            Some(e) => {
                log::warn!("Batch partially persisted: {}", e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Replaces the whole content of the given collections, writing each
    /// through the same temp-file path as ordinary writes. The timestamp
    /// substitutions reported for a collection are reset to the ones given.
    pub(crate) fn replace_collections(&self, content: Vec<ReplacedCollection>) -> StoreResult<()> {
        for ReplacedCollection {
            name,
            documents,
            fallbacks,
        } in content
        {
            validate_collection_name(&name)?;
            let handle = self.collection(&name)?;
            let mut guard = handle.write();
            let staged = StagedFile::write(
                collection_file(self.inner.config.data_dir(), &name),
                &encode_collection(&documents),
            )?;
            staged.commit()?;
            *guard = documents;
            let count = guard.len();
            drop(guard);

            if fallbacks.is_empty() {
                self.inner.fallbacks.remove(&name);
            } else {
                self.inner.fallbacks.insert(name.clone(), fallbacks);
            }
            self.emit(StoreEvent::CollectionPersisted {
                collection: name,
                documents: count,
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_not_production(&self, operation: &str) -> StoreResult<()> {
        if self.inner.config.runtime_mode().is_production() {
            log::error!("{} refused in production mode", operation);
            return Err(StoreError::new(
                &format!("{} is disabled in production mode", operation),
                ErrorKind::DestructiveOperationForbidden,
            ));
        }
        Ok(())
    }
}

/// Id of the document a fallback path `<id>.<field>` was recorded for.
/// Ids may contain dots, so the longest matching id wins.
fn fallback_owner<'a>(path: &str, documents: &'a DocumentMap) -> Option<&'a str> {
    documents
        .keys()
        .filter(|id| {
            path.len() > id.len()
                && path.starts_with(id.as_str())
                && path.as_bytes()[id.len()] == b'.'
        })
        .max_by_key(|id| id.len())
        .map(String::as_str)
}

impl DocumentStoreProvider for LocalStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Local
    }

    fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        path.validate()?;
        let handle = self.collection(path.collection())?;
        let documents = handle.read();
        Ok(documents.get(path.id()).cloned())
    }

    fn set_document(
        &self,
        path: &DocumentPath,
        data: Document,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.apply_operations(&[WriteOperation::Set {
            path: path.clone(),
            data,
            options,
        }])
    }

    fn update_document(&self, path: &DocumentPath, data: Document) -> StoreResult<()> {
        self.apply_operations(&[WriteOperation::Update {
            path: path.clone(),
            data,
        }])
    }

    fn delete_document(&self, path: &DocumentPath) -> StoreResult<()> {
        self.apply_operations(&[WriteOperation::Delete { path: path.clone() }])
    }

    fn add_document(&self, collection: &str, data: Document) -> StoreResult<String> {
        let id = generate_document_id();
        self.set_document(&DocumentPath::new(collection, &id), data, SetOptions::default())?;
        Ok(id)
    }

    fn run_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<(String, Document)>> {
        let handle = self.collection(collection)?;
        let documents = handle.read();
        Ok(query.evaluate(documents.iter()))
    }

    fn commit_batch(&self, operations: Vec<WriteOperation>) -> StoreResult<()> {
        self.apply_operations(&operations)
    }

    fn administration(&self) -> Option<&dyn StoreAdministration> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SortOrder;
    use crate::doc;
    use crate::query::Operator;
    use crate::store::DocumentStore;
    use tempfile::{tempdir, TempDir};

    fn open() -> (TempDir, LocalStore) {
        let dir = tempdir().unwrap();
        let store = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
        (dir, store)
    }

    fn persisted_counter(store: &LocalStore) -> Arc<Mutex<Vec<String>>> {
        let persisted = Arc::new(Mutex::new(Vec::new()));
        let sink = persisted.clone();
        store.subscribe(StoreEventListener::new(move |event: &StoreEvent| {
            if let StoreEvent::CollectionPersisted { collection, .. } = event {
                sink.lock().push(collection.clone());
            }
        }));
        persisted
    }

    #[test]
    fn open_creates_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("data");
        LocalStore::open(&StoreConfig::with_data_dir(&root)).unwrap();
        assert!(root.is_dir());
        assert!(root.join("backups").is_dir());
    }

    #[test]
    fn write_then_read_and_persist() {
        let (dir, store) = open();
        let path = DocumentPath::new("users", "u1");
        store
            .set_document(&path, doc! { username: "alice" }, SetOptions::default())
            .unwrap();

        assert_eq!(
            store.get_document(&path).unwrap(),
            Some(doc! { username: "alice" })
        );
        let file = fs::read_to_string(dir.path().join("users.json")).unwrap();
        assert!(file.contains("alice"));
        assert!(!dir.path().join("users.json.tmp").exists());
    }

    #[test]
    fn data_survives_reopen() {
        let (dir, store) = open();
        let id = store
            .add_document("matchResults", doc! { winner: "red", playedAt: (chrono::Utc::now()) })
            .unwrap();
        drop(store);

        let reopened = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
        let document = reopened
            .get_document(&DocumentPath::new("matchResults", &id))
            .unwrap()
            .unwrap();
        assert!(document.get("playedAt").unwrap().is_timestamp());
    }

    #[test]
    fn unknown_collection_loads_lazily_from_disk() {
        let (dir, store) = open();
        store
            .set_document(
                &DocumentPath::new("brackets", "b1"),
                doc! { round: 1 },
                SetOptions::default(),
            )
            .unwrap();
        drop(store);

        let reopened = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
        assert!(!reopened.loaded_collections().contains(&"brackets".to_string()));
        let found = reopened
            .get_document(&DocumentPath::new("brackets", "b1"))
            .unwrap();
        assert_eq!(found, Some(doc! { round: 1 }));
    }

    #[test]
    fn batch_rewrites_each_collection_once() {
        let (_dir, store) = open();
        let persisted = persisted_counter(&store);

        let ops = vec![
            WriteOperation::Set {
                path: DocumentPath::new("teams", "t1"),
                data: doc! { name: "Red" },
                options: SetOptions::default(),
            },
            WriteOperation::Update {
                path: DocumentPath::new("teams", "t1"),
                data: doc! { size: 5 },
            },
            WriteOperation::Set {
                path: DocumentPath::new("teams", "t2"),
                data: doc! { name: "Blue" },
                options: SetOptions::default(),
            },
            WriteOperation::Delete {
                path: DocumentPath::new("teams", "t2"),
            },
            WriteOperation::Set {
                path: DocumentPath::new("series", "s1"),
                data: doc! { bestOf: 3 },
                options: SetOptions::default(),
            },
        ];
        store.commit_batch(ops).unwrap();

        assert_eq!(*persisted.lock(), vec!["series", "teams"]);
        assert_eq!(
            store.get_document(&DocumentPath::new("teams", "t1")).unwrap(),
            Some(doc! { name: "Red", size: 5 })
        );
        assert!(store
            .get_document(&DocumentPath::new("teams", "t2"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn invalid_operation_leaves_everything_untouched() {
        let (dir, store) = open();
        let ops = vec![
            WriteOperation::Set {
                path: DocumentPath::new("teams", "t1"),
                data: doc! { name: "Red" },
                options: SetOptions::default(),
            },
            WriteOperation::Delete {
                path: DocumentPath::new("../escape", "x"),
            },
        ];
        let err = store.commit_batch(ops).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidCollectionName);
        assert!(store
            .get_document(&DocumentPath::new("teams", "t1"))
            .unwrap()
            .is_none());
        assert!(!dir.path().join("teams.json").exists());
    }

    #[test]
    fn query_through_document_store() {
        let (_dir, store) = open();
        let store = DocumentStore::new(store);
        let scores = store.collection("scores");
        for score in [1, 5, 3] {
            scores.add(doc! { score: score }).unwrap();
        }

        let snapshot = scores
            .filter("score", Operator::GreaterThan, 1)
            .order_by("score", SortOrder::Descending)
            .get()
            .unwrap();
        let values: Vec<i64> = snapshot
            .docs()
            .iter()
            .map(|d| d.data().unwrap().get("score").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(values, vec![5, 3]);
    }

    #[test]
    fn local_store_offers_administration() {
        let (_dir, store) = open();
        let store = DocumentStore::new(store);
        assert!(store.supports_administration());
        assert_eq!(store.kind(), StoreKind::Local);
    }

    fn open_with_garbage_timestamps() -> (TempDir, LocalStore) {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("sessions.json"),
            r#"{
                "s1": { "expiresAt": { "__type": "Date", "value": "garbage" } },
                "s1.b": { "expiresAt": { "__type": "Date", "value": "also garbage" } },
                "s2": { "expiresAt": { "__type": "Date", "value": "not a date" } }
            }"#,
        )
        .unwrap();
        let store = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
        (dir, store)
    }

    #[test]
    fn deleting_a_document_forgets_its_timestamp_fallbacks() {
        let (_dir, store) = open_with_garbage_timestamps();
        assert_eq!(store.validate_database().len(), 3);

        store
            .delete_document(&DocumentPath::new("sessions", "s1"))
            .unwrap();
        assert!(store
            .get_document(&DocumentPath::new("sessions", "s1"))
            .unwrap()
            .is_none());

        let mut issues = store.validate_database();
        issues.sort();
        assert_eq!(
            issues,
            vec![
                "Invalid date in sessions/s1.b.expiresAt (unparseable value replaced with load time)",
                "Invalid date in sessions/s2.expiresAt (unparseable value replaced with load time)",
            ]
        );
    }

    #[test]
    fn rewriting_a_document_forgets_its_timestamp_fallbacks() {
        let (_dir, store) = open_with_garbage_timestamps();
        let ops = ["s1", "s1.b", "s2"]
            .iter()
            .map(|id| WriteOperation::Set {
                path: DocumentPath::new("sessions", id),
                data: doc! { expiresAt: (chrono::Utc::now()) },
                options: SetOptions::default(),
            })
            .collect();
        store.commit_batch(ops).unwrap();
        assert!(store.validate_database().is_empty());
        assert!(store.fallbacks_of("sessions").is_empty());
    }

    #[test]
    fn fallback_owner_prefers_longest_id() {
        let mut documents = DocumentMap::new();
        documents.insert("a".to_string(), doc! {});
        documents.insert("a.b".to_string(), doc! {});
        assert_eq!(fallback_owner("a.b.createdAt", &documents), Some("a.b"));
        assert_eq!(fallback_owner("a.createdAt", &documents), Some("a"));
        assert_eq!(fallback_owner("c.createdAt", &documents), None);
    }

    #[test]
    fn open_survives_unusable_backup_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("users.json"), b"{ broken").unwrap();
        fs::write(dir.path().join("backups"), b"not a directory").unwrap();

        let store = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
        assert!(store
            .run_query("users", &Query::new())
            .unwrap()
            .is_empty());
        assert_eq!(fs::read(dir.path().join("users.json")).unwrap(), b"{ broken");
    }

    #[test]
    fn concurrent_writers_on_one_collection_all_land() {
        let (_dir, store) = open();
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store
                            .set_document(
                                &DocumentPath::new("sessions", &format!("{}-{}", t, i)),
                                doc! { n: (i) },
                                SetOptions::default(),
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        let all = store.run_query("sessions", &Query::new()).unwrap();
        assert_eq!(all.len(), 80);
    }
}
